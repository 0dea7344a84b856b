//! Display formatting for raw sub-word tokens.
//!
//! Byte-level BPE vocabularies remap whitespace and control bytes to
//! printable Unicode code points; the table below covers the GPT-2-style
//! encoding. Supporting another tokenizer means substituting the table.

/// A token prepared for display. `is_special` marks tokens that were
/// rewritten into a bracketed placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedToken {
    pub display: String,
    pub is_special: bool,
}

struct ControlGlyph {
    glyph: char,
    literal: char,
    display: &'static str,
}

const CONTROL_GLYPHS: &[ControlGlyph] = &[
    ControlGlyph {
        glyph: '\u{010A}', // Ċ
        literal: '\n',
        display: "[NEWLINE]",
    },
    ControlGlyph {
        glyph: '\u{0109}', // ĉ
        literal: '\t',
        display: "[TAB]",
    },
    ControlGlyph {
        glyph: '\u{010D}', // č
        literal: '\r',
        display: "[CR]",
    },
];

/// Escape glyph for a leading space in byte-level BPE vocabularies.
const LEADING_SPACE_GLYPH: char = '\u{0120}'; // Ġ

/// Maps a raw token to its display form, flagging non-printable tokens.
pub fn format_token(token: &str) -> FormattedToken {
    for entry in CONTROL_GLYPHS {
        if is_exactly(token, entry.literal) || is_exactly(token, entry.glyph) {
            return special(entry.display);
        }
    }
    if is_exactly(token, ' ') {
        return special("[SPACE]");
    }
    if token.is_empty() {
        return special("[EMPTY]");
    }
    let stripped = token
        .strip_prefix(LEADING_SPACE_GLYPH)
        .or_else(|| token.strip_prefix(' '));
    if let Some(rest) = stripped {
        if rest.is_empty() {
            // The escape glyph on its own denotes a bare space.
            return special("[SPACE]");
        }
        return FormattedToken {
            display: format!("[SP]{rest}"),
            is_special: false,
        };
    }
    FormattedToken {
        display: token.to_string(),
        is_special: false,
    }
}

fn is_exactly(token: &str, ch: char) -> bool {
    let mut chars = token.chars();
    chars.next() == Some(ch) && chars.next().is_none()
}

fn special(display: &str) -> FormattedToken {
    FormattedToken {
        display: display.to_string(),
        is_special: true,
    }
}
