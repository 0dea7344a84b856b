use once_cell::sync::Lazy;
use regex::Regex;

/// A context string split around its highlighted token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContext {
    pub before: String,
    pub token: String,
    pub after: String,
}

static HIGHLIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\*\*(.*?)\*\*").expect("highlight regex"));

/// Splits a context string at the first `**highlighted**` span. Inputs
/// without a delimited span come back whole in `before`.
pub fn parse_context(context: &str) -> ParsedContext {
    if let Some(caps) = HIGHLIGHT_RE.captures(context) {
        if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
            return ParsedContext {
                before: context[..whole.start()].to_string(),
                token: inner.as_str().to_string(),
                after: context[whole.end()..].to_string(),
            };
        }
    }
    ParsedContext {
        before: context.to_string(),
        token: String::new(),
        after: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_around_highlighted_token() {
        let parsed = parse_context("a**b**c");
        assert_eq!(parsed.before, "a");
        assert_eq!(parsed.token, "b");
        assert_eq!(parsed.after, "c");
    }

    #[test]
    fn unmarked_input_lands_in_before() {
        let parsed = parse_context("no markers");
        assert_eq!(parsed.before, "no markers");
        assert_eq!(parsed.token, "");
        assert_eq!(parsed.after, "");
    }

    #[test]
    fn captures_only_the_first_span() {
        let parsed = parse_context("x **one** y **two** z");
        assert_eq!(parsed.before, "x ");
        assert_eq!(parsed.token, "one");
        assert_eq!(parsed.after, " y **two** z");
    }

    #[test]
    fn inner_match_is_non_greedy() {
        let parsed = parse_context("**a** and **b**");
        assert_eq!(parsed.token, "a");
        assert_eq!(parsed.after, " and **b**");
    }

    #[test]
    fn handles_newlines_inside_context() {
        let parsed = parse_context("line one\n**tok**\nline two");
        assert_eq!(parsed.token, "tok");
        assert_eq!(parsed.before, "line one\n");
    }
}
