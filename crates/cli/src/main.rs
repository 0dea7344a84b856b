use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use featurelens_builder::{build_artifacts, BuildOptions};
use featurelens_core::{
    format_token, load_detail, load_has_data_ids, parse_context, query_features,
    FeatureDetail, FeatureIndexStore, FsArtifactSource, SortOption, DEFAULT_PER_PAGE,
};
use featurelens_index::DETAIL_DIR;

#[derive(Parser, Debug)]
#[command(name = "featurelens", version, about = "SAE feature browser toolkit")]
struct Cli {
    /// Data directory holding the artifacts (default: $FEATURELENS_DATA_DIR or ./data).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the index and has-data artifacts from the interpretation CSV.
    Build {
        /// Interpretation table (feature_index, rank_control, rank_no_control, ...).
        csv: PathBuf,
        /// Detail record directory; defaults to <data-dir>/features.
        #[arg(long)]
        details: Option<PathBuf>,
    },
    /// List features, optionally filtered and sorted.
    List {
        #[arg(long, default_value = "rank-ctrl")]
        sort: String,
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
        per_page: usize,
    },
    /// Search feature interpretations.
    Search {
        query: String,
        #[arg(long, default_value = "rank-ctrl")]
        sort: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
        per_page: usize,
    },
    /// Show one feature's detail record.
    Show { id: u32 },
    /// Cross-check hasData flags against the has-data artifact.
    Check,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let cli = Cli::parse();
    let source = match &cli.data_dir {
        Some(dir) => FsArtifactSource::new(dir),
        None => FsArtifactSource::from_env(),
    };

    match cli.command {
        Commands::Build { csv, details } => {
            let detail_dir = details.unwrap_or_else(|| source.root().join(DETAIL_DIR));
            let report = build_artifacts(&BuildOptions {
                csv_path: csv,
                detail_dir,
                out_dir: source.root().to_path_buf(),
            })?;
            println!(
                "indexed {} features ({} with detail records)",
                report.features, report.with_data
            );
            println!("wrote {}", report.index_path.display());
            println!("wrote {}", report.has_data_path.display());
        }
        Commands::List {
            sort,
            query,
            page,
            per_page,
        } => {
            let store = FeatureIndexStore::load(&source)?;
            print_listing(&store, &query, &sort, page, per_page);
        }
        Commands::Search {
            query,
            sort,
            page,
            per_page,
        } => {
            let store = FeatureIndexStore::load(&source)?;
            print_listing(&store, &query, &sort, page, per_page);
        }
        Commands::Show { id } => {
            let store = FeatureIndexStore::load(&source)?;
            match store.lookup(id) {
                Some(summary) => println!("feature {}: {}", id, summary.interpretation),
                None => println!("feature {}: not in index", id),
            }
            match load_detail(&source, id)? {
                Some(detail) => print!("{}", render_detail(&detail)),
                None => println!("feature {id} has no detail record"),
            }
        }
        Commands::Check => {
            let store = FeatureIndexStore::load(&source)?;
            let listed: BTreeSet<u32> = load_has_data_ids(&source)?.into_iter().collect();
            let flagged: BTreeSet<u32> = store
                .summaries()
                .iter()
                .filter(|s| s.has_data)
                .map(|s| s.feature_index)
                .collect();
            println!(
                "{} features indexed, {} flagged hasData, {} in has-data artifact",
                store.len(),
                flagged.len(),
                listed.len()
            );
            let mut mismatches = 0;
            for id in flagged.symmetric_difference(&listed) {
                println!("mismatch: feature {id}");
                mismatches += 1;
            }
            if mismatches > 0 {
                bail!("{mismatches} features disagree between index and has-data artifact");
            }
            println!("ok");
        }
    }
    Ok(())
}

fn print_listing(store: &FeatureIndexStore, query: &str, sort: &str, page: usize, per_page: usize) {
    let option = SortOption::parse(sort);
    let result = query_features(store, query, option, page, per_page);
    println!(
        "page {}/{} ({} features total)",
        result.current_page,
        result.total_pages,
        store.len()
    );
    println!(
        "{:>8}  {:>10}  {:>10}  {:>5}  interpretation",
        "id", "rank-ctrl", "rank-noctrl", "data"
    );
    for feature in &result.data {
        println!(
            "{:>8}  {:>10.2}  {:>10.2}  {:>5}  {}",
            feature.feature_index,
            feature.rank_control,
            feature.rank_no_control,
            if feature.has_data { "yes" } else { "no" },
            feature.interpretation
        );
    }
}

fn render_detail(detail: &FeatureDetail) -> String {
    let mut out = String::new();
    let stats = &detail.stats;
    out.push_str(&format!(
        "activation rate {:.4}, mean {:.3}, max {:.3}, std {:.3}\n",
        stats.activation_rate, stats.mean_when_active, stats.max_activation, stats.std_when_active
    ));

    if !detail.top_tokens.is_empty() {
        out.push_str("\ntop tokens:\n");
        for token in &detail.top_tokens {
            let formatted = format_token(&token.token);
            out.push_str(&format!(
                "  {:<20} count {:>6}  mean act {:.3}\n",
                formatted.display, token.count, token.mean_activation
            ));
        }
    }

    if !detail.top_activations.is_empty() {
        out.push_str("\ntop activations:\n");
        for example in &detail.top_activations {
            let parsed = parse_context(&example.context);
            let token = format_token(&example.active_token);
            out.push_str(&format!(
                "  [{:.3}] {}«{}»{}  (token {})\n",
                example.activation, parsed.before, parsed.token, parsed.after, token.display
            ));
        }
    }

    for (label, ngrams) in [
        ("2-grams", &detail.ngram_analysis.bigrams),
        ("3-grams", &detail.ngram_analysis.trigrams),
        ("4-grams", &detail.ngram_analysis.fourgrams),
    ] {
        if ngrams.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{label}:\n"));
        for ngram in ngrams {
            out.push_str(&format!(
                "  {:<30} count {:>6}  {:.1}%\n",
                ngram.ngram_string, ngram.count, ngram.percent
            ));
        }
    }

    if !detail.coactivation.is_empty() {
        out.push_str("\nco-activating features:\n");
        for co in &detail.coactivation {
            out.push_str(&format!(
                "  feature {:<8} count {:>6}  {:.1}%\n",
                co.feature_index, co.count, co.percent
            ));
        }
    }

    if !detail.position_distribution.is_empty() {
        out.push_str("\nposition distribution:\n");
        for bin in &detail.position_distribution {
            out.push_str(&format!(
                "  {:<12} {:<12} count {:>6}  {:.1}%\n",
                bin.range, bin.label, bin.count, bin.percent
            ));
        }
    }
    out
}
