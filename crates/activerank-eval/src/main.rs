//! ActiveRank Evaluation Tool
//!
//! Evaluates how well an approximate ranking tracks an oracle ranking over
//! the iterations of active-learning experiments. Reads a directory of
//! snapshot CSV files, groups them into timelines, and reports per-iteration
//! metric series.
//!
//! # Usage
//!
//! ```bash
//! # Active-learning results (precision@1%, precision@10%)
//! activerank-eval results/active_learning
//!
//! # Active-normalization results (extended names, Kendall, cumulative)
//! activerank-eval results/active_normalization --preset normalization
//!
//! # Extra metrics, JSON output with fold summaries
//! activerank-eval results/ --regret --unique-ratio --correlation spearman --json --summary
//!
//! # Results directory from the environment
//! ACTIVERANK_RESULTS_DIR=results/active_learning activerank-eval
//! ```

mod config;
mod output;

use activerank_core::{
    aggregate_with_progress, group_sources, CorrelationMethod, CsvTableSource, DimensionSchema,
    EvalConfig, TableSource,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

// =============================================================================
// CLI
// =============================================================================

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Simple names; precision at 1% and 10%
    Learning,
    /// Extended names; cumulative precision at 10% and Kendall's tau
    Normalization,
}

impl Preset {
    fn config(self) -> EvalConfig {
        match self {
            Preset::Learning => EvalConfig::active_learning(),
            Preset::Normalization => EvalConfig::active_normalization(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaArg {
    Simple,
    Extended,
}

impl From<SchemaArg> for DimensionSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Simple => DimensionSchema::Simple,
            SchemaArg::Extended => DimensionSchema::Extended,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CorrelationArg {
    Spearman,
    Kendall,
}

impl From<CorrelationArg> for CorrelationMethod {
    fn from(arg: CorrelationArg) -> Self {
        match arg {
            CorrelationArg::Spearman => CorrelationMethod::Spearman,
            CorrelationArg::Kendall => CorrelationMethod::Kendall,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "activerank-eval", version)]
#[command(about = "Evaluate approximate rankings against oracle scores")]
struct Args {
    /// Directory of snapshot CSV files (default: $ACTIVERANK_RESULTS_DIR)
    dir: Option<PathBuf>,

    /// Evaluation preset used when no config file is given
    #[arg(long, value_enum, default_value = "learning")]
    preset: Preset,

    /// JSON configuration file (replaces the preset)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Snapshot naming grammar
    #[arg(long, value_enum)]
    schema: Option<SchemaArg>,

    /// Report running totals instead of per-iteration values
    #[arg(long)]
    cumulative: bool,

    /// Top-k fractions for precision/regret (comma-separated)
    #[arg(long, value_delimiter = ',')]
    top_percentages: Option<Vec<f64>>,

    /// Rank correlation over the full ranking
    #[arg(long, value_enum)]
    correlation: Option<CorrelationArg>,

    /// Report regret at every top-k fraction
    #[arg(long)]
    regret: bool,

    /// Report the percentage of distinct oracle scores
    #[arg(long)]
    unique_ratio: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Include per-iteration mean and confidence band across folds
    #[arg(long)]
    summary: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            schema: self.schema.map(DimensionSchema::from),
            cumulative: self.cumulative,
            top_percentages: self.top_percentages.clone(),
            correlation: self.correlation.map(CorrelationMethod::from),
            regret: self.regret,
            unique_ratio: self.unique_ratio,
        }
    }
}

// =============================================================================
// Main
// =============================================================================

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let results_dir = config::results_dir(args.dir.as_deref())?;
    let config = config::build_config(
        args.preset.config(),
        args.config.as_deref(),
        args.overrides(),
    )?;
    info!(dir = %results_dir.display(), schema = %config.schema, "Evaluating snapshots");

    let source = CsvTableSource::new(&results_dir);
    let names = source.list_sources()?;
    let grouping = group_sources(names, config.schema);
    info!(
        groups = grouping.group_count(),
        sources = grouping.source_count(),
        rejected = grouping.rejected.len(),
        "Grouped snapshot sources"
    );

    let pb = if args.json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(grouping.group_count() as u64);
        pb.set_style(ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len}")?);
        pb
    };
    pb.set_message("Timelines");

    let store = aggregate_with_progress(&grouping, &source, &config, |_, _| pb.inc(1))
        .with_context(|| format!("Failed to evaluate {}", results_dir.display()))?;
    pb.finish_and_clear();

    let output = if args.json {
        output::format_json(&results_dir, &store, args.summary)?
    } else {
        output::format_human(&results_dir, &store, args.summary)
    };
    println!("{}", output);

    Ok(())
}
