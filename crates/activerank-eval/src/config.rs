//! Configuration and path resolution for the evaluation tool.
//!
//! The results directory comes from the positional argument or, failing
//! that, `$ACTIVERANK_RESULTS_DIR`. The evaluation configuration starts from
//! a preset (or a JSON file given with `--config`) and command-line flags are
//! layered on top.

use activerank_core::{CorrelationMethod, DimensionSchema, EvalConfig};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the default results directory
pub const RESULTS_DIR_ENV: &str = "ACTIVERANK_RESULTS_DIR";

/// Returns the directory holding the snapshot CSV files.
pub fn results_dir(cli_dir: Option<&Path>) -> Result<PathBuf> {
    resolve_results_dir(cli_dir, std::env::var(RESULTS_DIR_ENV).ok())
}

fn resolve_results_dir(cli_dir: Option<&Path>, env_dir: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = cli_dir {
        return Ok(dir.to_path_buf());
    }
    match env_dir {
        Some(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
        _ => Err(anyhow!(
            "No results directory given. Pass DIR or set ${}.",
            RESULTS_DIR_ENV
        )),
    }
}

/// Command-line settings that override the base configuration.
///
/// Boolean flags can only switch a metric on; `None` keeps the base value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub schema: Option<DimensionSchema>,
    pub cumulative: bool,
    pub top_percentages: Option<Vec<f64>>,
    pub correlation: Option<CorrelationMethod>,
    pub regret: bool,
    pub unique_ratio: bool,
}

impl Overrides {
    fn apply(self, config: &mut EvalConfig) {
        if let Some(schema) = self.schema {
            config.schema = schema;
        }
        if let Some(percentages) = self.top_percentages {
            config.top_percentages = percentages;
        }
        if self.correlation.is_some() {
            config.correlation = self.correlation;
        }
        config.cumulative |= self.cumulative;
        config.regret |= self.regret;
        config.unique_ratio |= self.unique_ratio;
    }
}

/// Builds the evaluation configuration.
///
/// `config_file`, when given, replaces `preset` as the base.
pub fn build_config(
    preset: EvalConfig,
    config_file: Option<&Path>,
    overrides: Overrides,
) -> Result<EvalConfig> {
    let mut config = match config_file {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            EvalConfig::from_json(&json)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => preset,
    };

    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}
