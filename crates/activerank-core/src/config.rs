//! Evaluation configuration.
//!
//! An [`EvalConfig`] selects the snapshot-name grammar, the top-k fractions to
//! evaluate, the optional diagnostics (regret, unique-score ratio), the rank
//! correlation statistic, and whether series are reported cumulatively.
//!
//! Two presets mirror the two experiment families that produce snapshots:
//!
//! | Preset | Grammar | Metrics | Cumulative |
//! |--------|---------|---------|------------|
//! | [`EvalConfig::active_learning`] | simple | precision@1%, precision@10% | no |
//! | [`EvalConfig::active_normalization`] | extended | precision@10%, Kendall | yes |
//!
//! # Usage
//!
//! ```
//! use activerank_core::config::{CorrelationMethod, EvalConfig};
//!
//! let mut config = EvalConfig::active_learning();
//! config.correlation = Some(CorrelationMethod::Spearman);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::EvalError;
use crate::evaluation::MetricKind;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Defaults
// =============================================================================

/// Top-k fraction for precision at 1%.
pub const TOP_PERCENTAGE_1: f64 = 0.01;

/// Top-k fraction for precision at 10%.
pub const TOP_PERCENTAGE_10: f64 = 0.10;

/// Bootstrap resamples used for fold summaries.
pub const SUMMARY_BOOTSTRAP_SAMPLES: usize = 1000;

/// Fixed seed so fold summaries are reproducible run to run.
pub const SUMMARY_BOOTSTRAP_SEED: u64 = 42;

// =============================================================================
// Enumerations
// =============================================================================

/// Snapshot-name grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionSchema {
    /// `dataset_fold_algorithm_oracle_timestamp`
    #[default]
    Simple,
    /// `dataset_fold_algorithm-normMethod_oracle_timestamp`
    Extended,
}

impl DimensionSchema {
    /// True when the grammar carries a normalization-method dimension.
    pub fn has_norm_method(self) -> bool {
        matches!(self, DimensionSchema::Extended)
    }
}

impl fmt::Display for DimensionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionSchema::Simple => write!(f, "simple"),
            DimensionSchema::Extended => write!(f, "extended"),
        }
    }
}

/// Rank correlation statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Spearman,
    Kendall,
}

impl CorrelationMethod {
    /// Metric name used as the series key.
    pub fn name(self) -> &'static str {
        match self {
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Kendall => "kendall",
        }
    }
}

// =============================================================================
// EvalConfig
// =============================================================================

/// Options recognized by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Name grammar used to recover experiment dimensions
    pub schema: DimensionSchema,
    /// Replace each series with its running prefix sum
    pub cumulative: bool,
    /// Top-k fractions, each in (0, 1]
    pub top_percentages: Vec<f64>,
    /// Rank correlation over the full ranking
    pub correlation: Option<CorrelationMethod>,
    /// Report regret@k for every top-k fraction
    pub regret: bool,
    /// Report the percentage of distinct oracle scores
    pub unique_ratio: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            schema: DimensionSchema::Simple,
            cumulative: false,
            top_percentages: vec![TOP_PERCENTAGE_1, TOP_PERCENTAGE_10],
            correlation: None,
            regret: false,
            unique_ratio: false,
        }
    }
}

impl EvalConfig {
    /// Preset for active-learning runs: precision at 1% and 10%.
    pub fn active_learning() -> Self {
        Self::default()
    }

    /// Preset for active-normalization runs: precision at 10% and Kendall's
    /// tau, reported cumulatively.
    pub fn active_normalization() -> Self {
        Self {
            schema: DimensionSchema::Extended,
            cumulative: true,
            top_percentages: vec![TOP_PERCENTAGE_10],
            correlation: Some(CorrelationMethod::Kendall),
            regret: false,
            unique_ratio: false,
        }
    }

    /// Decodes a JSON configuration; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EvalError> {
        let config: EvalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks percentages and that at least one metric is requested.
    pub fn validate(&self) -> Result<(), EvalError> {
        for &p in &self.top_percentages {
            if !(p > 0.0 && p <= 1.0) {
                return Err(EvalError::InvalidConfig(format!(
                    "top percentage {} is outside (0, 1]",
                    p
                )));
            }
        }
        if self.metrics().is_empty() {
            return Err(EvalError::InvalidConfig(
                "no metrics requested".to_string(),
            ));
        }
        Ok(())
    }

    /// The metrics to compute, in reporting order.
    pub fn metrics(&self) -> Vec<MetricKind> {
        let mut metrics: Vec<MetricKind> = self
            .top_percentages
            .iter()
            .map(|&percentage| MetricKind::Precision { percentage })
            .collect();

        if self.regret {
            metrics.extend(
                self.top_percentages
                    .iter()
                    .map(|&percentage| MetricKind::Regret { percentage }),
            );
        }
        if self.unique_ratio {
            metrics.push(MetricKind::UniqueRatio);
        }
        if let Some(method) = self.correlation {
            metrics.push(MetricKind::Correlation(method));
        }
        metrics
    }

    /// Series names for [`metrics`](Self::metrics).
    pub fn metric_names(&self) -> Vec<String> {
        self.metrics().iter().map(MetricKind::name).collect()
    }
}
