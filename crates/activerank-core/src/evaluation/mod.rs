//! Ranking-quality evaluation.
//!
//! Converts a [`RankedSnapshot`](crate::ranking::RankedSnapshot) into scalar
//! metrics and summarizes metric values across folds.
//!
//! # Metrics Reference
//!
//! | Metric | Series name | Range | Description |
//! |--------|-------------|-------|-------------|
//! | Precision@k | `precision@<p>%` | [0, 1] | Approx top-k items that are in the oracle top-k |
//! | Regret@k | `regret@<p>%` | [0, 1] | Oracle top-k items missing from the approx top-k |
//! | Unique ratio | `unique_ratio` | [0, 100] | Percentage of distinct oracle scores |
//! | Spearman | `spearman` | [-1, 1] | Rank correlation over all items |
//! | Kendall | `kendall` | [-1, 1] | Pairwise rank agreement over all items |
//!
//! `k = max(1, floor(n × p))` for a snapshot of `n` items and fraction `p`.
//! Correlations over fewer than two items are `NaN`.

pub mod metrics;
pub mod stats;

pub use metrics::{
    kendall_tau, precision_at_k, rank_correlation, regret_at_k, resolve_k, spearman_rho,
    unique_ratio, MetricKind,
};
pub use stats::{bootstrap_ci, ConfidenceInterval};
