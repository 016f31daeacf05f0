//! Snapshots: one timestamped measurement of approximate vs. oracle scores.
//!
//! A snapshot source is identified by its file name, which encodes the
//! experiment dimensions (see [`name`]). Its contents are a table with at least
//! the `scoreApprox` and `scoreOracle` columns (see [`table`]).

pub mod name;
pub mod table;

pub use name::parse_source_name;
pub use table::{CsvTableSource, InMemoryTableSource, RawTable, TableSource};

use serde::{Deserialize, Serialize};

/// Column holding the score assigned by the method under evaluation.
pub const SCORE_APPROX_COLUMN: &str = "scoreApprox";

/// Column holding the ground-truth oracle score.
pub const SCORE_ORACLE_COLUMN: &str = "scoreOracle";

/// Experiment dimensions and timestamp recovered from a source name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub dataset: String,
    pub fold: String,
    pub algorithm: String,
    /// `Some` exactly when the extended grammar was used (may be empty)
    pub norm_method: Option<String>,
    pub oracle: String,
    /// Assigned by the upstream experiment when the snapshot was written
    pub timestamp: i64,
}

/// One item's pair of scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub score_approx: f64,
    pub score_oracle: f64,
}

impl ScoredItem {
    pub fn new(score_approx: f64, score_oracle: f64) -> Self {
        Self {
            score_approx,
            score_oracle,
        }
    }
}

/// A parsed snapshot: metadata plus items in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub items: Vec<ScoredItem>,
}

impl Snapshot {
    pub fn new(meta: SnapshotMeta, items: Vec<ScoredItem>) -> Self {
        Self { meta, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
