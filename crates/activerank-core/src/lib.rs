//! # ActiveRank Core
//!
//! Evaluation engine for iterative (active-learning) ranking experiments.
//!
//! Every iteration of an experiment dumps a snapshot: a table of items scored
//! both by the approximate method under evaluation (`scoreApprox`) and by a
//! ground-truth oracle (`scoreOracle`). The snapshot's file name encodes the
//! experiment dimensions and a timestamp. This crate turns a directory of such
//! snapshots into per-iteration metric series, one per experiment timeline.
//!
//! ## Modules
//!
//! - [`snapshot`] - Name grammar, snapshot types, and table sources (CSV, in-memory)
//! - [`ranking`] - Stable descending ranks for both score columns
//! - [`evaluation`] - Rank-quality metrics and bootstrap statistics
//! - [`grouping`] - Classification of source names into experiment timelines
//! - [`timeline`] - Per-group aggregation into the [`MetricStore`]
//! - [`config`] - Evaluation configuration and presets
//! - [`error`] - Error types for per-source and run-level failures
//!
//! ## Example
//!
//! ```ignore
//! use activerank_core::{aggregate, group_sources, CsvTableSource, EvalConfig};
//!
//! let config = EvalConfig::active_learning();
//! let source = CsvTableSource::new("results/active_learning");
//! let grouping = group_sources(source.list_sources()?, config.schema);
//! let store = aggregate(&grouping, &source, &config)?;
//!
//! for (key, timeline) in store.iter() {
//!     println!("{key}: {} iterations", timeline.len());
//! }
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod grouping;
pub mod ranking;
pub mod snapshot;
pub mod timeline;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{CorrelationMethod, DimensionSchema, EvalConfig};
pub use error::{EvalError, SnapshotError};
pub use grouping::{group_sources, GroupKey, Grouping, SourceEntry};
pub use ranking::RankedSnapshot;
pub use snapshot::{
    parse_source_name, CsvTableSource, InMemoryTableSource, RawTable, ScoredItem, Snapshot,
    SnapshotMeta, TableSource,
};
pub use timeline::{
    aggregate, aggregate_with_progress, IterationStat, MetricStore, SeriesKey, SkippedSource,
    Timeline,
};
