//! Error types for activerank-core.
//!
//! Two tiers of failure exist:
//! - [`SnapshotError`] concerns a single snapshot source. The engine recovers
//!   from it locally by skipping that source and carrying on.
//! - [`EvalError`] stops a whole run (nothing to aggregate, unreadable source
//!   directory, invalid configuration).
//!
//! Degenerate statistics (correlation over fewer than two items) are not
//! errors: they surface as `NaN` values in the metric series.

use std::path::PathBuf;
use thiserror::Error;

/// Errors tied to one snapshot source.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Source name does not follow the configured grammar
    #[error("Malformed snapshot name '{name}': {reason}")]
    MalformedName { name: String, reason: String },
    /// Table lacks one or more required score columns
    #[error("Missing columns {missing:?} in {source_name}")]
    MissingColumns {
        source_name: String,
        missing: Vec<String>,
    },
    /// A score cell could not be parsed as a number
    #[error("Invalid value '{value}' in column '{column}' at row {row} of {source_name}")]
    InvalidValue {
        source_name: String,
        row: usize,
        column: String,
        value: String,
    },
    /// Source is not known to the table source
    #[error("Snapshot source not found: {0}")]
    NotFound(String),
    /// CSV decoding error
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl SnapshotError {
    /// Shorthand for a [`SnapshotError::MalformedName`].
    pub fn malformed(name: &str, reason: impl Into<String>) -> Self {
        SnapshotError::MalformedName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors that abort an evaluation run.
#[derive(Debug, Error)]
pub enum EvalError {
    /// No sources found, or no timeline received any data
    #[error("Nothing to aggregate: {0}")]
    EmptyInput(String),
    /// The source directory itself could not be enumerated
    #[error("Cannot read source directory {}: {source}", .path.display())]
    SourceDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Configuration file could not be decoded
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<EvalError> for String {
    fn from(err: EvalError) -> String {
        err.to_string()
    }
}
