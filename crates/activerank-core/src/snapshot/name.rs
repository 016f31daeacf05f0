//! Snapshot-name grammar.
//!
//! Two grammars are supported, both `_`-separated with an optional `.csv`
//! extension:
//!
//! ```text
//! simple:    dataset_fold_algorithm_oracle_timestamp.csv
//! extended:  dataset_fold_algorithm-normMethod_oracle_timestamp.csv
//! ```
//!
//! In the extended grammar the middle segment (everything between the fold and
//! the last two fields) may itself contain `_`. Only its *last* `-` separates
//! the algorithm from the normalization method, so algorithm names may carry
//! hyphens while normalization methods may not.

use super::SnapshotMeta;
use crate::config::DimensionSchema;
use crate::error::SnapshotError;
use std::path::Path;

const FIELD_SEPARATOR: char = '_';
const NORM_SEPARATOR: char = '-';
const CSV_EXTENSION: &str = ".csv";
const MIN_FIELDS: usize = 5;

/// Recovers experiment dimensions from a snapshot source name.
///
/// Only the final path component is parsed. A non-integer timestamp makes the
/// name malformed.
///
/// # Example
///
/// ```
/// use activerank_core::{parse_source_name, DimensionSchema};
///
/// let meta = parse_source_name("iris_3_Thurstone-0.0-minmax_ChiSquared_17.csv",
///     DimensionSchema::Extended).unwrap();
/// assert_eq!(meta.algorithm, "Thurstone-0.0");
/// assert_eq!(meta.norm_method.as_deref(), Some("minmax"));
/// assert_eq!(meta.timestamp, 17);
/// ```
pub fn parse_source_name(
    name: &str,
    schema: DimensionSchema,
) -> Result<SnapshotMeta, SnapshotError> {
    let base = Path::new(name)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(name);
    let stem = base.strip_suffix(CSV_EXTENSION).unwrap_or(base);
    let fields: Vec<&str> = stem.split(FIELD_SEPARATOR).collect();

    match schema {
        DimensionSchema::Simple => parse_simple(name, &fields),
        DimensionSchema::Extended => parse_extended(name, &fields),
    }
}

fn parse_simple(name: &str, fields: &[&str]) -> Result<SnapshotMeta, SnapshotError> {
    let [dataset, fold, algorithm, oracle, timestamp] = fields else {
        return Err(SnapshotError::malformed(
            name,
            format!("expected exactly {} fields, got {}", MIN_FIELDS, fields.len()),
        ));
    };

    Ok(SnapshotMeta {
        dataset: dataset.to_string(),
        fold: fold.to_string(),
        algorithm: algorithm.to_string(),
        norm_method: None,
        oracle: oracle.to_string(),
        timestamp: parse_timestamp(name, timestamp)?,
    })
}

fn parse_extended(name: &str, fields: &[&str]) -> Result<SnapshotMeta, SnapshotError> {
    if fields.len() < MIN_FIELDS {
        return Err(SnapshotError::malformed(
            name,
            format!("expected at least {} fields, got {}", MIN_FIELDS, fields.len()),
        ));
    }

    let n = fields.len();
    let middle = fields[2..n - 2].join("_");
    let (algorithm, norm_method) = match middle.rsplit_once(NORM_SEPARATOR) {
        Some((algorithm, norm)) => (algorithm.to_string(), norm.to_string()),
        None => (middle, String::new()),
    };

    Ok(SnapshotMeta {
        dataset: fields[0].to_string(),
        fold: fields[1].to_string(),
        algorithm,
        norm_method: Some(norm_method),
        oracle: fields[n - 2].to_string(),
        timestamp: parse_timestamp(name, fields[n - 1])?,
    })
}

fn parse_timestamp(name: &str, field: &str) -> Result<i64, SnapshotError> {
    field.parse().map_err(|_| {
        SnapshotError::malformed(name, format!("timestamp '{}' is not an integer", field))
    })
}
