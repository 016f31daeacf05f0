//! Tabular snapshot contents.
//!
//! The engine never touches the filesystem directly: it asks a [`TableSource`]
//! for the parsed records behind a source name.
//!
//! # Implementations
//!
//! - [`CsvTableSource`] - a directory of `.csv` files with a header row
//! - [`InMemoryTableSource`] - tables supplied by the caller (tests, embedding)

use super::{ScoredItem, SCORE_APPROX_COLUMN, SCORE_ORACLE_COLUMN};
use crate::error::{EvalError, SnapshotError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

const CSV_EXTENSION: &str = "csv";

/// Header plus string records, as read from one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table with the two score columns from numeric pairs.
    pub fn from_scores(pairs: &[(f64, f64)]) -> Self {
        Self {
            headers: vec![SCORE_APPROX_COLUMN.to_string(), SCORE_ORACLE_COLUMN.to_string()],
            rows: pairs
                .iter()
                .map(|(approx, oracle)| vec![approx.to_string(), oracle.to_string()])
                .collect(),
        }
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == column)
    }

    /// Extracts the paired scores, validating that both columns exist.
    ///
    /// Empty cells read as `NaN`. Any other non-numeric cell is an error.
    pub fn score_items(&self, source_name: &str) -> Result<Vec<ScoredItem>, SnapshotError> {
        let approx_idx = self.column_index(SCORE_APPROX_COLUMN);
        let oracle_idx = self.column_index(SCORE_ORACLE_COLUMN);

        let (approx_idx, oracle_idx) = match (approx_idx, oracle_idx) {
            (Some(a), Some(o)) => (a, o),
            _ => {
                let missing = [
                    (SCORE_APPROX_COLUMN, approx_idx),
                    (SCORE_ORACLE_COLUMN, oracle_idx),
                ]
                .iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
                return Err(SnapshotError::MissingColumns {
                    source_name: source_name.to_string(),
                    missing,
                });
            }
        };

        self.rows
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let approx =
                    parse_cell(source_name, row, SCORE_APPROX_COLUMN, record.get(approx_idx))?;
                let oracle =
                    parse_cell(source_name, row, SCORE_ORACLE_COLUMN, record.get(oracle_idx))?;
                Ok(ScoredItem::new(approx, oracle))
            })
            .collect()
    }
}

fn parse_cell(
    source_name: &str,
    row: usize,
    column: &str,
    cell: Option<&String>,
) -> Result<f64, SnapshotError> {
    let value = cell.map(|c| c.trim()).unwrap_or("");
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    value.parse().map_err(|_| SnapshotError::InvalidValue {
        source_name: source_name.to_string(),
        row: row + 1,
        column: column.to_string(),
        value: value.to_string(),
    })
}

// ============================================================================
// TableSource Trait
// ============================================================================

/// Supplier of snapshot tables keyed by source name.
pub trait TableSource {
    /// Enumerates the available source names.
    ///
    /// Failing to enumerate is fatal for a run; the returned order is the
    /// enumeration order used to break duplicate-timestamp ties.
    fn list_sources(&self) -> Result<Vec<String>, EvalError>;

    /// Loads the table behind one source name.
    fn load(&self, source_name: &str) -> Result<RawTable, SnapshotError>;
}

// ============================================================================
// CsvTableSource
// ============================================================================

/// Reads `.csv` snapshot files from a single directory (not recursive).
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    dir: PathBuf,
}

impl CsvTableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, source_name: &str) -> PathBuf {
        self.dir.join(source_name)
    }
}

impl TableSource for CsvTableSource {
    /// Lists `.csv` files, sorted by name.
    fn list_sources(&self) -> Result<Vec<String>, EvalError> {
        let dir_error = |source| EvalError::SourceDirectory {
            path: self.dir.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(dir_error)? {
            let entry = entry.map_err(dir_error)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == CSV_EXTENSION);
            if !is_csv {
                continue;
            }
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => names.push(name.to_string()),
                None => warn!(
                    path = %path.display(),
                    "Snapshot file name is not valid UTF-8; skipping"
                ),
            }
        }

        names.sort();
        Ok(names)
    }

    fn load(&self, source_name: &str) -> Result<RawTable, SnapshotError> {
        let path = self.path_for(source_name);
        if !path.is_file() {
            return Err(SnapshotError::NotFound(path.display().to_string()));
        }

        let csv_error = |source| SnapshotError::Csv {
            path: path.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(csv_error)?;

        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(path = %path.display(), rows = rows.len(), "Loaded snapshot table");
        Ok(RawTable::new(headers, rows))
    }
}

// ============================================================================
// InMemoryTableSource
// ============================================================================

/// Tables held in memory, enumerated in name order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableSource {
    tables: BTreeMap<String, RawTable>,
}

impl InMemoryTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_name: impl Into<String>, table: RawTable) {
        self.tables.insert(source_name.into(), table);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, source_name: impl Into<String>, table: RawTable) -> Self {
        self.insert(source_name, table);
        self
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableSource for InMemoryTableSource {
    fn list_sources(&self) -> Result<Vec<String>, EvalError> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn load(&self, source_name: &str) -> Result<RawTable, SnapshotError> {
        self.tables
            .get(source_name)
            .cloned()
            .ok_or_else(|| SnapshotError::NotFound(source_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_score_items_ignores_extra_columns() {
        let t = table(
            &["id", "scoreOracle", "scoreApprox"],
            &[&["a", "0.5", "0.9"], &["b", "0.7", "0.1"]],
        );
        let items = t.score_items("t").unwrap();
        assert_eq!(items, vec![ScoredItem::new(0.9, 0.5), ScoredItem::new(0.1, 0.7)]);
    }

    #[test]
    fn test_score_items_missing_oracle() {
        let t = table(&["scoreApprox"], &[&["0.5"]]);
        match t.score_items("t") {
            Err(SnapshotError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, vec!["scoreOracle".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_score_items_missing_both() {
        let t = table(&["id"], &[]);
        match t.score_items("t") {
            Err(SnapshotError::MissingColumns { missing, .. }) => assert_eq!(missing.len(), 2),
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_score_items_empty_cell_is_nan() {
        let t = table(&["scoreApprox", "scoreOracle"], &[&["", "1"]]);
        let items = t.score_items("t").unwrap();
        assert!(items[0].score_approx.is_nan());
        assert_eq!(items[0].score_oracle, 1.0);
    }

    #[test]
    fn test_score_items_invalid_value() {
        let t = table(&["scoreApprox", "scoreOracle"], &[&["0.1", "0.2"], &["x", "0.3"]]);
        match t.score_items("t") {
            Err(SnapshotError::InvalidValue { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "scoreApprox");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_from_scores_round_trips_values() {
        let t = RawTable::from_scores(&[(1.5, -2.0)]);
        assert_eq!(t.score_items("t").unwrap(), vec![ScoredItem::new(1.5, -2.0)]);
    }

    #[test]
    fn test_csv_source_lists_only_csv_files_sorted() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("b_0_x_o_2.csv")).unwrap();
        File::create(dir.path().join("a_0_x_o_1.csv")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let source = CsvTableSource::new(dir.path());
        assert_eq!(
            source.list_sources().unwrap(),
            vec!["a_0_x_o_1.csv".to_string(), "b_0_x_o_2.csv".to_string()]
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_csv_source_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("a_0_x_o_1.csv")).unwrap();
        let invalid = OsStr::from_bytes(b"b_0_x_o_\xff.csv");
        File::create(dir.path().join(invalid)).unwrap();

        let source = CsvTableSource::new(dir.path());
        assert_eq!(source.list_sources().unwrap(), vec!["a_0_x_o_1.csv".to_string()]);
    }

    #[test]
    fn test_csv_source_missing_directory() {
        let source = CsvTableSource::new("/nonexistent/activerank/results");
        assert!(matches!(
            source.list_sources(),
            Err(EvalError::SourceDirectory { .. })
        ));
    }

    #[test]
    fn test_csv_source_load() {
        let dir = TempDir::new().unwrap();
        let mut f = File::create(dir.path().join("s.csv")).unwrap();
        writeln!(f, "scoreApprox, scoreOracle").unwrap();
        writeln!(f, "0.9, 1.0").unwrap();
        writeln!(f, "0.2, 0.5").unwrap();

        let source = CsvTableSource::new(dir.path());
        let t = source.load("s.csv").unwrap();
        assert_eq!(t.headers, vec!["scoreApprox", "scoreOracle"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.score_items("s.csv").unwrap()[1], ScoredItem::new(0.2, 0.5));
    }

    #[test]
    fn test_csv_source_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let source = CsvTableSource::new(dir.path());
        assert!(matches!(source.load("gone.csv"), Err(SnapshotError::NotFound(_))));
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemoryTableSource::new()
            .with("b", RawTable::default())
            .with("a", RawTable::from_scores(&[(1.0, 1.0)]));
        assert_eq!(source.len(), 2);
        assert_eq!(source.list_sources().unwrap(), vec!["a", "b"]);
        assert!(source.load("a").is_ok());
        assert!(matches!(source.load("c"), Err(SnapshotError::NotFound(_))));
    }
}
