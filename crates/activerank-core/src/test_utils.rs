//! Test fixtures for activerank-core.
//!
//! Only compiled when running tests.

use crate::ranking::RankedSnapshot;
use crate::snapshot::{InMemoryTableSource, RawTable, ScoredItem};

/// Ranks `(score_approx, score_oracle)` pairs.
pub fn ranked(pairs: &[(f64, f64)]) -> RankedSnapshot {
    RankedSnapshot::from_items(pairs.iter().map(|&(a, o)| ScoredItem::new(a, o)).collect())
}

/// Ranks a snapshot whose approximate scores equal the oracle scores.
pub fn ranked_identical(scores: &[f64]) -> RankedSnapshot {
    RankedSnapshot::from_items(scores.iter().map(|&s| ScoredItem::new(s, s)).collect())
}

/// Score pairs whose approximate top item matches the oracle only when
/// `agree` is true. Ten items, so precision@10% uses k = 1.
pub fn ten_items(agree: bool) -> Vec<(f64, f64)> {
    (0..10)
        .map(|i| {
            let oracle = i as f64;
            let approx = if agree { oracle } else { -oracle };
            (approx, oracle)
        })
        .collect()
}

/// An in-memory table source holding the given tables.
pub fn source_with(tables: Vec<(&str, RawTable)>) -> InMemoryTableSource {
    tables
        .into_iter()
        .fold(InMemoryTableSource::new(), |source, (name, table)| {
            source.with(name, table)
        })
}
