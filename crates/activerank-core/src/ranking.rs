//! Descending ranks for snapshot score columns.
//!
//! Rank 1 is the highest score. Equal scores are ranked by their position in
//! the input sequence (first seen gets the lower rank number), so the result
//! is a permutation of `1..=n` and is reproducible for a fixed input order.
//! `NaN` scores rank after every real score.

use crate::snapshot::{ScoredItem, Snapshot};
use std::cmp::Ordering;

/// Ranks `scores` in descending order with first-occurrence tie-breaking.
///
/// # Example
///
/// ```
/// use activerank_core::ranking::rank_descending;
///
/// assert_eq!(rank_descending(&[0.2, 0.9, 0.2, 0.5]), vec![3, 1, 4, 2]);
/// ```
pub fn rank_descending(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // sort_by is stable: ties keep input order
    order.sort_by(|&a, &b| descending(scores[a], scores[b]));

    let mut ranks = vec![0; scores.len()];
    for (position, &item) in order.iter().enumerate() {
        ranks[item] = position + 1;
    }
    ranks
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// A snapshot's items with both rank columns attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSnapshot {
    pub items: Vec<ScoredItem>,
    pub rank_approx: Vec<usize>,
    pub rank_oracle: Vec<usize>,
}

impl RankedSnapshot {
    /// Ranks the approximate and oracle score columns independently.
    pub fn from_items(items: Vec<ScoredItem>) -> Self {
        let approx: Vec<f64> = items.iter().map(|i| i.score_approx).collect();
        let oracle: Vec<f64> = items.iter().map(|i| i.score_oracle).collect();
        Self {
            rank_approx: rank_descending(&approx),
            rank_oracle: rank_descending(&oracle),
            items,
        }
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::from_items(snapshot.items.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item positions whose approximate rank is within the top `k`.
    pub fn top_k_approx(&self, k: usize) -> impl Iterator<Item = usize> + '_ {
        top_k(&self.rank_approx, k)
    }

    /// Item positions whose oracle rank is within the top `k`.
    pub fn top_k_oracle(&self, k: usize) -> impl Iterator<Item = usize> + '_ {
        top_k(&self.rank_oracle, k)
    }
}

fn top_k(ranks: &[usize], k: usize) -> impl Iterator<Item = usize> + '_ {
    ranks
        .iter()
        .enumerate()
        .filter(move |&(_, &rank)| rank <= k)
        .map(|(idx, _)| idx)
}
