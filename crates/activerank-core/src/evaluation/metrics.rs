//! Rank-quality metrics comparing an approximate ranking with the oracle's.
//!
//! Every metric is a pure function of a [`RankedSnapshot`] and, for the top-k
//! metrics, a resolved cutoff `k`:
//! - Precision@k: how much of the approximate top-k is in the oracle top-k
//! - Regret@k: how much of the oracle top-k the approximate method missed
//! - Unique ratio: share of distinct oracle scores (tie degeneracy diagnostic)
//! - Rank correlation: Spearman's rho or Kendall's tau over the full ranking
//!
//! # References
//!
//! - Kendall (1938). "A New Measure of Rank Correlation"
//! - Knight (1966). "A Computer Method for Calculating Kendall's Tau with
//!   Ungrouped Data"

use crate::config::CorrelationMethod;
use crate::ranking::RankedSnapshot;
use std::collections::HashSet;

// ============================================================================
// Metric Selection
// ============================================================================

/// A configurable metric and its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricKind {
    /// Precision at `max(1, floor(n * percentage))`
    Precision { percentage: f64 },
    /// Regret at `max(1, floor(n * percentage))`
    Regret { percentage: f64 },
    /// Percentage of distinct oracle scores
    UniqueRatio,
    /// Correlation between the two rank columns
    Correlation(CorrelationMethod),
}

impl MetricKind {
    /// Stable series name, e.g. `precision@10%`, `regret@1%`, `kendall`.
    pub fn name(&self) -> String {
        match self {
            MetricKind::Precision { percentage } => {
                format!("precision@{}%", percent_label(*percentage))
            }
            MetricKind::Regret { percentage } => format!("regret@{}%", percent_label(*percentage)),
            MetricKind::UniqueRatio => "unique_ratio".to_string(),
            MetricKind::Correlation(method) => method.name().to_string(),
        }
    }

    /// Computes this metric for one ranked snapshot.
    pub fn evaluate(&self, snapshot: &RankedSnapshot) -> f64 {
        match *self {
            MetricKind::Precision { percentage } => {
                precision_at_k(snapshot, resolve_k(snapshot.len(), percentage))
            }
            MetricKind::Regret { percentage } => {
                regret_at_k(snapshot, resolve_k(snapshot.len(), percentage))
            }
            MetricKind::UniqueRatio => unique_ratio(snapshot),
            MetricKind::Correlation(method) => rank_correlation(snapshot, method),
        }
    }
}

/// Formats a fraction as a percentage without trailing noise (0.1 -> "10").
fn percent_label(percentage: f64) -> String {
    let pct = percentage * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{}", pct.round() as i64)
    } else {
        let s = format!("{:.4}", pct);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Resolves a top-k fraction into a cutoff.
///
/// # Formula
///
/// ```text
/// k = max(1, floor(item_count × percentage))
/// ```
///
/// The floor of 1 keeps top-k metrics defined for tiny snapshots.
pub fn resolve_k(item_count: usize, percentage: f64) -> usize {
    let k = (item_count as f64 * percentage).floor();
    if k.is_finite() && k >= 1.0 {
        k as usize
    } else {
        1
    }
}

// ============================================================================
// Top-k Metrics
// ============================================================================

/// Computes Precision@k.
///
/// # Formula
///
/// ```text
/// P@k = |{ i : rank_approx(i) ≤ k and rank_oracle(i) ≤ k }| / k
/// ```
///
/// # Arguments
///
/// * `snapshot` - Ranked snapshot
/// * `k` - Cutoff, at least 1 (see [`resolve_k`])
///
/// # Returns
///
/// Precision between 0.0 and 1.0. `NaN` for `k = 0`, which is undefined.
pub fn precision_at_k(snapshot: &RankedSnapshot, k: usize) -> f64 {
    if k == 0 {
        return f64::NAN;
    }

    let relevant = snapshot
        .top_k_approx(k)
        .filter(|&idx| snapshot.rank_oracle[idx] <= k)
        .count();

    relevant as f64 / k as f64
}

/// Computes Regret@k.
///
/// Regret counts the oracle's top-k items that the approximate ranking did not
/// surface in its own top-k.
///
/// # Formula
///
/// ```text
/// R@k = |top_k(oracle) \ top_k(approx)| / k
/// ```
///
/// # Returns
///
/// Regret between 0.0 and 1.0. `NaN` for `k = 0`.
pub fn regret_at_k(snapshot: &RankedSnapshot, k: usize) -> f64 {
    if k == 0 {
        return f64::NAN;
    }

    let missed = snapshot
        .top_k_oracle(k)
        .filter(|&idx| snapshot.rank_approx[idx] > k)
        .count();

    missed as f64 / k as f64
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Percentage of oracle scores that are distinct values.
///
/// Many ties among oracle scores make rank-based metrics depend on the
/// tie-break rather than on the scores, so a low ratio flags a degenerate
/// oracle. `NaN` scores are not counted as values but do count as items.
///
/// # Returns
///
/// A percentage between 0.0 and 100.0, or `NaN` for an empty snapshot.
pub fn unique_ratio(snapshot: &RankedSnapshot) -> f64 {
    if snapshot.is_empty() {
        return f64::NAN;
    }

    let distinct: HashSet<u64> = snapshot
        .items
        .iter()
        .map(|item| item.score_oracle)
        .filter(|score| !score.is_nan())
        // + 0.0 folds -0.0 into 0.0
        .map(|score| (score + 0.0).to_bits())
        .collect();

    distinct.len() as f64 / snapshot.len() as f64 * 100.0
}

// ============================================================================
// Rank Correlation
// ============================================================================

/// Correlation between `rank_approx` and `rank_oracle` over all items.
///
/// Returns `NaN` for fewer than two items: the statistic is undefined there
/// and the gap must stay visible downstream.
pub fn rank_correlation(snapshot: &RankedSnapshot, method: CorrelationMethod) -> f64 {
    match method {
        CorrelationMethod::Spearman => spearman_rho(&snapshot.rank_approx, &snapshot.rank_oracle),
        CorrelationMethod::Kendall => kendall_tau(&snapshot.rank_approx, &snapshot.rank_oracle),
    }
}

/// Spearman's rho: Pearson correlation of the two rank sequences.
///
/// # Returns
///
/// Value in [-1, 1]; `NaN` when `n < 2`, lengths differ, or a sequence is
/// constant.
pub fn spearman_rho(ranks_a: &[usize], ranks_b: &[usize]) -> f64 {
    let n = ranks_a.len();
    if n < 2 || n != ranks_b.len() {
        return f64::NAN;
    }

    let mean = |ranks: &[usize]| ranks.iter().map(|&r| r as f64).sum::<f64>() / n as f64;
    let mean_a = mean(ranks_a);
    let mean_b = mean(ranks_b);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&a, &b) in ranks_a.iter().zip(ranks_b) {
        let da = a as f64 - mean_a;
        let db = b as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return f64::NAN;
    }
    cov / (var_a * var_b).sqrt()
}

/// Kendall's tau for two tie-free rank sequences.
///
/// Orders items by `ranks_a` and counts discordant pairs as inversions in the
/// corresponding `ranks_b` sequence (merge sort, O(n log n)).
///
/// # Formula
///
/// ```text
/// tau = (concordant - discordant) / (n(n-1)/2)
/// ```
///
/// # Returns
///
/// Value in [-1, 1]; `NaN` when `n < 2` or lengths differ.
pub fn kendall_tau(ranks_a: &[usize], ranks_b: &[usize]) -> f64 {
    let n = ranks_a.len();
    if n < 2 || n != ranks_b.len() {
        return f64::NAN;
    }

    let mut pairs: Vec<(usize, usize)> = ranks_a
        .iter()
        .copied()
        .zip(ranks_b.iter().copied())
        .collect();
    pairs.sort_unstable();
    let mut sequence: Vec<usize> = pairs.into_iter().map(|(_, b)| b).collect();

    let discordant = count_inversions(&mut sequence) as f64;
    let total = (n * (n - 1) / 2) as f64;
    let concordant = total - discordant;

    (concordant - discordant) / total
}

/// Counts pairs `i < j` with `values[i] > values[j]`, sorting `values`.
fn count_inversions(values: &mut [usize]) -> u64 {
    let n = values.len();
    if n < 2 {
        return 0;
    }

    let mid = n / 2;
    let mut inversions =
        count_inversions(&mut values[..mid]) + count_inversions(&mut values[mid..]);

    let mut merged = Vec::with_capacity(n);
    let (left, right) = values.split_at(mid);
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] <= right[j] {
            merged.push(left[i]);
            i += 1;
        } else {
            merged.push(right[j]);
            inversions += (left.len() - i) as u64;
            j += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    values.copy_from_slice(&merged);

    inversions
}

// ============================================================================
// Tests
// ============================================================================
