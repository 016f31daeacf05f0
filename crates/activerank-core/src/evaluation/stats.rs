//! Bootstrap statistics for summarizing metric series across folds.
//!
//! Each experiment timeline is repeated once per cross-validation fold. To
//! report "the" curve for an algorithm, the value at every iteration is
//! averaged over folds, with a percentile-bootstrap 95% confidence band.
//!
//! # References
//!
//! - Efron & Tibshirani (1993). "An Introduction to the Bootstrap"

/// Mean and 95% percentile-bootstrap interval of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    /// Sample mean
    pub mean: f64,
    /// 2.5th percentile of the bootstrap means
    pub lower: f64,
    /// 97.5th percentile of the bootstrap means
    pub upper: f64,
    /// Number of (non-NaN) values the interval was computed from
    pub samples: usize,
}

impl ConfidenceInterval {
    fn undefined() -> Self {
        Self {
            mean: f64::NAN,
            lower: f64::NAN,
            upper: f64::NAN,
            samples: 0,
        }
    }
}

/// Computes the mean of `values` with a 95% bootstrap confidence interval.
///
/// `NaN` values (degenerate statistics) are left out of the sample. With no
/// remaining values every field is `NaN` and `samples` is 0.
///
/// # Arguments
///
/// * `values` - One metric value per fold
/// * `n_bootstrap` - Number of resamples (typically 1000)
/// * `seed` - Seed for reproducible resampling
///
/// # Example
///
/// ```
/// use activerank_core::evaluation::stats::bootstrap_ci;
///
/// let ci = bootstrap_ci(&[0.4, 0.5, f64::NAN, 0.6], 1000, 42);
/// assert_eq!(ci.samples, 3);
/// assert!((ci.mean - 0.5).abs() < 1e-12);
/// assert!(ci.lower <= ci.mean && ci.mean <= ci.upper);
/// ```
pub fn bootstrap_ci(values: &[f64], n_bootstrap: usize, seed: u64) -> ConfidenceInterval {
    let sample: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sample.is_empty() {
        return ConfidenceInterval::undefined();
    }

    let n = sample.len();
    let mean = sample.iter().sum::<f64>() / n as f64;

    if n == 1 || n_bootstrap == 0 {
        return ConfidenceInterval {
            mean,
            lower: mean,
            upper: mean,
            samples: n,
        };
    }

    let mut rng = LcgRng::new(seed);
    let mut means: Vec<f64> = (0..n_bootstrap)
        .map(|_| {
            let sum: f64 = (0..n).map(|_| sample[rng.next_usize(n)]).sum();
            sum / n as f64
        })
        .collect();
    means.sort_by(f64::total_cmp);

    let last = means.len() - 1;
    let lower_idx = ((n_bootstrap as f64) * 0.025) as usize;
    let upper_idx = ((n_bootstrap as f64) * 0.975) as usize;

    ConfidenceInterval {
        mean,
        lower: means[lower_idx.min(last)],
        upper: means[upper_idx.min(last)],
        samples: n,
    }
}

// ============================================================================
// Internal: LCG for reproducible resampling
// ============================================================================

struct LcgRng {
    state: u64,
}

impl LcgRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        // Knuth's MMIX multiplier
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform-ish index in `0..max`, taken from the high bits.
    fn next_usize(&mut self, max: usize) -> usize {
        ((self.next() >> 33) as usize) % max
    }
}
