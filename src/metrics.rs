//! Clustering evaluation against ground truth.
//!
//! # Adjusted Rand Index
//!
//! Count, over all pairs of items, how often two labelings agree about
//! "same group" vs "different group", then correct for the agreement
//! expected by chance:
//!
//! ```text
//! index    = Σ_ij C(n_ij, 2)
//! expected = Σ_i C(a_i, 2) · Σ_j C(b_j, 2) / C(n, 2)
//! max      = (Σ_i C(a_i, 2) + Σ_j C(b_j, 2)) / 2
//! ARI      = (index − expected) / (max − expected)
//! ```
//!
//! where `n_ij` is the contingency table and `a_i`, `b_j` its row and
//! column sums. 1 is perfect agreement, 0 is chance level; label values
//! themselves do not matter, only the partition they induce.
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions"

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Adjusted Rand Index between a ground-truth and a predicted labeling.
///
/// Symmetric in its arguments.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] if the lengths differ, [`Error::EmptyInput`]
/// if both are empty.
///
/// # Degenerate input
///
/// When `max == expected` the ratio is 0/0 and the result is `NaN`. This
/// happens for a single item, or when both labelings put everything in
/// one group. The value is not clamped.
///
/// # Example
///
/// ```rust
/// use gsdmm::metrics::ari;
///
/// let truth = [0, 0, 0, 1, 1, 1];
/// let pred = [0, 0, 1, 1, 2, 2];
/// assert!((ari(&truth, &pred).unwrap() - 0.242424).abs() < 1e-6);
/// ```
pub fn ari(truth: &[usize], pred: &[usize]) -> Result<f64> {
    if truth.len() != pred.len() {
        return Err(Error::DimensionMismatch {
            expected: truth.len(),
            found: pred.len(),
        });
    }
    if truth.is_empty() {
        return Err(Error::EmptyInput);
    }

    // Joint counts n_ij, row sums a_i and column sums b_j, in one pass.
    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut rows: HashMap<usize, usize> = HashMap::new();
    let mut cols: HashMap<usize, usize> = HashMap::new();
    for (&t, &p) in truth.iter().zip(pred) {
        *joint.entry((t, p)).or_default() += 1;
        *rows.entry(t).or_default() += 1;
        *cols.entry(p).or_default() += 1;
    }

    // Integer sums keep the result independent of map iteration order.
    let index: usize = joint.values().map(|&c| pairs(c)).sum();
    let sum_a: usize = rows.values().map(|&a| pairs(a)).sum();
    let sum_b: usize = cols.values().map(|&b| pairs(b)).sum();

    let expected = (sum_a as f64 * sum_b as f64) / pairs(truth.len()) as f64;
    let max_index = (sum_a + sum_b) as f64 / 2.0;

    Ok((index as f64 - expected) / (max_index - expected))
}

/// Unordered pairs among `n` items, C(n, 2).
fn pairs(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}
