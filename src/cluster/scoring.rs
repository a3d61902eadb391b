//! Log-space cluster scores and the categorical draw.
//!
//! For a document `d` with `n` tokens and a cluster `z`:
//!
//! ```text
//! log w(z) = ln(m_z + α)
//!          + Σ_t Σ_{j=1..c_t} ln(n_z,t + j − 1 + β)
//!          − Σ_{i=1..n}       ln(n_z + i − 1 + Vβ)
//! ```
//!
//! and for one of the `K − k` unused slots the same with zero counts and
//! prior `ln((K − k) α)`. Only the document's non-zero tokens are visited,
//! so the cost is proportional to document length, not vocabulary size.
//!
//! The scores are turned into weights by subtracting the maximum before
//! exponentiating. The result is proportional to the conditional, not
//! normalized, and is sampled by weight.

use super::dmm::Hyperparameters;
use super::state::{ClusterAggregate, ClusterState};
use crate::corpus::Document;
use crate::error::{Error, Result};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-fit constants needed to score a document against a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    concentration: f64,
    smoothing: f64,
    max_clusters: usize,
    /// `V * β`.
    vocab_smoothing: f64,
}

impl Scorer {
    /// Scorer for a corpus with `vocab_size` distinct tokens.
    pub fn new(params: &Hyperparameters, vocab_size: usize) -> Self {
        Self {
            concentration: params.concentration,
            smoothing: params.smoothing,
            max_clusters: params.max_clusters,
            vocab_smoothing: vocab_size as f64 * params.smoothing,
        }
    }

    /// Log-weight of assigning `doc` to the non-empty `cluster`.
    pub fn score_nonempty(&self, cluster: &ClusterAggregate, doc: &Document) -> f64 {
        let mut score = (cluster.n_docs() as f64 + self.concentration).ln();

        for &(token, count) in doc.tokens() {
            let existing = cluster.token_count(token);
            for j in 0..count {
                score += ((existing + j) as f64 + self.smoothing).ln();
            }
        }

        let total = cluster.n_tokens();
        for i in 0..doc.n_tokens() {
            score -= ((total + i) as f64 + self.vocab_smoothing).ln();
        }
        score
    }

    /// Log-weight of assigning `doc` to one of the unused slots when
    /// `n_active` clusters are in use.
    pub fn score_empty(&self, n_active: usize, doc: &Document) -> f64 {
        let free = self.max_clusters.saturating_sub(n_active);
        let mut score = (free as f64 * self.concentration).ln();

        for &(_, count) in doc.tokens() {
            for j in 0..count {
                score += (j as f64 + self.smoothing).ln();
            }
        }

        for i in 0..doc.n_tokens() {
            score -= (i as f64 + self.vocab_smoothing).ln();
        }
        score
    }

    /// Log-weights for every active cluster, followed by the fresh slot
    /// when the state is below its cap.
    pub fn log_weights(&self, state: &ClusterState, doc: &Document) -> Vec<f64> {
        let mut weights = Vec::with_capacity(state.n_active() + 1);

        #[cfg(feature = "parallel")]
        state
            .clusters()
            .par_iter()
            .map(|c| self.score_nonempty(c, doc))
            .collect_into_vec(&mut weights);

        #[cfg(not(feature = "parallel"))]
        weights.extend(state.clusters().iter().map(|c| self.score_nonempty(c, doc)));

        if !state.is_full() {
            weights.push(self.score_empty(state.n_active(), doc));
        }
        weights
    }
}

/// Exponentiate log-weights after shifting by their maximum.
///
/// The largest entry maps to exactly 1. Fails when there is no finite
/// maximum to shift by.
pub fn exp_normalize(log_weights: &[f64]) -> Result<Vec<f64>> {
    if log_weights.is_empty() {
        return Err(Error::DegenerateWeights {
            reason: "empty log-weight vector".to_string(),
        });
    }
    let max = log_weights
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(Error::DegenerateWeights {
            reason: format!("maximum log-weight is {max}"),
        });
    }
    Ok(log_weights.iter().map(|&w| (w - max).exp()).collect())
}

/// Draw an index with probability proportional to `weights`.
///
/// Weights need not sum to one. NaN, infinite or negative entries, and
/// an all-zero vector, are rejected rather than defaulting to index 0.
pub fn sample_categorical<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize> {
    if let Some((i, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(Error::DegenerateWeights {
            reason: format!("weight {i} is {w}"),
        });
    }
    if !weights.iter().any(|&w| w > 0.0) {
        return Err(Error::DegenerateWeights {
            reason: format!("all {} weights are zero", weights.len()),
        });
    }
    let dist = WeightedIndex::<f64>::new(weights).map_err(|e| Error::DegenerateWeights {
        reason: e.to_string(),
    })?;
    Ok(dist.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scorer() -> Scorer {
        let params = Hyperparameters {
            max_clusters: 5,
            concentration: 0.1,
            smoothing: 0.1,
            max_sweeps: 10,
        };
        Scorer::new(&params, 5)
    }

    /// Cluster {0: 2, 1: 2, 2: 1} over two documents, inside a state with
    /// two active clusters.
    fn fixture() -> (ClusterState, Document) {
        let mut state = ClusterState::new(3, 5);
        let a = Document::new(vec![(0, 1), (1, 1)]).unwrap();
        let b = Document::new(vec![(0, 1), (1, 1), (2, 1)]).unwrap();
        let other = Document::new(vec![(4, 2)]).unwrap();
        state.add(0, 0, &a).unwrap();
        state.add(0, 1, &b).unwrap();
        state.add(1, 2, &other).unwrap();
        let doc = Document::new(vec![(0, 1), (1, 1), (2, 1)]).unwrap();
        (state, doc)
    }

    #[test]
    fn test_score_nonempty_known_value() {
        let (state, doc) = fixture();
        let score = scorer().score_nonempty(state.cluster(0).unwrap(), &doc);
        assert!((score - -3.270331).abs() < 1e-4, "got {score}");
    }

    #[test]
    fn test_score_empty_known_value() {
        let (state, doc) = fixture();
        let score = scorer().score_empty(state.n_active(), &doc);
        assert!((score - -8.7403367427).abs() < 1e-6, "got {score}");
    }

    #[test]
    fn test_scores_are_bit_identical_across_calls() {
        let (state, doc) = fixture();
        let s = scorer();
        let c = state.cluster(0).unwrap();
        assert_eq!(
            s.score_nonempty(c, &doc).to_bits(),
            s.score_nonempty(c, &doc).to_bits()
        );
        assert_eq!(
            s.score_empty(2, &doc).to_bits(),
            s.score_empty(2, &doc).to_bits()
        );
    }

    #[test]
    fn test_log_weights_include_fresh_slot_below_cap() {
        let (state, doc) = fixture();
        let w = scorer().log_weights(&state, &doc);
        assert_eq!(w.len(), 3);
        assert_eq!(w[2], scorer().score_empty(2, &doc));
    }

    #[test]
    fn test_log_weights_omit_fresh_slot_at_cap() {
        let params = Hyperparameters {
            max_clusters: 2,
            ..Hyperparameters::default()
        };
        let mut capped = ClusterState::new(3, 2);
        for (i, c) in [0usize, 0, 1].into_iter().enumerate() {
            capped.add(c, i, &Document::from_token_ids([i])).unwrap();
        }
        let doc = Document::from_token_ids([0, 1]);
        let w = Scorer::new(&params, 5).log_weights(&capped, &doc);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn test_exp_normalize() {
        let w = exp_normalize(&[100.0, 102.0, 99.0]).unwrap();
        let expected = [0.135335, 1.0, 0.049787068];
        for (a, b) in w.iter().zip(expected) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn test_exp_normalize_handles_large_magnitudes() {
        let w = exp_normalize(&[-5000.0, -5001.0]).unwrap();
        assert_eq!(w[0], 1.0);
        assert!(w[1] > 0.0 && w[1] < 1.0);
    }

    #[test]
    fn test_exp_normalize_rejects_non_finite() {
        assert!(exp_normalize(&[f64::NEG_INFINITY, f64::NEG_INFINITY]).is_err());
        assert!(exp_normalize(&[f64::NAN]).is_err());
        assert!(exp_normalize(&[]).is_err());
    }

    #[test]
    fn test_sample_categorical_single_positive() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(sample_categorical(&[0.0, 0.0, 3.0], &mut rng).unwrap(), 2);
        }
    }

    #[test]
    fn test_sample_categorical_rejects_degenerate() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            sample_categorical(&[0.0, 0.0], &mut rng),
            Err(Error::DegenerateWeights { .. })
        ));
        assert!(sample_categorical(&[1.0, f64::NAN], &mut rng).is_err());
        assert!(sample_categorical(&[f64::INFINITY], &mut rng).is_err());
        assert!(sample_categorical(&[1.0, -0.5], &mut rng).is_err());
        assert!(sample_categorical(&[], &mut rng).is_err());
    }

    #[test]
    fn test_sample_categorical_roughly_proportional() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits = [0usize; 2];
        for _ in 0..10_000 {
            hits[sample_categorical(&[1.0, 3.0], &mut rng).unwrap()] += 1;
        }
        let frac = hits[1] as f64 / 10_000.0;
        assert!((frac - 0.75).abs() < 0.03, "got {frac}");
    }
}
