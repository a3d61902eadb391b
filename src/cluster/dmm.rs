//! Dirichlet Multinomial Mixture fitted by collapsed Gibbs sampling.
//!
//! # The Model
//!
//! Each document is drawn from one of at most `K` clusters; each cluster
//! is a multinomial over the vocabulary with a symmetric Dirichlet(β)
//! prior, and cluster proportions have a Dirichlet(α) prior. Integrating
//! both out leaves only the assignments to sample.
//!
//! # The Sampler
//!
//! 1. **Initialize**: each document in order draws `z ~ Uniform(0..K)`;
//!    a draw past the active range opens the next unused slot instead.
//! 2. **Sweep**: for each document in order, remove it from its cluster,
//!    score every active cluster plus one fresh slot (if under `K`), draw
//!    a new cluster by weight and add it back.
//! 3. **Stop** after two consecutive sweeps in which no document changed
//!    cluster, or when `max_sweeps` is reached.
//!
//! Clusters that empty during a sweep disappear, so the number of clusters
//! found is usually far below `K`.
//!
//! # Hyperparameters
//!
//! - **α (concentration)**: pressure towards larger clusters. Intended
//!   range (0, 1).
//! - **β (smoothing)**: low β favours clusters that already use the
//!   document's words; high β favours size.
//!
//! # Failure Modes
//!
//! - **K too small**: every slot fills and distinct topics get merged.
//! - **Large β**: vocabulary overlap stops mattering; few, large clusters.
//! - **Local optima**: a single chain can settle early; try several seeds.

use super::scoring::{exp_normalize, sample_categorical, Scorer};
use super::state::ClusterState;
use super::traits::Clustering;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use rand::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for one fit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    /// Upper bound on the number of clusters (K).
    pub max_clusters: usize,
    /// Concentration parameter (α).
    pub concentration: f64,
    /// Smoothing parameter (β).
    pub smoothing: f64,
    /// Upper bound on Gibbs sweeps.
    pub max_sweeps: usize,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            max_clusters: 100,
            concentration: 0.1,
            smoothing: 0.1,
            max_sweeps: 50,
        }
    }
}

impl Hyperparameters {
    /// Reject values the sampler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_clusters == 0 {
            return Err(Error::InvalidParameter {
                name: "max_clusters",
                message: "must be > 0",
            });
        }
        if self.max_sweeps == 0 {
            return Err(Error::InvalidParameter {
                name: "max_sweeps",
                message: "must be > 0",
            });
        }
        if !self.smoothing.is_finite() || self.smoothing <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "smoothing",
                message: "must be finite and > 0",
            });
        }
        if !self.concentration.is_finite() || self.concentration <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "concentration",
                message: "must be finite and > 0",
            });
        }
        if self.concentration >= 1.0 {
            tracing::warn!(
                concentration = self.concentration,
                "concentration outside its intended range (0, 1)"
            );
        }
        Ok(())
    }
}

/// How a fit ended.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    /// Two consecutive sweeps changed no assignment.
    Converged,
    /// `max_sweeps` ran out first.
    ExhaustedIterations,
}

/// Result of [`Dmm::fit`].
#[derive(Debug, Clone)]
pub struct DmmFit {
    /// Cluster position of each document, in corpus order.
    pub labels: Vec<usize>,
    /// Final cluster statistics. Positions match `labels`.
    pub state: ClusterState,
    /// Why sampling stopped.
    pub status: FitStatus,
    /// Number of sweeps run.
    pub sweeps: usize,
    /// Documents that changed cluster, per sweep.
    pub changes: Vec<usize>,
    /// Most active clusters seen at any point within each sweep.
    pub peak_active: Vec<usize>,
}

impl DmmFit {
    /// Number of non-empty clusters at the end.
    pub fn n_clusters(&self) -> usize {
        self.state.n_active()
    }

    /// True if sampling stopped on the convergence rule.
    pub fn converged(&self) -> bool {
        self.status == FitStatus::Converged
    }
}

/// Gibbs sampler for the Dirichlet Multinomial Mixture.
#[derive(Debug, Clone, Default)]
pub struct Dmm {
    params: Hyperparameters,
    /// Random seed.
    seed: Option<u64>,
}

impl Dmm {
    /// Sampler with default hyperparameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampler with the given hyperparameters.
    pub fn from_params(params: Hyperparameters) -> Self {
        Self { params, seed: None }
    }

    /// Set the maximum number of clusters.
    pub fn with_max_clusters(mut self, k: usize) -> Self {
        self.params.max_clusters = k;
        self
    }

    /// Set the concentration parameter (α).
    pub fn with_concentration(mut self, alpha: f64) -> Self {
        self.params.concentration = alpha;
        self
    }

    /// Set the smoothing parameter (β).
    pub fn with_smoothing(mut self, beta: f64) -> Self {
        self.params.smoothing = beta;
        self
    }

    /// Set the maximum number of sweeps.
    pub fn with_max_sweeps(mut self, n: usize) -> Self {
        self.params.max_sweeps = n;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The configured hyperparameters.
    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }

    /// Fit using the configured seed, or the thread RNG if none is set.
    pub fn fit(&self, corpus: &Corpus) -> Result<DmmFit> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.fit_with_rng(corpus, &mut rng)
    }

    /// Fit drawing every random number from `rng`.
    ///
    /// The same corpus, hyperparameters and RNG state give the same
    /// trajectory.
    pub fn fit_with_rng<R: Rng>(&self, corpus: &Corpus, rng: &mut R) -> Result<DmmFit> {
        self.params.validate()?;
        corpus.validate()?;

        let scorer = Scorer::new(&self.params, corpus.vocab_size());
        tracing::debug!(
            docs = corpus.len(),
            vocab = corpus.vocab_size(),
            max_clusters = self.params.max_clusters,
            alpha = self.params.concentration,
            beta = self.params.smoothing,
            max_sweeps = self.params.max_sweeps,
            "starting gibbs sampling"
        );

        let mut state = ClusterState::new(corpus.len(), self.params.max_clusters);
        self.initialize(corpus, &mut state, rng)?;
        tracing::debug!(active = state.n_active(), "initialized assignments");

        let mut status = FitStatus::ExhaustedIterations;
        let mut changes = Vec::with_capacity(self.params.max_sweeps);
        let mut peak_active = Vec::with_capacity(self.params.max_sweeps);
        let mut previous: Option<usize> = None;

        for sweep in 1..=self.params.max_sweeps {
            let (changed, peak) = self.sweep(corpus, &mut state, &scorer, rng)?;
            changes.push(changed);
            peak_active.push(peak);
            tracing::debug!(sweep, changed, peak, active = state.n_active(), "sweep complete");

            if changed == 0 && previous == Some(0) {
                status = FitStatus::Converged;
                break;
            }
            previous = Some(changed);
        }

        let sweeps = changes.len();
        match status {
            FitStatus::Converged => tracing::info!(
                sweeps,
                clusters = state.n_active(),
                "assignments stable for two sweeps, stopping"
            ),
            FitStatus::ExhaustedIterations => tracing::warn!(
                sweeps,
                clusters = state.n_active(),
                "sweep budget exhausted before convergence"
            ),
        }

        Ok(DmmFit {
            labels: state.labels().to_vec(),
            state,
            status,
            sweeps,
            changes,
            peak_active,
        })
    }

    /// Uniform draw over `0..K`, with draws past the active range opening
    /// the next unused slot.
    fn initialize<R: Rng>(
        &self,
        corpus: &Corpus,
        state: &mut ClusterState,
        rng: &mut R,
    ) -> Result<()> {
        for (d, doc) in corpus.iter().enumerate() {
            let z = rng
                .random_range(0..self.params.max_clusters)
                .min(state.n_active());
            state.add(z, d, doc)?;
        }
        Ok(())
    }

    /// One pass over the corpus in order. Returns the number of documents
    /// whose label changed and the most active clusters seen after any move.
    fn sweep<R: Rng>(
        &self,
        corpus: &Corpus,
        state: &mut ClusterState,
        scorer: &Scorer,
        rng: &mut R,
    ) -> Result<(usize, usize)> {
        let mut changed = 0;
        let mut peak = state.n_active();
        for (d, doc) in corpus.iter().enumerate() {
            let z = state
                .label(d)
                .ok_or_else(|| Error::Other(format!("no label for document {d}")))?;
            state.remove(z, doc)?;

            let weights = exp_normalize(&scorer.log_weights(state, doc))?;
            let z_new = sample_categorical(&weights, rng)?;

            state.add(z_new, d, doc)?;
            peak = peak.max(state.n_active());
            if z_new != z {
                changed += 1;
            }
        }
        Ok((changed, peak))
    }
}

impl Clustering for Dmm {
    fn fit_predict(&self, corpus: &Corpus) -> Result<Vec<usize>> {
        Ok(self.fit(corpus)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.params.max_clusters
    }
}
