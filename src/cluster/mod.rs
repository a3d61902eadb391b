//! Clustering of sparse documents with a Dirichlet Multinomial Mixture.
//!
//! Short texts (tweets, titles, questions) rarely share more than a word or
//! two, which starves vector-space methods. The Dirichlet Multinomial
//! Mixture instead assumes each document comes from a single topic and
//! samples that topic directly from word counts.
//!
//! ## Pieces
//!
//! | Module | Role |
//! |--------|------|
//! | [`state`] | Cluster aggregates and the label array, with compaction |
//! | [`scoring`] | Log-space predictive scores, exp-normalization, categorical draw |
//! | [`dmm`] | Hyperparameters and the Gibbs sweep loop |
//!
//! ## Cluster Identity
//!
//! Clusters are positions in a dense vector. When one empties, the last
//! cluster moves into its slot. Labels are therefore only meaningful
//! within a single [`ClusterState`]; compare two fits with a
//! permutation-invariant metric such as [`crate::metrics::ari`].
//!
//! ## Usage
//!
//! ```rust
//! use gsdmm::cluster::Dmm;
//! use gsdmm::corpus::{Corpus, Document};
//!
//! let corpus = Corpus::new(vec![
//!     Document::from_token_ids([0, 1, 2]),
//!     Document::from_token_ids([0, 1, 1]),
//!     Document::from_token_ids([7, 8, 9]),
//!     Document::from_token_ids([8, 9, 9]),
//! ]);
//!
//! let fit = Dmm::new()
//!     .with_max_clusters(10)
//!     .with_smoothing(0.05)
//!     .with_seed(42)
//!     .fit(&corpus)
//!     .unwrap();
//!
//! assert_eq!(fit.labels.len(), 4);
//! assert!(fit.n_clusters() <= 10);
//! ```

pub mod dmm;
pub mod scoring;
pub mod state;
mod traits;

pub use dmm::{Dmm, DmmFit, FitStatus, Hyperparameters};
pub use scoring::{exp_normalize, sample_categorical, Scorer};
pub use state::{ClusterAggregate, ClusterState, UNASSIGNED};
pub use traits::Clustering;
