//! # gsdmm
//!
//! Short-text clustering with a Dirichlet Multinomial Mixture, fitted by
//! collapsed Gibbs sampling.
//!
//! The number of clusters is bounded above by a configured maximum; the
//! effective count comes out of the data as clusters empty and disappear
//! during sampling.
//!
//! **Default build** is the sampler and the evaluation metric. Corpus file
//! readers are behind the `io` feature and the command line tool behind `cli`.

pub mod cluster;
pub mod corpus;
/// Error types used across `gsdmm`.
pub mod error;
pub mod metrics;

pub use cluster::{
    ClusterAggregate, ClusterState, Clustering, Dmm, DmmFit, FitStatus, Hyperparameters,
};
pub use corpus::{Corpus, Document};
pub use error::{Error, Result};
pub use metrics::ari;

#[cfg(feature = "io")]
pub use corpus::io::{load_corpus, CorpusFormat, Vocabulary};
