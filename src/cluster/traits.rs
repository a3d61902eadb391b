//! Clustering traits.

use crate::corpus::Corpus;
use crate::error::Result;

/// Trait for hard clustering of a document corpus.
pub trait Clustering {
    /// Fit the model to the corpus and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per document.
    fn fit_predict(&self, corpus: &Corpus) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    ///
    /// For models that discover the count from the data this is the
    /// configured upper bound.
    fn n_clusters(&self) -> usize;
}
