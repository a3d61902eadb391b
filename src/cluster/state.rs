//! Mutable sufficient statistics for the Gibbs sampler.
//!
//! Active clusters live in a dense `Vec`: a cluster *is* its position.
//! When a cluster empties, the last cluster is moved into the hole and the
//! labels that pointed at the old last position are rewritten. The vector
//! stays gap-free at the cost of cluster identity, which is not stable
//! across removals.

use crate::corpus::Document;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Label of a document that has not been assigned yet.
pub const UNASSIGNED: usize = usize::MAX;

/// Aggregate token and document counts for one active cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterAggregate {
    /// Token id -> count over all member documents. Zero entries are dropped.
    token_counts: HashMap<usize, usize>,
    /// Number of member documents.
    n_docs: usize,
    /// Sum of `token_counts`.
    n_tokens: usize,
}

impl ClusterAggregate {
    /// Empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of member documents.
    pub fn n_docs(&self) -> usize {
        self.n_docs
    }

    /// Total tokens over all member documents.
    pub fn n_tokens(&self) -> usize {
        self.n_tokens
    }

    /// Aggregate count of `token`, zero if absent.
    #[inline]
    pub fn token_count(&self, token: usize) -> usize {
        self.token_counts.get(&token).copied().unwrap_or(0)
    }

    /// The sparse token-count map.
    pub fn token_counts(&self) -> &HashMap<usize, usize> {
        &self.token_counts
    }

    fn insert(&mut self, doc: &Document) {
        for &(token, count) in doc.tokens() {
            if count == 0 {
                continue;
            }
            *self.token_counts.entry(token).or_insert(0) += count;
            self.n_tokens += count;
        }
        self.n_docs += 1;
    }

    /// True if `doc` could be a member: at least one document, and every
    /// token of `doc` present with at least its count.
    fn holds(&self, doc: &Document) -> bool {
        self.n_docs > 0
            && doc
                .tokens()
                .iter()
                .all(|&(token, count)| self.token_count(token) >= count)
    }

    /// Subtract `doc`. Callers check [`Self::holds`] first.
    fn remove(&mut self, doc: &Document) {
        for &(token, count) in doc.tokens() {
            if count == 0 {
                continue;
            }
            if let Some(c) = self.token_counts.get_mut(&token) {
                *c -= count;
                if *c == 0 {
                    self.token_counts.remove(&token);
                }
            }
            self.n_tokens -= count;
        }
        self.n_docs -= 1;
    }
}

/// Dense set of non-empty clusters plus the document labels that index it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterState {
    clusters: Vec<ClusterAggregate>,
    labels: Vec<usize>,
    max_clusters: usize,
}

impl ClusterState {
    /// Fresh state for `n_docs` documents, all [`UNASSIGNED`].
    pub fn new(n_docs: usize, max_clusters: usize) -> Self {
        Self {
            clusters: Vec::with_capacity(max_clusters.min(n_docs)),
            labels: vec![UNASSIGNED; n_docs],
            max_clusters,
        }
    }

    /// Number of active (non-empty) clusters.
    pub fn n_active(&self) -> usize {
        self.clusters.len()
    }

    /// Upper bound on active clusters.
    pub fn max_clusters(&self) -> usize {
        self.max_clusters
    }

    /// True when no fresh cluster may be opened.
    pub fn is_full(&self) -> bool {
        self.clusters.len() >= self.max_clusters
    }

    /// Active clusters in position order.
    pub fn clusters(&self) -> &[ClusterAggregate] {
        &self.clusters
    }

    /// Cluster at `index`.
    pub fn cluster(&self, index: usize) -> Option<&ClusterAggregate> {
        self.clusters.get(index)
    }

    /// Document labels (cluster positions).
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Label of one document, `None` if the index is out of range.
    pub fn label(&self, doc_index: usize) -> Option<usize> {
        self.labels.get(doc_index).copied()
    }

    /// Consume the state, keeping only the labels.
    pub fn into_labels(self) -> Vec<usize> {
        self.labels
    }

    /// Add `doc` to cluster `cluster_index` and label it.
    ///
    /// `cluster_index == n_active()` opens a new cluster at the end. Any
    /// larger index, or opening past `max_clusters`, is an error.
    pub fn add(&mut self, cluster_index: usize, doc_index: usize, doc: &Document) -> Result<()> {
        if doc_index >= self.labels.len() {
            return Err(Error::Other(format!(
                "document index {doc_index} out of range for {} documents",
                self.labels.len()
            )));
        }
        let active = self.clusters.len();
        if cluster_index > active {
            return Err(Error::InvalidClusterIndex {
                index: cluster_index,
                active,
            });
        }
        if cluster_index == active {
            if self.is_full() {
                return Err(Error::ClusterCapacity {
                    max: self.max_clusters,
                });
            }
            self.clusters.push(ClusterAggregate::new());
        }
        self.clusters[cluster_index].insert(doc);
        self.labels[doc_index] = cluster_index;
        Ok(())
    }

    /// Take `doc` out of cluster `cluster_index`.
    ///
    /// The document's own label is left alone; the caller overwrites it
    /// with the next `add`. If the cluster empties it is compacted away.
    ///
    /// Fails with [`Error::NotInCluster`], leaving the cluster untouched,
    /// when its counts cannot contain `doc`.
    pub fn remove(&mut self, cluster_index: usize, doc: &Document) -> Result<()> {
        let active = self.clusters.len();
        let cluster = self
            .clusters
            .get_mut(cluster_index)
            .ok_or(Error::InvalidClusterIndex {
                index: cluster_index,
                active,
            })?;
        if !cluster.holds(doc) {
            return Err(Error::NotInCluster {
                cluster: cluster_index,
            });
        }
        cluster.remove(doc);
        if cluster.n_docs == 0 {
            self.compact(cluster_index);
        }
        Ok(())
    }

    /// Move the last cluster into `emptied` and relabel its documents.
    fn compact(&mut self, emptied: usize) {
        let last = self.clusters.len() - 1;
        self.clusters.swap_remove(emptied);
        if emptied != last {
            for label in self.labels.iter_mut().filter(|l| **l == last) {
                *label = emptied;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d1() -> Document {
        Document::new(vec![(0, 1), (1, 2), (2, 1)]).unwrap()
    }

    fn d2() -> Document {
        Document::new(vec![(1, 3), (2, 2), (3, 1)]).unwrap()
    }

    fn assert_consistent(c: &ClusterAggregate) {
        assert_eq!(c.n_tokens(), c.token_counts().values().sum::<usize>());
        assert!(c.token_counts().values().all(|&v| v > 0));
    }

    #[test]
    fn test_add_single_document() {
        let mut state = ClusterState::new(2, 5);
        let doc = d1();
        state.add(0, 0, &doc).unwrap();

        let c = state.cluster(0).unwrap();
        assert_eq!(c.n_docs(), 1);
        assert_eq!(c.n_tokens(), doc.n_tokens());
        for &(t, n) in doc.tokens() {
            assert_eq!(c.token_count(t), n);
        }
        assert_eq!(state.labels(), &[0, UNASSIGNED]);
    }

    #[test]
    fn test_add_two_then_remove_one() {
        let mut state = ClusterState::new(2, 5);
        let (a, b) = (d1(), d2());
        state.add(0, 0, &a).unwrap();
        state.add(0, 1, &b).unwrap();

        let c = state.cluster(0).unwrap();
        assert_eq!(c.n_docs(), 2);
        assert_eq!(c.n_tokens(), a.n_tokens() + b.n_tokens());
        assert_eq!(c.token_count(1), 5);

        state.remove(0, &b).unwrap();
        let c = state.cluster(0).unwrap();
        assert_eq!(c.n_docs(), 1);
        assert_eq!(c.n_tokens(), a.n_tokens());
        for &(t, n) in a.tokens() {
            assert_eq!(c.token_count(t), n);
        }
        assert_eq!(c.token_count(3), 0);
        assert_consistent(c);
    }

    #[test]
    fn test_add_cannot_skip_slots() {
        let mut state = ClusterState::new(1, 5);
        assert_eq!(
            state.add(1, 0, &d1()),
            Err(Error::InvalidClusterIndex {
                index: 1,
                active: 0
            })
        );
    }

    #[test]
    fn test_add_respects_capacity() {
        let mut state = ClusterState::new(2, 1);
        state.add(0, 0, &d1()).unwrap();
        assert!(state.is_full());
        assert_eq!(
            state.add(1, 1, &d2()),
            Err(Error::ClusterCapacity { max: 1 })
        );
    }

    #[test]
    fn test_remove_last_member_compacts_interior_slot() {
        // Clusters: 0 = {doc0}, 1 = {doc1}, 2 = {doc2, doc3}
        let docs = [d1(), d2(), d1(), d2()];
        let mut state = ClusterState::new(4, 5);
        state.add(0, 0, &docs[0]).unwrap();
        state.add(1, 1, &docs[1]).unwrap();
        state.add(2, 2, &docs[2]).unwrap();
        state.add(2, 3, &docs[3]).unwrap();

        state.remove(1, &docs[1]).unwrap();

        assert_eq!(state.n_active(), 2);
        // Former last cluster now sits in slot 1.
        assert_eq!(state.cluster(1).unwrap().n_docs(), 2);
        assert_eq!(state.label(2), Some(1));
        assert_eq!(state.label(3), Some(1));
        assert_eq!(state.label(0), Some(0));
        // The removed document keeps its stale label until re-added.
        assert_eq!(state.label(1), Some(1));
    }

    #[test]
    fn test_remove_last_member_of_last_cluster() {
        let docs = [d1(), d2()];
        let mut state = ClusterState::new(2, 5);
        state.add(0, 0, &docs[0]).unwrap();
        state.add(1, 1, &docs[1]).unwrap();

        state.remove(1, &docs[1]).unwrap();
        assert_eq!(state.n_active(), 1);
        assert_eq!(state.label(0), Some(0));

        // Re-adding at the freed slot reopens it.
        state.add(1, 1, &docs[1]).unwrap();
        assert_eq!(state.n_active(), 2);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut state = ClusterState::new(1, 5);
        assert!(state.remove(0, &d1()).is_err());
    }

    #[test]
    fn test_remove_foreign_document_leaves_cluster_untouched() {
        let mut state = ClusterState::new(2, 5);
        let a = Document::new(vec![(0, 2)]).unwrap();
        let b = Document::new(vec![(0, 1)]).unwrap();
        state.add(0, 0, &a).unwrap();
        state.add(0, 1, &b).unwrap();
        let before = state.clone();

        let foreign = Document::new(vec![(5, 1)]).unwrap();
        assert_eq!(
            state.remove(0, &foreign),
            Err(Error::NotInCluster { cluster: 0 })
        );
        // More of a known token than the cluster holds.
        let greedy = Document::new(vec![(0, 4)]).unwrap();
        assert_eq!(
            state.remove(0, &greedy),
            Err(Error::NotInCluster { cluster: 0 })
        );

        assert_eq!(state, before);
        let c = state.cluster(0).unwrap();
        assert_eq!(c.n_tokens(), 3);
        assert_eq!(c.n_docs(), 2);
        assert_consistent(c);
    }

    #[test]
    fn test_label_out_of_range() {
        let state = ClusterState::new(2, 5);
        assert_eq!(state.label(0), Some(UNASSIGNED));
        assert_eq!(state.label(2), None);
    }

    fn doc_strategy() -> impl Strategy<Value = Document> {
        proptest::collection::vec(0usize..12, 0..8).prop_map(Document::from_token_ids)
    }

    proptest! {
        #[test]
        fn moves_preserve_invariants(
            docs in proptest::collection::vec(doc_strategy(), 1..20),
            max_clusters in 1usize..6,
            moves in proptest::collection::vec((any::<usize>(), any::<usize>()), 0..60),
        ) {
            let mut state = ClusterState::new(docs.len(), max_clusters);
            for (i, doc) in docs.iter().enumerate() {
                let z = (i % max_clusters).min(state.n_active());
                state.add(z, i, doc).unwrap();
            }

            for (pick, target) in moves {
                let d = pick % docs.len();
                state.remove(state.labels()[d], &docs[d]).unwrap();

                let slots = if state.is_full() { state.n_active() } else { state.n_active() + 1 };
                state.add(target % slots, d, &docs[d]).unwrap();

                prop_assert!(state.n_active() <= max_clusters);
                prop_assert!(state.labels().iter().all(|&l| l < state.n_active()));

                let mut expected = vec![ClusterAggregate::new(); state.n_active()];
                for (i, doc) in docs.iter().enumerate() {
                    expected[state.labels()[i]].insert(doc);
                }
                for (c, e) in state.clusters().iter().zip(&expected) {
                    prop_assert!(c.n_docs() > 0);
                    prop_assert_eq!(c.n_tokens(), c.token_counts().values().sum::<usize>());
                    prop_assert_eq!(c, e);
                }
            }
        }
    }
}
