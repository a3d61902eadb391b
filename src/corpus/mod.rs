//! Sparse bag-of-words documents and the corpus they live in.
//!
//! A [`Document`] is an immutable list of `(token id, count)` pairs with a
//! cached token total. A [`Corpus`] owns its documents and derives the
//! vocabulary size once, over every document, at construction time. The
//! sampler borrows the corpus for the whole fit; nothing is copied.
//!
//! Token pairs are kept in a fixed order. Scores are sums of logarithms
//! taken in that order, so a stable order is what makes a seeded fit
//! reproducible bit-for-bit.

#[cfg(feature = "io")]
pub mod io;

use crate::error::{Error, Result};
use crate::metrics::ari;
use std::collections::{BTreeMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One input record as a sparse vector of token counts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// `(token id, count)` pairs; ids are unique.
    tokens: Vec<(usize, usize)>,
    /// Sum of the counts.
    n_tokens: usize,
    /// Ground-truth label, only used for evaluation.
    #[cfg_attr(feature = "serde", serde(default))]
    label: Option<usize>,
}

impl Document {
    /// Build a document from `(token id, count)` pairs.
    ///
    /// The total is computed from the counts. Repeated token ids are
    /// rejected rather than merged.
    pub fn new(tokens: Vec<(usize, usize)>) -> Result<Self> {
        let n_tokens = tokens.iter().map(|&(_, c)| c).sum();
        let doc = Self {
            tokens,
            n_tokens,
            label: None,
        };
        doc.check(0)?;
        Ok(doc)
    }

    /// Build a document whose token total was declared by the source.
    ///
    /// Fails with [`Error::InvalidDocument`] when `declared` is not the
    /// sum of the counts.
    pub fn with_total(tokens: Vec<(usize, usize)>, declared: usize) -> Result<Self> {
        let doc = Self {
            tokens,
            n_tokens: declared,
            label: None,
        };
        doc.check(0)?;
        Ok(doc)
    }

    /// Count a stream of token ids. Pairs come out ordered by id.
    pub fn from_token_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for id in ids {
            *counts.entry(id).or_insert(0) += 1;
        }
        let tokens: Vec<(usize, usize)> = counts.into_iter().collect();
        let n_tokens = tokens.iter().map(|&(_, c)| c).sum();
        Self {
            tokens,
            n_tokens,
            label: None,
        }
    }

    /// Attach a ground-truth label.
    pub fn with_label(mut self, label: usize) -> Self {
        self.label = Some(label);
        self
    }

    /// The `(token id, count)` pairs.
    pub fn tokens(&self) -> &[(usize, usize)] {
        &self.tokens
    }

    /// Total number of tokens (sum of counts).
    pub fn n_tokens(&self) -> usize {
        self.n_tokens
    }

    /// Number of distinct tokens.
    pub fn n_unique(&self) -> usize {
        self.tokens.len()
    }

    /// Ground-truth label, if any.
    pub fn label(&self) -> Option<usize> {
        self.label
    }

    /// True when the document has no tokens.
    pub fn is_empty(&self) -> bool {
        self.n_tokens == 0
    }

    /// Check the document invariants, reporting errors against `index`.
    pub(crate) fn check(&self, index: usize) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.tokens.len());
        let mut actual = 0usize;
        for &(token, count) in &self.tokens {
            if !seen.insert(token) {
                return Err(Error::DuplicateToken { index, token });
            }
            actual += count;
        }
        if actual != self.n_tokens {
            return Err(Error::InvalidDocument {
                index,
                declared: self.n_tokens,
                actual,
            });
        }
        Ok(())
    }
}

/// A collection of documents plus the derived vocabulary size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    docs: Vec<Document>,
    vocab_size: usize,
}

impl Corpus {
    /// Wrap documents, computing the vocabulary size over all of them.
    pub fn new(docs: Vec<Document>) -> Self {
        let vocab: HashSet<usize> = docs
            .iter()
            .flat_map(|d| d.tokens.iter().map(|&(t, _)| t))
            .collect();
        Self {
            vocab_size: vocab.len(),
            docs,
        }
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when there are no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of distinct token ids across the corpus.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// All documents in corpus order.
    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    /// Document at `index`.
    pub fn get(&self, index: usize) -> Option<&Document> {
        self.docs.get(index)
    }

    /// Iterate over documents in corpus order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.docs.iter()
    }

    /// Check every document, failing on the first one that breaks an invariant.
    pub fn validate(&self) -> Result<()> {
        if self.docs.is_empty() {
            return Err(Error::EmptyInput);
        }
        for (i, doc) in self.docs.iter().enumerate() {
            doc.check(i)?;
        }
        Ok(())
    }

    /// Ground-truth labels, if every document carries one.
    pub fn labels(&self) -> Option<Vec<usize>> {
        self.docs.iter().map(|d| d.label).collect()
    }

    /// Adjusted Rand index of `predicted` against the corpus ground truth.
    pub fn adjusted_rand_index(&self, predicted: &[usize]) -> Result<f64> {
        let truth = self
            .labels()
            .ok_or_else(|| Error::Other("corpus has no ground-truth labels".to_string()))?;
        ari(&truth, predicted)
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}
