//! Corpus readers.
//!
//! Three line-oriented formats are understood:
//!
//! | Format | Line shape | Labels |
//! |--------|------------|--------|
//! | [`CorpusFormat::Ldac`] | `N id:count id:count ...` | no |
//! | [`CorpusFormat::Jsonl`] | `{"text": "...", "cluster": 3}` | optional |
//! | [`CorpusFormat::Text`] | whitespace-separated tokens | no |
//!
//! LDA-C lines carry token ids directly. JSONL and text lines are
//! tokenized on whitespace and mapped to ids through a [`Vocabulary`]
//! that grows in first-seen order.

use super::{Corpus, Document};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// On-disk corpus formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    /// Blei's LDA-C sparse count format.
    Ldac,
    /// One JSON object per line with `text` and optional `cluster`.
    Jsonl,
    /// One plain-text document per line.
    Text,
}

impl CorpusFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "dat" | "ldac" => Some(Self::Ldac),
            "jsonl" => Some(Self::Jsonl),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

impl FromStr for CorpusFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ldac" | "dat" => Ok(Self::Ldac),
            "jsonl" => Ok(Self::Jsonl),
            "txt" | "text" => Ok(Self::Text),
            other => Err(Error::Other(format!("unknown corpus format '{other}'"))),
        }
    }
}

/// Token string to dense id mapping.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    ids: HashMap<String, usize>,
    tokens: Vec<String>,
}

impl Vocabulary {
    /// Empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `token`, assigning the next free id if unseen.
    pub fn intern(&mut self, token: &str) -> usize {
        if let Some(&id) = self.ids.get(token) {
            return id;
        }
        let id = self.tokens.len();
        self.ids.insert(token.to_string(), id);
        self.tokens.push(token.to_string());
        id
    }

    /// Id for `token` without inserting.
    pub fn id(&self, token: &str) -> Option<usize> {
        self.ids.get(token).copied()
    }

    /// Token string for `id`.
    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Deserialize)]
struct RawDoc {
    text: String,
    #[serde(default)]
    cluster: Option<usize>,
}

fn parse_int(field: &str, line: usize, what: &str) -> Result<usize> {
    field.parse().map_err(|e| Error::Parse {
        line,
        message: format!("bad {what} '{field}': {e}"),
    })
}

/// Read an LDA-C corpus.
///
/// Each line starts with the number of `id:count` pairs that follow.
pub fn read_ldac<R: BufRead>(reader: R) -> Result<Corpus> {
    let mut docs = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let mut fields = line.split_whitespace();
        let Some(head) = fields.next() else {
            continue;
        };
        let n_pairs = parse_int(head, lineno, "pair count")?;

        let mut tokens = Vec::with_capacity(n_pairs);
        for field in fields {
            let (id, count) = field.split_once(':').ok_or_else(|| Error::Parse {
                line: lineno,
                message: format!("expected id:count, got '{field}'"),
            })?;
            tokens.push((
                parse_int(id, lineno, "token id")?,
                parse_int(count, lineno, "token count")?,
            ));
        }
        if tokens.len() != n_pairs {
            return Err(Error::Parse {
                line: lineno,
                message: format!("declared {n_pairs} pairs, found {}", tokens.len()),
            });
        }

        let doc = Document::new(tokens).map_err(|e| Error::Parse {
            line: lineno,
            message: e.to_string(),
        })?;
        docs.push(doc);
    }
    Ok(Corpus::new(docs))
}

/// Read a JSONL corpus, returning the vocabulary built along the way.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<(Corpus, Vocabulary)> {
    let mut vocab = Vocabulary::new();
    let mut docs = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawDoc = serde_json::from_str(&line).map_err(|e| Error::Parse {
            line: i + 1,
            message: e.to_string(),
        })?;
        let ids: Vec<usize> = raw
            .text
            .split_whitespace()
            .map(|t| vocab.intern(t))
            .collect();
        let mut doc = Document::from_token_ids(ids);
        if let Some(label) = raw.cluster {
            doc = doc.with_label(label);
        }
        docs.push(doc);
    }
    Ok((Corpus::new(docs), vocab))
}

/// Read a plain-text corpus, one document per line.
///
/// Blank lines become empty documents so line numbers and document
/// indices stay aligned.
pub fn read_text<R: BufRead>(reader: R) -> Result<(Corpus, Vocabulary)> {
    let mut vocab = Vocabulary::new();
    let mut docs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let ids: Vec<usize> = line.split_whitespace().map(|t| vocab.intern(t)).collect();
        docs.push(Document::from_token_ids(ids));
    }
    Ok((Corpus::new(docs), vocab))
}

/// Open and read a corpus file.
///
/// When `format` is `None` it is inferred from the extension. The
/// vocabulary is `None` for LDA-C input, which carries ids directly.
pub fn load_corpus(
    path: impl AsRef<Path>,
    format: Option<CorpusFormat>,
) -> Result<(Corpus, Option<Vocabulary>)> {
    let path = path.as_ref();
    let format = match format {
        Some(f) => f,
        None => {
            tracing::debug!(path = %path.display(), "inferring corpus format from extension");
            CorpusFormat::from_path(path).ok_or_else(|| {
                Error::Other(format!(
                    "cannot infer corpus format from path: {}",
                    path.display()
                ))
            })?
        }
    };
    let reader = BufReader::new(File::open(path)?);
    let (corpus, vocab) = match format {
        CorpusFormat::Ldac => (read_ldac(reader)?, None),
        CorpusFormat::Jsonl => {
            let (c, v) = read_jsonl(reader)?;
            (c, Some(v))
        }
        CorpusFormat::Text => {
            let (c, v) = read_text(reader)?;
            (c, Some(v))
        }
    };
    tracing::debug!(
        docs = corpus.len(),
        vocab = corpus.vocab_size(),
        ?format,
        "loaded corpus"
    );
    Ok((corpus, vocab))
}
