//! Label vocabulary built from a manifest.
//!
//! The vocabulary is the ordered set of every label token appearing in any
//! label column, in order of first appearance. That order defines the index
//! of each token in multi-hot vectors and in classifier outputs, so it is
//! frozen once built: there are no mutating methods, and downstream stages
//! share it behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;

use ndarray::Array1;

use crate::error::PipelineError;
use crate::manifest::{LabelColumns, Manifest, ManifestRow};

/// An ordered, duplicate-free list of label tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    by_token: HashMap<String, usize>,
}

impl Vocabulary {
    /// Scan rows once, recording each non-empty label token the first time it appears.
    pub fn from_rows<'a>(
        rows: impl IntoIterator<Item = &'a ManifestRow>,
        columns: &LabelColumns,
    ) -> Self {
        Self::from_tokens(rows.into_iter().flat_map(|row| columns.tokens(row)))
    }

    /// Read a manifest and build its vocabulary.
    pub fn from_manifest(path: &Path, columns: &LabelColumns) -> Result<Self, PipelineError> {
        let manifest = Manifest::read(path)?;
        let vocab = Self::from_rows(manifest.rows(), columns);

        if vocab.is_empty() {
            tracing::warn!(
                "Manifest {:?} has no label tokens; label vectors will be empty",
                path
            );
        } else {
            tracing::info!(
                "Built vocabulary: {} labels from {} rows",
                vocab.len(),
                manifest.len()
            );
        }
        Ok(vocab)
    }

    /// Build a vocabulary from tokens in the given order, dropping duplicates and empties.
    pub fn from_tokens<S: AsRef<str>>(tokens: impl IntoIterator<Item = S>) -> Self {
        let mut vocab = Self {
            tokens: Vec::new(),
            by_token: HashMap::new(),
        };
        for token in tokens {
            vocab.record(token.as_ref());
        }
        vocab
    }

    /// Only called while building; a built vocabulary is never extended.
    fn record(&mut self, token: &str) {
        if !token.is_empty() && !self.by_token.contains_key(token) {
            self.by_token.insert(token.to_string(), self.tokens.len());
            self.tokens.push(token.to_string());
        }
    }

    /// All tokens in index order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Token at an index.
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Index of a token.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.by_token.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Multi-hot encode a token set. Tokens not in the vocabulary are dropped.
    pub fn encode<'a>(&self, tokens: impl IntoIterator<Item = &'a str>) -> Array1<f32> {
        let mut vector = Array1::<f32>::zeros(self.len());
        for token in tokens {
            match self.index_of(token) {
                Some(i) => vector[i] = 1.0,
                None => tracing::trace!("Dropping unknown label token {:?}", token),
            }
        }
        vector
    }

    /// Tokens whose position is set in a multi-hot vector, in index order.
    pub fn decode(&self, vector: &[f32]) -> Vec<&str> {
        vector
            .iter()
            .zip(self.tokens.iter())
            .filter(|(v, _)| **v == 1.0)
            .map(|(_, t)| t.as_str())
            .collect()
    }

    /// Compute a BLAKE3 hash of all tokens in order, each prefixed with its
    /// byte length.
    ///
    /// Saved alongside trained models so an evaluation run can detect that
    /// its rebuilt vocabulary no longer lines up with the model's outputs.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for token in &self.tokens {
            hasher.update(&(token.len() as u64).to_le_bytes());
            hasher.update(token.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}
