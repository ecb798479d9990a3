//! Per-row encoding: one manifest row to one (image tensor, label vector) pair.

use std::path::PathBuf;
use std::sync::Arc;

use ndarray::{Array1, Array3};

use crate::error::PipelineError;
use crate::manifest::{LabelColumns, ManifestRow};
use crate::vocabulary::Vocabulary;

use super::decode::ImageDecoder;
use super::resolve::ImageResolver;

/// A fully encoded manifest row.
#[derive(Debug, Clone)]
pub struct EncodedRow {
    /// Row identifier from the manifest
    pub name: String,
    /// Image file the tensor was loaded from
    pub source: PathBuf,
    /// `[height, width, channels]` in `[0, 1]`
    pub image: Array3<f32>,
    /// Multi-hot vector over the vocabulary
    pub label: Array1<f32>,
}

/// Encodes manifest rows against a frozen vocabulary.
pub struct RowEncoder {
    vocab: Arc<Vocabulary>,
    columns: LabelColumns,
    resolver: ImageResolver,
    decoder: ImageDecoder,
}

impl RowEncoder {
    pub fn new(
        vocab: Arc<Vocabulary>,
        columns: LabelColumns,
        resolver: ImageResolver,
        decoder: ImageDecoder,
    ) -> Self {
        Self {
            vocab,
            columns,
            resolver,
            decoder,
        }
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    pub fn decoder(&self) -> &ImageDecoder {
        &self.decoder
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    /// Resolve, load and label one row. Any failure aborts the row.
    ///
    /// `index` is the row's 0-based position in the manifest.
    pub async fn encode(
        &self,
        index: usize,
        row: &ManifestRow,
    ) -> Result<EncodedRow, PipelineError> {
        let name = self
            .columns
            .identifier(row)
            .ok_or_else(|| PipelineError::MissingIdentifier {
                row: index + 1,
                column: self.columns.id_column().to_string(),
            })?
            .to_string();

        let source = self.resolver.resolve(&name).await?;
        let image = self.decoder.load(&source).await?;
        let label = self.encode_labels(&name, row)?;

        tracing::trace!("Encoded {} from {:?}", name, source);
        Ok(EncodedRow {
            name,
            source,
            image,
            label,
        })
    }

    /// Multi-hot encode a row's label columns.
    pub fn encode_labels(&self, name: &str, row: &ManifestRow) -> Result<Array1<f32>, PipelineError> {
        let label = self.vocab.encode(self.columns.tokens(row));
        if label.len() != self.vocab.len() {
            return Err(PipelineError::LabelEncoding {
                name: name.to_string(),
                expected: self.vocab.len(),
                actual: label.len(),
            });
        }
        Ok(label)
    }
}
