//! Dataset assembly: encode every manifest row concurrently, then stack.
//!
//! Rows are encoded in parallel tasks that finish in arbitrary order. Each
//! task returns its row index with its result, and results are placed into a
//! pre-sized slot vector by that index. Nothing is appended on completion, so
//! image `k`, label `k` and name `k` always describe manifest row `k`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{Array2, Array4, Axis};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{Config, Split};
use crate::error::PipelineError;
use crate::manifest::{LabelColumns, Manifest, ManifestRow};
use crate::vocabulary::Vocabulary;

use super::decode::ImageDecoder;
use super::encoder::{EncodedRow, RowEncoder};
use super::preprocess::ImageShape;
use super::resolve::ImageResolver;

/// Images, labels and identifiers in manifest row order.
#[derive(Debug, Clone)]
pub struct Dataset {
    images: Array4<f32>,
    labels: Array2<f32>,
    names: Vec<String>,
    sources: Vec<PathBuf>,
}

impl Dataset {
    /// Stack encoded rows, in the order given, into batch tensors.
    pub fn stack(
        rows: Vec<EncodedRow>,
        shape: ImageShape,
        label_width: usize,
    ) -> Result<Self, PipelineError> {
        let (height, width, channels) = shape.dims();
        let n = rows.len();

        let mut images = Array4::<f32>::zeros((n, height, width, channels));
        let mut labels = Array2::<f32>::zeros((n, label_width));
        let mut names = Vec::with_capacity(n);
        let mut sources = Vec::with_capacity(n);

        for (k, row) in rows.into_iter().enumerate() {
            if row.image.dim() != (height, width, channels) {
                return Err(PipelineError::ImageProcessing {
                    path: row.source,
                    message: format!(
                        "Tensor shape {:?} does not match {:?}",
                        row.image.dim(),
                        (height, width, channels)
                    ),
                });
            }
            if row.label.len() != label_width {
                return Err(PipelineError::LabelEncoding {
                    name: row.name,
                    expected: label_width,
                    actual: row.label.len(),
                });
            }
            images.index_axis_mut(Axis(0), k).assign(&row.image);
            labels.index_axis_mut(Axis(0), k).assign(&row.label);
            names.push(row.name);
            sources.push(row.source);
        }

        Ok(Self {
            images,
            labels,
            names,
            sources,
        })
    }

    /// `[N, height, width, channels]`
    pub fn images(&self) -> &Array4<f32> {
        &self.images
    }

    /// `[N, |vocabulary|]`
    pub fn labels(&self) -> &Array2<f32> {
        &self.labels
    }

    /// Row identifiers, same order as `images` and `labels`.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolved image files, same order as `names`.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn label_width(&self) -> usize {
        self.labels.ncols()
    }
}

/// Fixed-size result slots filled by row index.
pub struct IndexedRows {
    slots: Vec<Option<EncodedRow>>,
}

impl IndexedRows {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
        }
    }

    /// Place a row's result. Out-of-range or repeated indices are ignored with a warning.
    pub fn place(&mut self, index: usize, row: EncodedRow) {
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_none() => *slot = Some(row),
            Some(_) => tracing::warn!("Row {} encoded twice; keeping first result", index),
            None => tracing::warn!("Row index {} out of range ({})", index, self.slots.len()),
        }
    }

    /// Rows in index order, or the first index that never received a result.
    pub fn into_ordered(self) -> Result<Vec<EncodedRow>, usize> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or(i))
            .collect()
    }
}

/// Drives the row encoder over a whole manifest.
pub struct DatasetAssembler {
    encoder: Arc<RowEncoder>,
    parallel_workers: usize,
}

impl DatasetAssembler {
    pub fn new(encoder: RowEncoder, parallel_workers: usize) -> Self {
        Self {
            encoder: Arc::new(encoder),
            parallel_workers: parallel_workers.max(1),
        }
    }

    /// Assembler for one split of the configured dataset layout.
    pub fn for_split(config: &Config, split: Split, vocab: Arc<Vocabulary>) -> Self {
        let paths = config.split_paths(split);
        let encoder = RowEncoder::new(
            vocab,
            LabelColumns::from_config(&config.labels),
            ImageResolver::new(paths.images, &config.image.extensions),
            ImageDecoder::new(config.limits.clone(), ImageShape::from_config(&config.image)),
        );
        Self::new(encoder, config.loading.parallel_workers)
    }

    /// Read a manifest and assemble its dataset.
    pub async fn assemble(&self, manifest: &Path) -> Result<Dataset, PipelineError> {
        let manifest = Manifest::read(manifest)?;
        tracing::info!(
            "Loading {} images from {:?}",
            manifest.len(),
            self.encoder.resolver().dir()
        );
        self.assemble_rows(manifest.into_rows()).await
    }

    /// Encode rows concurrently and stack them in row order.
    ///
    /// The first failing row aborts every in-flight task and is returned as
    /// the error; no partial dataset is produced.
    pub async fn assemble_rows(&self, rows: Vec<ManifestRow>) -> Result<Dataset, PipelineError> {
        let start = std::time::Instant::now();
        let total = rows.len();
        let semaphore = Arc::new(Semaphore::new(self.parallel_workers));
        let mut tasks = JoinSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let encoder = self.encoder.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                // The semaphore is never closed, so acquire only fails if it were.
                let _permit = semaphore.acquire_owned().await.ok();
                (index, encoder.encode(index, &row).await)
            });
        }

        let mut results = IndexedRows::new(total);
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| PipelineError::ImageProcessing {
                path: self.encoder.resolver().dir().to_path_buf(),
                message: format!("Row task failed: {}", e),
            })?;
            match result {
                Ok(row) => results.place(index, row),
                Err(e) => {
                    tracing::error!("Error processing row {}: {}", index + 1, e);
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        let rows = results
            .into_ordered()
            .map_err(|index| PipelineError::ImageProcessing {
                path: self.encoder.resolver().dir().to_path_buf(),
                message: format!("Row {} produced no result", index + 1),
            })?;

        let dataset = Dataset::stack(
            rows,
            self.encoder.decoder().shape(),
            self.encoder.vocabulary().len(),
        )?;
        tracing::info!("Assembled {} examples in {:?}", dataset.len(), start.elapsed());
        Ok(dataset)
    }
}
