//! Classifier interface and the bundled baseline model.
//!
//! The trainer and evaluator only talk to a [`Classifier`]: fit on a batch
//! of images and multi-hot labels, predict per-class probabilities, score
//! loss/accuracy, and persist to a directory. Loading is a constructor on the
//! concrete type.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tagnet_core::model::{Classifier, SoftmaxClassifier};
//!
//! let mut model = SoftmaxClassifier::new(shape, &vocab, &config.model)?;
//! model.fit(dataset.images().view(), dataset.labels().view(), 20, &mut |_| {})?;
//! model.save(&config.model_dir(20))?;
//! ```

pub mod metrics;
pub mod softmax;

use std::path::Path;

use ndarray::{Array2, ArrayView2, ArrayView4};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub use softmax::SoftmaxClassifier;

/// Loss and accuracy over one pass of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
}

impl Evaluation {
    /// Score predictions that were already computed against their labels.
    pub fn score(predictions: ArrayView2<f32>, labels: ArrayView2<f32>) -> Self {
        Self {
            loss: metrics::categorical_crossentropy(predictions, labels),
            accuracy: metrics::categorical_accuracy(predictions, labels),
        }
    }
}

/// Metrics reported at the end of one training epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
}

/// Per-epoch metrics from a completed fit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FitHistory {
    pub epochs: Vec<EpochStats>,
}

impl FitHistory {
    /// Training accuracy after the last epoch.
    pub fn final_accuracy(&self) -> Option<f32> {
        self.epochs.last().map(|e| e.accuracy)
    }

    /// Training loss after the last epoch.
    pub fn final_loss(&self) -> Option<f32> {
        self.epochs.last().map(|e| e.loss)
    }
}

/// A trainable image classifier producing one probability per vocabulary entry.
pub trait Classifier: Send + Sync {
    /// Number of output classes.
    fn output_width(&self) -> usize;

    /// Train for `epochs` passes, calling `on_epoch` after each.
    fn fit(
        &mut self,
        images: ArrayView4<f32>,
        labels: ArrayView2<f32>,
        epochs: usize,
        on_epoch: &mut dyn FnMut(&EpochStats),
    ) -> Result<FitHistory, ModelError>;

    /// Row-wise class probabilities, `[N, output_width]`.
    fn predict(&self, images: ArrayView4<f32>) -> Result<Array2<f32>, ModelError>;

    /// Categorical cross-entropy and accuracy against multi-hot labels.
    fn evaluate(
        &self,
        images: ArrayView4<f32>,
        labels: ArrayView2<f32>,
    ) -> Result<Evaluation, ModelError> {
        if images.shape()[0] == 0 {
            return Err(ModelError::EmptyDataset("evaluate"));
        }
        check_labels(labels, images.shape()[0], self.output_width())?;
        let predictions = self.predict(images)?;
        Ok(Evaluation::score(predictions.view(), labels))
    }

    /// Persist the model into a directory.
    fn save(&self, dir: &Path) -> Result<(), ModelError>;

    /// BLAKE3 hash of the vocabulary the model was trained against, if recorded.
    fn vocabulary_hash(&self) -> Option<&str> {
        None
    }
}

/// Labels must have one row per image and one column per output class.
pub(crate) fn check_labels(
    labels: ArrayView2<f32>,
    rows: usize,
    width: usize,
) -> Result<(), ModelError> {
    if labels.dim() != (rows, width) {
        return Err(ModelError::Shape(format!(
            "labels are {:?}, expected ({}, {})",
            labels.dim(),
            rows,
            width
        )));
    }
    Ok(())
}
