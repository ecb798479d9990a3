//! Evaluation against a held-out split with top-1 mismatch reporting.
//!
//! Ground truth for the mismatch comparison is the first `1.0` in each label
//! row, so rows with several tags are judged on their first vocabulary entry
//! only. Aggregate loss and accuracy are scored on the same predictions, so
//! the model runs inference over the split once.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use ndarray::ArrayView2;
use serde::Serialize;

use crate::config::{Config, Split};
use crate::error::{ModelError, Result};
use crate::model::metrics::{argmax, ground_truth_index};
use crate::model::{check_labels, Classifier, Evaluation, SoftmaxClassifier};
use crate::pipeline::{Dataset, DatasetAssembler};
use crate::train::training_vocabulary;
use crate::vocabulary::Vocabulary;

/// An example whose top-1 prediction differs from its ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// Row position in the evaluation manifest
    pub index: usize,
    pub name: String,
    pub source: PathBuf,
    pub predicted: Option<String>,
    /// `None` when the label row has no tag known to the vocabulary
    pub actual: Option<String>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mismatch on image {}: Predicted: {}, Actual: {}",
            self.name,
            self.predicted.as_deref().unwrap_or("none"),
            self.actual.as_deref().unwrap_or("none")
        )
    }
}

/// Result of evaluating a model on a dataset.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub examples: usize,
    pub mismatches: Vec<Mismatch>,
    pub loss: f32,
    pub accuracy: f32,
}

/// Compares model predictions with dataset labels.
pub struct Evaluator {
    vocab: Arc<Vocabulary>,
}

impl Evaluator {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self { vocab }
    }

    /// Rows whose argmax prediction differs from the first labeled class.
    pub fn find_mismatches(&self, predictions: ArrayView2<f32>, dataset: &Dataset) -> Vec<Mismatch> {
        let token = |index: Option<usize>| {
            index
                .and_then(|i| self.vocab.token(i))
                .map(str::to_string)
        };

        predictions
            .rows()
            .into_iter()
            .zip(dataset.labels().rows())
            .enumerate()
            .filter_map(|(index, (prediction, label))| {
                let predicted = argmax(prediction);
                let actual = ground_truth_index(label);
                (predicted != actual).then(|| Mismatch {
                    index,
                    name: dataset.names()[index].clone(),
                    source: dataset.sources()[index].clone(),
                    predicted: token(predicted),
                    actual: token(actual),
                })
            })
            .collect()
    }

    /// Predict, log each mismatch, and compute aggregate loss and accuracy.
    pub fn evaluate(&self, model: &dyn Classifier, dataset: &Dataset) -> Result<EvaluationReport> {
        if let Some(hash) = model.vocabulary_hash() {
            let found = self.vocab.content_hash();
            if hash != found {
                return Err(ModelError::VocabularyMismatch {
                    expected: short_hash(hash),
                    found: short_hash(&found),
                }
                .into());
            }
        }
        if model.output_width() != self.vocab.len() {
            return Err(ModelError::Shape(format!(
                "model has {} outputs, vocabulary has {} labels",
                model.output_width(),
                self.vocab.len()
            ))
            .into());
        }

        if dataset.is_empty() {
            return Err(ModelError::EmptyDataset("evaluate").into());
        }
        check_labels(dataset.labels().view(), dataset.len(), self.vocab.len())?;

        let predictions = model.predict(dataset.images().view())?;
        if predictions.dim() != (dataset.len(), self.vocab.len()) {
            return Err(ModelError::Shape(format!(
                "predictions are {:?}, expected ({}, {})",
                predictions.dim(),
                dataset.len(),
                self.vocab.len()
            ))
            .into());
        }

        let evaluation = Evaluation::score(predictions.view(), dataset.labels().view());
        let mismatches = self.find_mismatches(predictions.view(), dataset);
        for mismatch in &mismatches {
            tracing::info!("{}", mismatch);
        }
        tracing::info!("Test Loss: {}", evaluation.loss);
        tracing::info!("Test Accuracy: {}", evaluation.accuracy);

        Ok(EvaluationReport {
            examples: dataset.len(),
            mismatches,
            loss: evaluation.loss,
            accuracy: evaluation.accuracy,
        })
    }
}

/// Evaluate the model saved for `epochs` against the evaluation split.
pub async fn evaluate_saved_model(config: &Config, epochs: usize) -> Result<EvaluationReport> {
    let vocab = training_vocabulary(config)?;
    let paths = config.split_paths(Split::Evaluate);
    let dataset = DatasetAssembler::for_split(config, Split::Evaluate, vocab.clone())
        .assemble(&paths.manifest)
        .await?;

    let model = SoftmaxClassifier::load(&config.model_dir(epochs))?;
    Evaluator::new(vocab).evaluate(&model, &dataset)
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(12).collect()
}
