//! Training orchestration: vocabulary, dataset, fit, save.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{Config, Split};
use crate::error::{ModelError, Result};
use crate::manifest::LabelColumns;
use crate::model::{Classifier, EpochStats, FitHistory, SoftmaxClassifier};
use crate::pipeline::{Dataset, DatasetAssembler, ImageShape};
use crate::vocabulary::Vocabulary;

/// Outcome of a completed training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub examples: usize,
    pub labels: Vec<String>,
    pub epochs: usize,
    pub final_accuracy: Option<f32>,
    pub final_loss: Option<f32>,
    pub model_dir: PathBuf,
    #[serde(skip)]
    pub history: FitHistory,
}

/// Build the label vocabulary from the training manifest.
///
/// Evaluation rebuilds it the same way so label indices line up with the
/// indices the model was trained against.
pub fn training_vocabulary(config: &Config) -> Result<Arc<Vocabulary>> {
    let paths = config.split_paths(Split::Train);
    let columns = LabelColumns::from_config(&config.labels);
    Ok(Arc::new(Vocabulary::from_manifest(&paths.manifest, &columns)?))
}

/// Trains the baseline classifier on the configured training split.
pub struct Trainer {
    config: Config,
}

impl Trainer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run a full training pass and save the model.
    ///
    /// `on_epoch` receives loss and accuracy after every epoch.
    pub async fn run(&self, on_epoch: &mut dyn FnMut(&EpochStats)) -> Result<TrainingSummary> {
        let vocab = training_vocabulary(&self.config)?;
        let paths = self.config.split_paths(Split::Train);
        let dataset = DatasetAssembler::for_split(&self.config, Split::Train, vocab.clone())
            .assemble(&paths.manifest)
            .await?;

        let mut model = SoftmaxClassifier::new(
            ImageShape::from_config(&self.config.image),
            &vocab,
            &self.config.model,
        )?;

        let epochs = self.config.training.epochs;
        let model_dir = self.config.model_dir(epochs);
        let history = fit_and_save(&mut model, &dataset, epochs, &model_dir, on_epoch)?;

        Ok(TrainingSummary {
            examples: dataset.len(),
            labels: vocab.tokens().to_vec(),
            epochs,
            final_accuracy: history.final_accuracy(),
            final_loss: history.final_loss(),
            model_dir,
            history,
        })
    }
}

/// Fit any classifier on a dataset, log the final accuracy, then save it.
pub fn fit_and_save(
    model: &mut dyn Classifier,
    dataset: &Dataset,
    epochs: usize,
    model_dir: &std::path::Path,
    on_epoch: &mut dyn FnMut(&EpochStats),
) -> Result<FitHistory> {
    if dataset.is_empty() {
        return Err(ModelError::EmptyDataset("train").into());
    }

    tracing::info!(
        "Training on {} examples with {} labels for {} epochs",
        dataset.len(),
        dataset.label_width(),
        epochs
    );
    let start = std::time::Instant::now();
    let history = model.fit(
        dataset.images().view(),
        dataset.labels().view(),
        epochs,
        on_epoch,
    )?;

    match history.final_accuracy() {
        Some(accuracy) => tracing::info!("Final accuracy: {}", accuracy),
        None => tracing::warn!("Training ran zero epochs"),
    }
    tracing::debug!("Fit finished in {:?}", start.elapsed());

    model.save(model_dir)?;
    Ok(history)
}
