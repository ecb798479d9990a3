//! Softmax-regression baseline classifier.
//!
//! Each image is average-pooled over `pool_size × pool_size` windows and
//! flattened; a single dense layer maps the pooled pixels to one logit per
//! vocabulary entry, followed by softmax. Training minimizes categorical
//! cross-entropy with Adam over shuffled mini-batches.
//!
//! Saved as a single `model.json` holding the input geometry, the label
//! order and vocabulary hash it was trained with, and the weights.

use std::path::{Path, PathBuf};

use ndarray::{Array, Array1, Array2, ArrayView2, ArrayView4, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::pipeline::ImageShape;
use crate::vocabulary::Vocabulary;

use super::{check_labels, metrics, Classifier, EpochStats, FitHistory};

/// The model artifact filename inside a model directory.
const MODEL_FILENAME: &str = "model.json";

/// Bumped whenever the artifact layout changes.
const FORMAT_VERSION: u32 = 1;

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const ADAM_EPSILON: f32 = 1e-7;

/// Dense softmax layer over pooled pixels.
#[derive(Debug, Clone)]
pub struct SoftmaxClassifier {
    shape: ImageShape,
    pool_size: usize,
    labels: Vec<String>,
    vocabulary_hash: String,
    /// `[features, classes]`
    weights: Array2<f32>,
    bias: Array1<f32>,
    batch_size: usize,
    learning_rate: f32,
    seed: u64,
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    width: u32,
    height: u32,
    channels: usize,
    pool_size: usize,
    labels: Vec<String>,
    vocabulary_hash: String,
    batch_size: usize,
    learning_rate: f32,
    seed: u64,
    /// Row-major `[features, classes]`
    weights: Vec<f32>,
    bias: Vec<f32>,
}

impl SoftmaxClassifier {
    /// A freshly initialized model with one output per vocabulary entry.
    pub fn new(
        shape: ImageShape,
        vocab: &Vocabulary,
        config: &ModelConfig,
    ) -> Result<Self, ModelError> {
        if vocab.is_empty() {
            return Err(ModelError::Shape(
                "classifier needs at least one output label".to_string(),
            ));
        }
        let features = feature_count(shape, config.pool_size)?;
        let classes = vocab.len();

        // Glorot-uniform initialization
        let mut rng = StdRng::seed_from_u64(config.seed);
        let limit = (6.0 / (features + classes) as f32).sqrt();
        let weights = Array2::from_shape_fn((features, classes), |_| rng.gen_range(-limit..limit));

        tracing::debug!(
            "Initialized classifier: {} features -> {} classes",
            features,
            classes
        );

        Ok(Self {
            shape,
            pool_size: config.pool_size,
            labels: vocab.tokens().to_vec(),
            vocabulary_hash: vocab.content_hash(),
            weights,
            bias: Array1::zeros(classes),
            batch_size: config.batch_size.max(1),
            learning_rate: config.learning_rate,
            seed: config.seed,
        })
    }

    /// Load a model saved with [`Classifier::save`].
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let path = Self::artifact_path(dir);
        let load_err = |message: String| ModelError::Load {
            path: path.clone(),
            message,
        };

        let bytes = std::fs::read(&path).map_err(|e| load_err(e.to_string()))?;
        let artifact: ModelArtifact =
            serde_json::from_slice(&bytes).map_err(|e| load_err(e.to_string()))?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(load_err(format!(
                "unsupported format version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }

        let shape = ImageShape {
            width: artifact.width,
            height: artifact.height,
            channels: artifact.channels,
        };
        let features =
            feature_count(shape, artifact.pool_size).map_err(|e| load_err(e.to_string()))?;
        let classes = artifact.labels.len();
        if artifact.bias.len() != classes {
            return Err(load_err(format!(
                "bias has {} entries for {} labels",
                artifact.bias.len(),
                classes
            )));
        }
        let weights = Array2::from_shape_vec((features, classes), artifact.weights)
            .map_err(|e| load_err(format!("weights: {}", e)))?;

        tracing::info!(
            "Loaded model from {:?} ({} labels, {}x{}x{} input)",
            path,
            classes,
            shape.height,
            shape.width,
            shape.channels
        );

        Ok(Self {
            shape,
            pool_size: artifact.pool_size,
            labels: artifact.labels,
            vocabulary_hash: artifact.vocabulary_hash,
            weights,
            bias: Array1::from(artifact.bias),
            batch_size: artifact.batch_size.max(1),
            learning_rate: artifact.learning_rate,
            seed: artifact.seed,
        })
    }

    /// Path of the artifact file inside a model directory.
    pub fn artifact_path(dir: &Path) -> PathBuf {
        dir.join(MODEL_FILENAME)
    }

    /// Check whether a saved model exists in a directory.
    pub fn exists(dir: &Path) -> bool {
        Self::artifact_path(dir).exists()
    }

    /// Label order the model's outputs follow.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn input_shape(&self) -> ImageShape {
        self.shape
    }

    /// Average-pool and flatten `[N, H, W, C]` into `[N, features]`.
    fn features(&self, images: ArrayView4<f32>) -> Result<Array2<f32>, ModelError> {
        let (n, height, width, channels) = images.dim();
        if (height, width, channels) != self.shape.dims() {
            return Err(ModelError::Shape(format!(
                "images are {:?} per example, model expects {:?}",
                (height, width, channels),
                self.shape.dims()
            )));
        }

        let p = self.pool_size;
        let pooled_width = width / p;
        let scale = 1.0 / (p * p) as f32;
        let mut out = Array2::<f32>::zeros((n, (height / p) * pooled_width * channels));

        for (i, image) in images.outer_iter().enumerate() {
            let mut row = out.row_mut(i);
            for ((y, x, c), &v) in image.indexed_iter() {
                row[((y / p) * pooled_width + x / p) * channels + c] += v * scale;
            }
        }
        Ok(out)
    }

    fn forward(&self, features: ArrayView2<f32>) -> Array2<f32> {
        let mut logits = features.dot(&self.weights) + &self.bias;
        softmax_rows(&mut logits);
        logits
    }
}

impl Classifier for SoftmaxClassifier {
    fn output_width(&self) -> usize {
        self.labels.len()
    }

    fn fit(
        &mut self,
        images: ArrayView4<f32>,
        labels: ArrayView2<f32>,
        epochs: usize,
        on_epoch: &mut dyn FnMut(&EpochStats),
    ) -> Result<FitHistory, ModelError> {
        let n = images.shape()[0];
        if n == 0 {
            return Err(ModelError::EmptyDataset("fit"));
        }
        check_labels(labels, n, self.output_width())?;

        let features = self.features(images)?;
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        let mut adam = Adam::new(self.learning_rate, self.weights.dim(), self.bias.len());
        let mut order: Vec<usize> = (0..n).collect();
        let mut history = FitHistory::default();

        for epoch in 1..=epochs {
            order.shuffle(&mut rng);
            let mut loss_sum = 0.0;
            let mut correct = 0.0;

            for batch in order.chunks(self.batch_size) {
                let x = features.select(Axis(0), batch);
                let y = labels.select(Axis(0), batch);
                let probs = self.forward(x.view());
                let batch_len = batch.len() as f32;

                loss_sum += metrics::categorical_crossentropy(probs.view(), y.view()) * batch_len;
                correct += metrics::categorical_accuracy(probs.view(), y.view()) * batch_len;

                // d(loss)/d(logits) for softmax + cross-entropy with unnormalized targets
                let target_mass = y.sum_axis(Axis(1)).insert_axis(Axis(1));
                let grad_logits = (&probs * &target_mass - &y) / batch_len;
                let grad_weights = x.t().dot(&grad_logits);
                let grad_bias = grad_logits.sum_axis(Axis(0));

                adam.step(&mut self.weights, &mut self.bias, &grad_weights, &grad_bias);
            }

            let stats = EpochStats {
                epoch,
                loss: loss_sum / n as f32,
                accuracy: correct / n as f32,
            };
            tracing::debug!(
                "Epoch {}/{}: loss={:.4} accuracy={:.4}",
                epoch,
                epochs,
                stats.loss,
                stats.accuracy
            );
            on_epoch(&stats);
            history.epochs.push(stats);
        }

        Ok(history)
    }

    fn predict(&self, images: ArrayView4<f32>) -> Result<Array2<f32>, ModelError> {
        let features = self.features(images)?;
        Ok(self.forward(features.view()))
    }

    fn save(&self, dir: &Path) -> Result<(), ModelError> {
        let path = Self::artifact_path(dir);
        let save_err = |message: String| ModelError::Save {
            path: path.clone(),
            message,
        };

        std::fs::create_dir_all(dir).map_err(|e| save_err(e.to_string()))?;

        let artifact = ModelArtifact {
            format_version: FORMAT_VERSION,
            width: self.shape.width,
            height: self.shape.height,
            channels: self.shape.channels,
            pool_size: self.pool_size,
            labels: self.labels.clone(),
            vocabulary_hash: self.vocabulary_hash.clone(),
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            seed: self.seed,
            weights: self.weights.iter().copied().collect(),
            bias: self.bias.to_vec(),
        };
        let json = serde_json::to_vec(&artifact).map_err(|e| save_err(e.to_string()))?;
        std::fs::write(&path, &json).map_err(|e| save_err(e.to_string()))?;

        tracing::info!(
            "Saved model to {:?} ({:.1} MB)",
            path,
            json.len() as f64 / 1_000_000.0
        );
        Ok(())
    }

    fn vocabulary_hash(&self) -> Option<&str> {
        Some(&self.vocabulary_hash)
    }
}

/// Number of pooled features for an input shape.
fn feature_count(shape: ImageShape, pool_size: usize) -> Result<usize, ModelError> {
    let (height, width, channels) = shape.dims();
    if pool_size == 0 || height % pool_size != 0 || width % pool_size != 0 {
        return Err(ModelError::Shape(format!(
            "pool size {} must divide {}x{}",
            pool_size, width, height
        )));
    }
    Ok((height / pool_size) * (width / pool_size) * channels)
}

/// Numerically stable in-place softmax over each row.
fn softmax_rows(logits: &mut Array2<f32>) {
    for mut row in logits.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row /= sum;
        }
    }
}

/// Adam optimizer state for one dense layer.
struct Adam {
    learning_rate: f32,
    t: i32,
    m_weights: Array2<f32>,
    v_weights: Array2<f32>,
    m_bias: Array1<f32>,
    v_bias: Array1<f32>,
}

impl Adam {
    fn new(learning_rate: f32, weight_dim: (usize, usize), bias_len: usize) -> Self {
        Self {
            learning_rate,
            t: 0,
            m_weights: Array2::zeros(weight_dim),
            v_weights: Array2::zeros(weight_dim),
            m_bias: Array1::zeros(bias_len),
            v_bias: Array1::zeros(bias_len),
        }
    }

    fn step(
        &mut self,
        weights: &mut Array2<f32>,
        bias: &mut Array1<f32>,
        grad_weights: &Array2<f32>,
        grad_bias: &Array1<f32>,
    ) {
        self.t += 1;
        let lr_t = self.learning_rate * (1.0 - BETA2.powi(self.t)).sqrt()
            / (1.0 - BETA1.powi(self.t));
        adam_update(weights, grad_weights, &mut self.m_weights, &mut self.v_weights, lr_t);
        adam_update(bias, grad_bias, &mut self.m_bias, &mut self.v_bias, lr_t);
    }
}

fn adam_update<D: Dimension>(
    param: &mut Array<f32, D>,
    grad: &Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    lr_t: f32,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m_i, v_i| {
            *m_i = BETA1 * *m_i + (1.0 - BETA1) * g;
            *v_i = BETA2 * *v_i + (1.0 - BETA2) * g * g;
            *p -= lr_t * *m_i / (v_i.sqrt() + ADAM_EPSILON);
        });
}
