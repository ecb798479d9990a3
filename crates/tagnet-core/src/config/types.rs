//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Dataset layout on disk.
///
/// A dataset root holds one directory per split, each with a manifest and an
/// image directory, plus a directory of trained models:
///
/// ```text
/// <root>/train/images.csv
/// <root>/train/images/<Name>.<ext>
/// <root>/evaluate/images.csv
/// <root>/evaluate/images/<Name>.<ext>
/// <root>/models/<name><epochs>/model.json
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Dataset root directory
    pub root: PathBuf,

    /// Dataset name used to key saved models. Defaults to the root's file name.
    pub name: Option<String>,

    /// Manifest file name inside each split directory
    pub manifest_file: String,

    /// Image directory name inside each split directory
    pub images_dir: String,

    /// Training split directory name
    pub train_split: String,

    /// Evaluation split directory name
    pub eval_split: String,

    /// Directory (under root) where trained models are saved
    pub models_dir: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("pokemon"),
            name: None,
            manifest_file: "images.csv".to_string(),
            images_dir: "images".to_string(),
            train_split: "train".to_string(),
            eval_split: "evaluate".to_string(),
            models_dir: "models".to_string(),
        }
    }
}

/// Target tensor geometry and source file resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Target width in pixels
    pub width: u32,

    /// Target height in pixels
    pub height: u32,

    /// Channels per pixel: 4 (RGBA), 3 (RGB) or 1 (grayscale)
    pub channels: usize,

    /// File extensions tried in order when resolving `<Name>.<ext>`
    pub extensions: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 120,
            channels: 4,
            extensions: vec!["png".to_string(), "jpg".to_string()],
        }
    }
}

/// Manifest column conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Column holding the image identifier (file stem)
    pub id_column: String,

    /// Any column whose name starts with this prefix holds a label token
    pub column_prefix: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            id_column: "Name".to_string(),
            column_prefix: "Type".to_string(),
        }
    }
}

/// Concurrency settings for dataset assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    /// Maximum rows decoded concurrently
    pub parallel_workers: usize,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 8,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum source image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode + preprocess timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Training loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of full passes over the training set
    pub epochs: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { epochs: 20 }
    }
}

/// Baseline classifier hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Side length of the average-pooling window applied before the dense layer
    pub pool_size: usize,

    /// Mini-batch size
    pub batch_size: usize,

    /// Adam learning rate
    pub learning_rate: f32,

    /// Seed for weight initialization and epoch shuffling
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: 42,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
