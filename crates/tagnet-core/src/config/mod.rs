//! Configuration management for tagnet.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`; a missing file means
//! "use defaults", a present file is validated on load.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for tagnet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset layout
    pub dataset: DatasetConfig,

    /// Image geometry and file resolution
    pub image: ImageConfig,

    /// Manifest column conventions
    pub labels: LabelsConfig,

    /// Dataset assembly concurrency
    pub loading: LoadingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Training loop settings
    pub training: TrainingConfig,

    /// Baseline classifier settings
    pub model: ModelConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Which half of the dataset a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Evaluate,
}

/// Resolved manifest and image directory for one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPaths {
    pub manifest: PathBuf,
    pub images: PathBuf,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.tagnet.tagnet/config.toml
    /// - Linux: ~/.config/tagnet/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\tagnet\config\config.toml
    ///
    /// Falls back to ~/.tagnet/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tagnet", "tagnet")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tagnet").join("config.toml")
            })
    }

    /// Get the resolved dataset root (with ~ expansion).
    pub fn dataset_root(&self) -> PathBuf {
        let path_str = self.dataset.root.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Dataset name used to key saved models.
    pub fn dataset_name(&self) -> String {
        if let Some(name) = &self.dataset.name {
            return name.clone();
        }
        self.dataset_root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string())
    }

    /// Manifest and image directory for a split.
    pub fn split_paths(&self, split: Split) -> SplitPaths {
        let split_dir = match split {
            Split::Train => &self.dataset.train_split,
            Split::Evaluate => &self.dataset.eval_split,
        };
        let dir = self.dataset_root().join(split_dir);
        SplitPaths {
            manifest: dir.join(&self.dataset.manifest_file),
            images: dir.join(&self.dataset.images_dir),
        }
    }

    /// Directory a model trained for `epochs` epochs is saved to and loaded from.
    pub fn model_dir(&self, epochs: usize) -> PathBuf {
        self.dataset_root()
            .join(&self.dataset.models_dir)
            .join(format!("{}{}", self.dataset_name(), epochs))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.image.width, 120);
        assert_eq!(config.image.height, 120);
        assert_eq!(config.image.channels, 4);
        assert_eq!(config.image.extensions, vec!["png", "jpg"]);
        assert_eq!(config.labels.column_prefix, "Type");
        assert_eq!(config.training.epochs, 20);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[dataset]"));
        assert!(toml.contains("[image]"));
        assert!(toml.contains("[labels]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[training]\nepochs = 5\n").unwrap();
        assert_eq!(config.training.epochs, 5);
        assert_eq!(config.image.width, 120);
        assert_eq!(config.dataset.manifest_file, "images.csv");
    }

    #[test]
    fn test_split_paths() {
        let mut config = Config::default();
        config.dataset.root = PathBuf::from("/data/pokemon");

        let train = config.split_paths(Split::Train);
        assert_eq!(train.manifest, PathBuf::from("/data/pokemon/train/images.csv"));
        assert_eq!(train.images, PathBuf::from("/data/pokemon/train/images"));

        let eval = config.split_paths(Split::Evaluate);
        assert_eq!(eval.manifest, PathBuf::from("/data/pokemon/evaluate/images.csv"));
    }

    #[test]
    fn test_model_dir_keyed_by_name_and_epochs() {
        let mut config = Config::default();
        config.dataset.root = PathBuf::from("/data/pokemon");
        assert_eq!(
            config.model_dir(20),
            PathBuf::from("/data/pokemon/models/pokemon20")
        );

        config.dataset.name = Some("gen1".to_string());
        assert_eq!(config.model_dir(5), PathBuf::from("/data/pokemon/models/gen15"));
    }

    #[test]
    fn test_load_from_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[image]\nchannels = 2\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("image.channels"));
    }
}
