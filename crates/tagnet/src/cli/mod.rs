//! Subcommand implementations.

pub mod config;
pub mod evaluate;
pub mod train;
pub mod vocab;

use std::path::PathBuf;

use clap::Args;
use tagnet_core::Config;

/// Dataset location and epoch count, overriding the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct DatasetArgs {
    /// Dataset root containing the train/ and evaluate/ splits
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Number of training epochs (also selects which saved model to evaluate)
    #[arg(long)]
    pub epochs: Option<usize>,
}

impl DatasetArgs {
    /// Apply the overrides and re-validate.
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(root) = &self.root {
            config.dataset.root = root.clone();
        }
        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        config.validate()?;
        Ok(())
    }
}

/// Expand `~` in a user-supplied output path.
pub fn expand_path(path: &std::path::Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
