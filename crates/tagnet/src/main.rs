//! tagnet CLI - train and evaluate multi-label image tag classifiers.
//!
//! A dataset root holds a `train/` and an `evaluate/` split, each with an
//! `images.csv` manifest and an `images/` folder. Trained models are saved
//! under `models/<name><epochs>/`.
//!
//! # Usage
//!
//! ```bash
//! # Train for 20 epochs on ./pokemon
//! tagnet train --root ./pokemon --epochs 20
//!
//! # Evaluate that model and save the report
//! tagnet evaluate --root ./pokemon --epochs 20 --output report.json
//!
//! # List the label vocabulary
//! tagnet vocab --root ./pokemon
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tagnet_core::Config;

mod cli;
mod logging;

/// tagnet - multi-label image tag classifier.
#[derive(Parser, Debug)]
#[command(name = "tagnet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = "TAGNET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a dataset from the training split, fit a model, and save it
    Train(cli::train::TrainArgs),

    /// Evaluate a saved model against the evaluation split
    Evaluate(cli::evaluate::EvaluateArgs),

    /// Print the label vocabulary built from a manifest
    Vocab(cli::vocab::VocabArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

/// An explicit `--config` must load; the platform default falls back to defaults.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e));
    }
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `tagnet config path`."
            );
            Ok(Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = load_config(cli.config.as_ref())?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("tagnet v{}", tagnet_core::VERSION);

    match cli.command {
        Commands::Train(args) => cli::train::execute(args, config).await,
        Commands::Evaluate(args) => cli::evaluate::execute(args, config).await,
        Commands::Vocab(args) => cli::vocab::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
