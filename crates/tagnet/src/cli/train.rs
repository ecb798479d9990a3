//! The `tagnet train` command.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tagnet_core::{Config, Trainer};

use super::DatasetArgs;

/// Arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

/// Execute the train command.
pub async fn execute(args: TrainArgs, mut config: Config) -> anyhow::Result<()> {
    args.dataset.apply(&mut config)?;

    let progress = create_progress_bar(config.training.epochs as u64);
    let result = Trainer::new(config)
        .run(&mut |stats| {
            progress.set_position(stats.epoch as u64);
            progress.set_message(format!(
                "loss {:.4}, accuracy {:.4}",
                stats.loss, stats.accuracy
            ));
        })
        .await;
    progress.finish_and_clear();
    let summary = result?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    eprintln!(
        "Trained on {} examples ({} labels), saved to {}",
        summary.examples,
        summary.labels.len(),
        summary.model_dir.display()
    );
    Ok(())
}

/// Create a progress bar advancing once per epoch.
fn create_progress_bar(epochs: u64) -> ProgressBar {
    let pb = ProgressBar::new(epochs);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] epoch {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("loading dataset...");
    pb
}
