//! The `tagnet vocab` command: show the label vocabulary a manifest yields.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tagnet_core::{Config, LabelColumns, Split, Vocabulary};

/// Which split's manifest to read.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SplitArg {
    Train,
    Evaluate,
}

impl From<SplitArg> for Split {
    fn from(split: SplitArg) -> Self {
        match split {
            SplitArg::Train => Split::Train,
            SplitArg::Evaluate => Split::Evaluate,
        }
    }
}

/// Arguments for the `vocab` command.
#[derive(Args, Debug)]
pub struct VocabArgs {
    /// Dataset root containing the train/ and evaluate/ splits
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Split whose manifest is scanned
    #[arg(long, value_enum, default_value = "train")]
    pub split: SplitArg,

    /// Print a JSON array instead of one `index<TAB>token` line per label
    #[arg(long)]
    pub json: bool,
}

/// Execute the vocab command.
pub async fn execute(args: VocabArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(root) = &args.root {
        config.dataset.root = root.clone();
    }
    let paths = config.split_paths(args.split.into());
    let columns = LabelColumns::from_config(&config.labels);
    let vocab = Vocabulary::from_manifest(&paths.manifest, &columns)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(vocab.tokens())?);
    } else {
        print!("{}", format_listing(&vocab));
    }
    tracing::debug!("Vocabulary hash: {}", vocab.content_hash());
    Ok(())
}

fn format_listing(vocab: &Vocabulary) -> String {
    vocab
        .tokens()
        .iter()
        .enumerate()
        .map(|(i, token)| format!("{}\t{}\n", i, token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_listing_in_index_order() {
        let vocab = Vocabulary::from_tokens(["Grass", "Poison", "Fire"]);
        assert_eq!(format_listing(&vocab), "0\tGrass\n1\tPoison\n2\tFire\n");
    }

    #[test]
    fn test_format_listing_empty() {
        let vocab = Vocabulary::from_tokens(Vec::<String>::new());
        assert_eq!(format_listing(&vocab), "");
    }
}
