//! tagnet core - multi-label image tag classification.
//!
//! Turns a folder of images and a CSV manifest of per-image tags into batch
//! tensors, trains a classifier on them, and evaluates a saved model against
//! a held-out split with per-example mismatch reporting.
//!
//! # Architecture
//!
//! ```text
//! images.csv → Vocabulary ─┐
//!                          ├→ RowEncoder (resolve → decode → preprocess → multi-hot)
//! images/   ───────────────┘        │ one task per row, results placed by index
//!                                   ▼
//!                      Dataset [N,H,W,C] + [N,|V|] → Classifier → Trainer | Evaluator
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tagnet_core::{evaluate_saved_model, Config, Trainer};
//!
//! #[tokio::main]
//! async fn main() -> tagnet_core::Result<()> {
//!     let config = Config::load()?;
//!     let summary = Trainer::new(config.clone()).run(&mut |_| {}).await?;
//!     let report = evaluate_saved_model(&config, summary.epochs).await?;
//!     println!("Test accuracy: {}", report.accuracy);
//!     Ok(())
//! }
//! ```

#[cfg(target_os = "macos")]
extern crate blas_src;

pub mod config;
pub mod error;
pub mod evaluate;
pub mod manifest;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod train;
pub mod vocabulary;

#[cfg(test)]
mod testing;

pub use config::{Config, Split};
pub use error::{ConfigError, ModelError, PipelineError, PipelineResult, Result, TagnetError};
pub use evaluate::{evaluate_saved_model, EvaluationReport, Evaluator, Mismatch};
pub use manifest::{LabelColumns, Manifest, ManifestRow};
pub use model::{Classifier, SoftmaxClassifier};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{Dataset, DatasetAssembler};
pub use train::{Trainer, TrainingSummary};
pub use vocabulary::Vocabulary;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
