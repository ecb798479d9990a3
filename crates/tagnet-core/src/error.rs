//! Error types for the tagnet pipeline.
//!
//! Errors are organized by stage to provide clear, actionable error messages
//! that include relevant context (file paths, row identifiers, stage names).
//! Every variant is unrecoverable at the row level: a single failing row
//! aborts the whole dataset build.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for tagnet operations.
#[derive(Error, Debug)]
pub enum TagnetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset ingestion errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Classifier errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Dataset ingestion errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Manifest missing, unreadable, or malformed
    #[error("Failed to read manifest {path}: {message}")]
    ManifestRead { path: PathBuf, message: String },

    /// Row has no value in the identifier column; `row` is 1-based
    #[error("Manifest row {row} has no value in identifier column {column}")]
    MissingIdentifier { row: usize, column: String },

    /// No candidate image file exists for a row identifier
    #[error("Image file not found for {name} in {dir} (tried: {tried})")]
    ImageNotFound {
        name: String,
        dir: PathBuf,
        tried: String,
    },

    /// Reading, decoding, resizing or re-encoding an image failed
    #[error("Error processing image at {path}: {message}")]
    ImageProcessing { path: PathBuf, message: String },

    /// Encoded label vector does not match the vocabulary width
    #[error("Label encoding for {name} produced {actual} entries, expected {expected}")]
    LabelEncoding {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },
}

/// Classifier errors: construction, fitting, inference and persistence.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Model artifact could not be read or parsed
    #[error("Failed to load model from {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Model artifact could not be written
    #[error("Failed to save model to {path}: {message}")]
    Save { path: PathBuf, message: String },

    /// Tensor shapes disagree with the model's configured input/output
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// Saved model was trained against a different vocabulary
    #[error("Vocabulary mismatch: model expects {expected}, dataset has {found}")]
    VocabularyMismatch { expected: String, found: String },

    /// Fitting or evaluating on zero examples
    #[error("Cannot {0} on an empty dataset")]
    EmptyDataset(&'static str),
}

/// Convenience type alias for tagnet results.
pub type Result<T> = std::result::Result<T, TagnetError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Convenience type alias for classifier-specific results.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
