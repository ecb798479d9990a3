//! Dataset ingestion pipeline.
//!
//! This module contains the stages that turn a manifest into batch tensors:
//! - **resolve**: Find the image file for a row identifier
//! - **decode**: Read and decode image files with limits and timeout
//! - **preprocess**: Resize, fix channels, normalize into `[0, 1]`
//! - **encoder**: Encode one manifest row into an image tensor and label vector
//! - **dataset**: Encode all rows concurrently and stack them in row order

pub mod dataset;
pub mod decode;
pub mod encoder;
pub mod preprocess;
pub mod resolve;

// Re-exports for convenient access
pub use dataset::{Dataset, DatasetAssembler, IndexedRows};
pub use decode::ImageDecoder;
pub use encoder::{EncodedRow, RowEncoder};
pub use preprocess::{preprocess, ImageShape};
pub use resolve::ImageResolver;
