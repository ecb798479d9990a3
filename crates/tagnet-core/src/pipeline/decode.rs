//! Image loading: read, decode and preprocess with limits and a timeout.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use image::{DynamicImage, GenericImageView};
use ndarray::Array3;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

use super::preprocess::{preprocess, ImageShape};

/// Loads image files into normalized tensors.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
    shape: ImageShape,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits and target shape.
    pub fn new(limits: LimitsConfig, shape: ImageShape) -> Self {
        Self { limits, shape }
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    /// Read a file and turn it into a `[height, width, channels]` tensor.
    ///
    /// The read is async; decoding and preprocessing run on the blocking pool
    /// under the configured timeout.
    pub async fn load(&self, path: &Path) -> Result<Array3<f32>, PipelineError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| PipelineError::ImageProcessing {
                path: path.to_path_buf(),
                message: format!("Cannot read metadata: {}", e),
            })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::ImageProcessing {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {}", e),
            })?;

        self.load_from_bytes(bytes, path).await
    }

    /// Decode and preprocess an in-memory buffer.
    pub async fn load_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> Result<Array3<f32>, PipelineError> {
        let path_owned = path.to_path_buf();
        let shape = self.shape;
        let max_dim = self.limits.max_image_dimension;
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || {
                let image = Self::decode_bytes_sync(bytes, &path_owned, max_dim)?;
                preprocess(&image, shape).map_err(|e| PipelineError::ImageProcessing {
                    path: path_owned.clone(),
                    message: e.to_string(),
                })
            })
            .await
        })
        .await;

        match result {
            Ok(Ok(inner)) => inner,
            Ok(Err(e)) => Err(PipelineError::ImageProcessing {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    ///
    /// The format is sniffed from content first, so a PNG saved as `.jpg`
    /// still decodes; the extension is only a fallback.
    fn decode_bytes_sync(
        bytes: Vec<u8>,
        path: &Path,
        max_dim: u32,
    ) -> Result<DynamicImage, PipelineError> {
        let processing_err = |message: String| PipelineError::ImageProcessing {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| processing_err(format!("Cannot detect image format: {}", e)))?;
        if reader.format().is_none() {
            let format = image::ImageFormat::from_path(path)
                .map_err(|_| processing_err("Unrecognized image format".to_string()))?;
            reader.set_format(format);
        }

        let image = reader.decode().map_err(|e| processing_err(e.to_string()))?;

        let (width, height) = image.dimensions();
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    fn decoder() -> ImageDecoder {
        ImageDecoder::new(LimitsConfig::default(), ImageShape::default())
    }

    #[tokio::test]
    async fn test_load_produces_target_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 33, 77);

        let tensor = decoder().load(&path).await.unwrap();
        assert_eq!(tensor.shape(), &[120, 120, 4]);
        assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_format_detected_by_content() {
        // PNG bytes behind a .jpg name still decode
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("real.png");
        write_png(&png, 4, 4);
        let misnamed = dir.path().join("misnamed.jpg");
        std::fs::copy(&png, &misnamed).unwrap();

        let bytes = std::fs::read(&misnamed).unwrap();
        let image = ImageDecoder::decode_bytes_sync(bytes, &misnamed, 100).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really a png").unwrap();

        let err = decoder().load(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageProcessing { .. }));
        assert!(err.to_string().contains("broken.png"));
    }

    #[tokio::test]
    async fn test_oversized_dimensions_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_png(&path, 64, 8);

        let limits = LimitsConfig {
            max_image_dimension: 32,
            ..LimitsConfig::default()
        };
        let err = ImageDecoder::new(limits, ImageShape::default())
            .load(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { width: 64, .. }));
    }

    #[tokio::test]
    async fn test_file_over_size_limit_rejected_before_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();

        let limits = LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        };
        let err = ImageDecoder::new(limits, ImageShape::default())
            .load(&path)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FileTooLarge {
                size_mb: 2,
                max_mb: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_slow_decode_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.png");
        write_png(&path, 3000, 3000);

        let limits = LimitsConfig {
            max_image_dimension: 4096,
            decode_timeout_ms: 1,
            ..LimitsConfig::default()
        };
        let err = ImageDecoder::new(limits, ImageShape::default())
            .load(&path)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Timeout { ref stage, timeout_ms: 1, .. } if stage == "decode"
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = decoder().load(&dir.path().join("gone.png")).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageProcessing { .. }));
    }
}
