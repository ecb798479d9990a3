//! Image preprocessing into normalized tensors.
//!
//! Every image goes through the same steps so that training and evaluation
//! see identical inputs:
//! - direct resize to the target size (aspect ratio is distorted, never cropped
//!   or letterboxed)
//! - conversion to the target channel layout; for RGBA an opaque alpha
//!   channel is synthesized when the source has none
//! - a lossless PNG round trip into a canonical 8-bit buffer
//! - scaling each channel value by 1/255 into `[0, 1]`
//!
//! Tensor layout: HWC `[height, width, channels]`.

use std::io::Cursor;

use image::error::{ImageError, ImageResult, ParameterError, ParameterErrorKind};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use ndarray::Array3;

use crate::config::ImageConfig;

/// Largest 8-bit channel value.
const MAX_CHANNEL_VALUE: f32 = 255.0;

/// Target tensor geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
}

impl ImageShape {
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            channels: config.channels,
        }
    }

    /// `(height, width, channels)`, the shape of one image tensor.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, self.channels)
    }
}

impl Default for ImageShape {
    fn default() -> Self {
        Self::from_config(&ImageConfig::default())
    }
}

/// Resize, fix channels, canonicalize and normalize one decoded image.
pub fn preprocess(image: &DynamicImage, shape: ImageShape) -> ImageResult<Array3<f32>> {
    let resized = image.resize_exact(shape.width, shape.height, FilterType::Lanczos3);
    let converted = to_channels(&resized, shape.channels);

    let mut png = Vec::new();
    converted.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    let canonical = image::load_from_memory_with_format(&png, ImageFormat::Png)?;

    let raw = match shape.channels {
        1 => canonical.to_luma8().into_raw(),
        3 => canonical.to_rgb8().into_raw(),
        _ => canonical.to_rgba8().into_raw(),
    };
    let values: Vec<f32> = raw
        .into_iter()
        .map(|v| v as f32 / MAX_CHANNEL_VALUE)
        .collect();

    Array3::from_shape_vec(shape.dims(), values).map_err(|_| {
        ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
    })
}

fn to_channels(image: &DynamicImage, channels: usize) -> DynamicImage {
    match channels {
        1 => DynamicImage::ImageLuma8(image.to_luma8()),
        3 => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_preprocess_shape_default() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&img, ImageShape::default()).unwrap();
        assert_eq!(tensor.shape(), &[120, 120, 4]);
    }

    #[test]
    fn test_preprocess_non_square_target() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(30, 90));
        let shape = ImageShape {
            width: 64,
            height: 32,
            channels: 3,
        };
        let tensor = preprocess(&img, shape).unwrap();
        assert_eq!(tensor.shape(), &[32, 64, 3]);
    }

    #[test]
    fn test_missing_alpha_becomes_opaque() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([10, 20, 30])));
        let tensor = preprocess(&img, ImageShape::default()).unwrap();
        for y in 0..120 {
            for x in 0..120 {
                assert_eq!(tensor[[y, x, 3]], 1.0);
            }
        }
    }

    #[test]
    fn test_existing_alpha_is_kept() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 0])));
        let tensor = preprocess(&img, ImageShape::default()).unwrap();
        assert_eq!(tensor[[60, 60, 3]], 0.0);
    }

    #[test]
    fn test_normalization_range() {
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        let tensor = preprocess(&white, ImageShape::default()).unwrap();
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));

        let black = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])));
        let tensor = preprocess(&black, ImageShape::default()).unwrap();
        let color_max = tensor
            .slice(ndarray::s![.., .., 0..3])
            .iter()
            .cloned()
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(color_max, 0.0);

        // Gradient source: every value still lands in [0, 1]
        let gradient = DynamicImage::ImageRgb8(RgbImage::from_fn(50, 50, |x, y| {
            Rgb([(x * 5) as u8, (y * 5) as u8, ((x + y) * 2) as u8])
        }));
        let tensor = preprocess(&gradient, ImageShape::default()).unwrap();
        assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_grayscale_target() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        let shape = ImageShape {
            width: 16,
            height: 16,
            channels: 1,
        };
        let tensor = preprocess(&img, shape).unwrap();
        assert_eq!(tensor.shape(), &[16, 16, 1]);
        assert!((tensor[[0, 0, 0]] - 1.0).abs() < 1e-6);
    }
}
