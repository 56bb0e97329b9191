//! Contact photo normalization.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error::{Result, StoreError};
use crate::validation::validate_image_size;

/// Longest edge of a stored photo, in pixels.
pub const MAX_PHOTO_DIMENSION: u32 = 1024;

/// JPEG quality used when re-encoding photos.
pub const PHOTO_JPEG_QUALITY: u8 = 70;

/// Turns an uploaded photo into the bytes the store keeps.
pub trait PhotoProcessor: Send + Sync {
    /// Validate and re-encode `data`. Fails with a validation error when the
    /// payload is too large and an image-processing error when it does not
    /// decode.
    fn normalize(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Downscales to [`MAX_PHOTO_DIMENSION`] and re-encodes as JPEG.
#[derive(Debug, Clone)]
pub struct JpegPhotoProcessor {
    max_dimension: u32,
    quality: u8,
}

impl JpegPhotoProcessor {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension,
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegPhotoProcessor {
    fn default() -> Self {
        Self::new(MAX_PHOTO_DIMENSION, PHOTO_JPEG_QUALITY)
    }
}

impl PhotoProcessor for JpegPhotoProcessor {
    fn normalize(&self, data: &[u8]) -> Result<Vec<u8>> {
        validate_image_size(data)?;

        let mut img = image::load_from_memory(data)
            .map_err(|e| StoreError::ImageProcessing(format!("Invalid image data: {e}")))?;

        if img.width() > self.max_dimension || img.height() > self.max_dimension {
            img = img.resize(self.max_dimension, self.max_dimension, FilterType::Triangle);
        }

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .encode_image(&img.to_rgb8())
            .map_err(|e| StoreError::ImageProcessing(format!("Failed to compress image: {e}")))?;

        tracing::debug!(
            input_bytes = data.len(),
            output_bytes = out.len(),
            width = img.width(),
            height = img.height(),
            "normalized photo"
        );
        Ok(out)
    }
}

/// Stores photo bytes untouched apart from the size check.
#[derive(Debug, Clone, Default)]
pub struct PassthroughPhotoProcessor;

impl PhotoProcessor for PassthroughPhotoProcessor {
    fn normalize(&self, data: &[u8]) -> Result<Vec<u8>> {
        validate_image_size(data)?;
        Ok(data.to_vec())
    }
}
