//! Photo pipeline: downsampling and JPEG re-encoding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use tracing::{debug, instrument};

use crate::domain::{ImagePayload, JPEG_MEDIA_TYPE};
use crate::error::{WizardError, WizardResult};

/// Largest width or height sent to the assessment service.
pub const MAX_DIMENSION: u32 = 1920;

/// JPEG quality used for every re-encode.
pub const JPEG_QUALITY: u8 = 80;

/// Output size for an image of `width`×`height` bounded by `max`.
///
/// Images within the bound keep their size. Larger images are scaled by the
/// smaller of the two ratios so the larger side becomes `max`.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let ratio = f64::min(max as f64 / width as f64, max as f64 / height as f64);
    let scaled = |d: u32| ((d as f64 * ratio).round() as u32).clamp(1, max);
    (scaled(width), scaled(height))
}

#[derive(Debug, Clone, Copy)]
pub struct ImageProcessor {
    max_dimension: u32,
    quality: u8,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(MAX_DIMENSION, JPEG_QUALITY)
    }
}

impl ImageProcessor {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    /// Decode, bound and re-encode a photo off the async executor.
    pub async fn process(&self, bytes: Vec<u8>) -> WizardResult<ImagePayload> {
        let processor = *self;
        tokio::task::spawn_blocking(move || processor.process_sync(&bytes))
            .await
            .map_err(|e| WizardError::Image(format!("image task failed: {e}")))?
    }

    #[instrument(skip(self, bytes), fields(input_bytes = bytes.len()))]
    pub fn process_sync(&self, bytes: &[u8]) -> WizardResult<ImagePayload> {
        if bytes.is_empty() {
            return Err(WizardError::Image("the selected file is empty".to_string()));
        }

        let decoded = image::load_from_memory(bytes)?;
        let (width, height) = decoded.dimensions();
        let (target_w, target_h) = target_dimensions(width, height, self.max_dimension);

        let resized = if (target_w, target_h) == (width, height) {
            decoded
        } else {
            decoded.resize_exact(target_w, target_h, FilterType::Triangle)
        };

        // JPEG carries no alpha channel
        let rgb = resized.to_rgb8();
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality).encode_image(&rgb)?;

        debug!(
            width,
            height,
            target_w,
            target_h,
            output_bytes = encoded.len(),
            "Photo processed"
        );

        Ok(ImagePayload {
            data: STANDARD.encode(&encoded),
            media_type: JPEG_MEDIA_TYPE.to_string(),
            width: target_w,
            height: target_h,
        })
    }
}
