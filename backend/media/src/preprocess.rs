use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use shelfcount_core::{NormalizedImage, PreprocessError};
use tracing::{debug, info};

use crate::mime_detect::{is_allowed_filename, sniff_mime};
use crate::orientation::{apply_orientation, read_exif_orientation};

pub const DEFAULT_MAX_WIDTH: u32 = 800;
pub const DEFAULT_MAX_HEIGHT: u32 = 600;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Bounding box and encoder settings for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Turns arbitrary uploads into compact, upright JPEGs inside a bounding box.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Validate, decode, orient, shrink and re-encode one upload.
    pub fn normalize(&self, raw: &[u8], filename: &str) -> Result<NormalizedImage, PreprocessError> {
        if filename.is_empty() || raw.is_empty() {
            return Err(PreprocessError::MissingFile);
        }
        if !is_allowed_filename(filename) {
            return Err(PreprocessError::InvalidFileType(filename.to_string()));
        }

        let decoded = image::load_from_memory(raw)
            .map_err(|e| PreprocessError::Decode(e.to_string()))?;
        let orientation = read_exif_orientation(raw);
        let upright = apply_orientation(decoded, orientation);

        let (orig_w, orig_h) = upright.dimensions();
        let (width, height) = fit_within(
            orig_w,
            orig_h,
            self.config.max_width,
            self.config.max_height,
        );
        let resized = if (width, height) == (orig_w, orig_h) {
            upright
        } else {
            upright.resize_exact(width, height, FilterType::Triangle)
        };

        let jpeg = encode_jpeg(resized, self.config.jpeg_quality)?;

        debug!(
            filename,
            sniffed = sniff_mime(raw).unwrap_or("unknown"),
            orientation,
            original = format!("{orig_w}x{orig_h}"),
            output = format!("{width}x{height}"),
            "Image normalized"
        );
        info!(
            before_bytes = raw.len(),
            after_bytes = jpeg.len(),
            "Image size before/after normalization"
        );

        Ok(NormalizedImage {
            jpeg,
            width,
            height,
            original_size: raw.len(),
        })
    }
}

/// Largest size that fits `max_w` x `max_h` with the same aspect ratio.
///
/// Images already inside the box are returned unchanged; never upscales.
pub fn fit_within(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if w <= max_w && h <= max_h {
        return (w, h);
    }
    let scale = f64::min(max_w as f64 / w as f64, max_h as f64 / h as f64);
    let fit_w = ((w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let fit_h = ((h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (fit_w, fit_h)
}

fn encode_jpeg(img: DynamicImage, quality: u8) -> Result<Vec<u8>, PreprocessError> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(jpeg)
}
