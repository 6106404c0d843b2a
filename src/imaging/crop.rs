/// Center-crop to a target aspect ratio
///
/// The crop keeps as much of the source as possible: the longer axis (relative
/// to the target ratio) is trimmed equally on both sides.

use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;

use super::data_url::DataUrl;
use crate::error::{Result, StudioError};
use crate::state::aspect::AspectRatio;

/// Source rectangle in (possibly fractional) pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Source rectangle snapped to whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Snap to whole pixels inside a `source_width` x `source_height` image
    ///
    /// Sizes are truncated (at least 1px), offsets rounded, then clamped so the
    /// rectangle never leaves the source.
    pub fn to_pixels(&self, source_width: u32, source_height: u32) -> PixelRect {
        let width = (self.width.floor() as u32).clamp(1, source_width.max(1));
        let height = (self.height.floor() as u32).clamp(1, source_height.max(1));
        let x = (self.x.round().max(0.0) as u32).min(source_width.saturating_sub(width));
        let y = (self.y.round().max(0.0) as u32).min(source_height.saturating_sub(height));
        PixelRect { x, y, width, height }
    }
}

/// Compute the centered crop rectangle for `target_ratio` (width / height)
///
/// Returns `None` for an empty source or a non-positive ratio.
pub fn center_crop_rect(source_width: u32, source_height: u32, target_ratio: f64) -> Option<CropRect> {
    if source_width == 0 || source_height == 0 || !(target_ratio > 0.0) || !target_ratio.is_finite() {
        return None;
    }

    let width = source_width as f64;
    let height = source_height as f64;
    let source_ratio = width / height;

    let rect = if source_ratio > target_ratio {
        // Wider than target: trim left and right
        let crop_width = height * target_ratio;
        CropRect {
            x: (width - crop_width) / 2.0,
            y: 0.0,
            width: crop_width,
            height,
        }
    } else {
        // Taller than (or equal to) target: trim top and bottom
        let crop_height = width / target_ratio;
        CropRect {
            x: 0.0,
            y: (height - crop_height) / 2.0,
            width,
            height: crop_height,
        }
    };

    Some(rect)
}

/// Crop an encoded image and re-encode it as JPEG
///
/// Runs on the blocking pool because decoding and encoding are CPU-bound.
pub async fn crop_image(source: DataUrl, ratio: AspectRatio, jpeg_quality: u8) -> Result<DataUrl> {
    tokio::task::spawn_blocking(move || crop_image_blocking(&source, ratio, jpeg_quality))
        .await
        .map_err(|e| StudioError::Crop(format!("Task join error: {}", e)))?
}

/// Blocking implementation of the crop
pub fn crop_image_blocking(source: &DataUrl, ratio: AspectRatio, jpeg_quality: u8) -> Result<DataUrl> {
    let bytes = source
        .decode()
        .map_err(|_| StudioError::Crop("source is not valid base64".into()))?;

    let img = image::load_from_memory(&bytes)
        .map_err(|e| StudioError::Crop(format!("Failed to decode {}: {}", source.mime_type, e)))?;

    let rect = center_crop_rect(img.width(), img.height(), ratio.value())
        .ok_or_else(|| StudioError::Crop(format!("empty image ({}x{})", img.width(), img.height())))?;
    let px = rect.to_pixels(img.width(), img.height());

    // JPEG has no alpha channel
    let cropped = img.crop_imm(px.x, px.y, px.width, px.height).to_rgb8();

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, jpeg_quality.clamp(1, 100))
        .encode_image(&cropped)
        .map_err(|e| StudioError::Crop(format!("JPEG encode failed: {}", e)))?;

    log::info!(
        "✂️  Cropped {}x{} -> {}x{} at ({}, {}) for {}",
        img.width(),
        img.height(),
        px.width,
        px.height,
        px.x,
        px.y,
        ratio
    );

    Ok(DataUrl::from_bytes("image/jpeg", &buffer.into_inner()))
}
