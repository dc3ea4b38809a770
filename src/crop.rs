//! Crop rectangle validation and pixel crop export.
//!
//! Section boxes may come back edited (or invented) by a downstream consumer,
//! so they are re-validated against the frame before any pixels are cut.
//! The order of operations matters near the frame edges:
//!
//! 1. clamp `x`/`y` into `[0, 100]`, then `width`/`height` into `[1, 100 - x]`
//! 2. scale to pixels (truncating)
//! 3. grow a side below the minimum, never past the far edge from the anchor
//! 4. shrink anything that still overflows the frame

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::config::CropConfig;
use crate::error::Result;
use crate::geometry::{FrameSize, PercentBox};
use crate::sectioning::Section;

/// A crop rectangle guaranteed to lie inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCrop {
    /// Left edge in pixels
    pub x_px: u32,
    /// Top edge in pixels
    pub y_px: u32,
    /// Width in pixels
    pub width_px: u32,
    /// Height in pixels
    pub height_px: u32,
    /// The adjusted box in percentages
    pub percent: PercentBox,
}

/// Normalizes percentage boxes into crop rectangles.
#[derive(Debug, Clone, Default)]
pub struct CropValidator {
    config: CropConfig,
}

impl CropValidator {
    /// Create a validator.
    pub fn new(config: CropConfig) -> Self {
        Self { config }
    }

    /// Validate `bbox` against a frame. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use screen_sections::crop::CropValidator;
    /// use screen_sections::geometry::{FrameSize, PercentBox};
    ///
    /// let crop = CropValidator::default()
    ///     .validate(&PercentBox::new(95.0, 95.0, 20.0, 20.0), FrameSize::new(1000, 1000));
    /// assert_eq!((crop.x_px, crop.y_px), (950, 950));
    /// assert_eq!((crop.width_px, crop.height_px), (50, 50));
    /// ```
    pub fn validate(&self, bbox: &PercentBox, frame: FrameSize) -> ValidatedCrop {
        let x = clamp_percent(bbox.x, 0.0, 100.0);
        let y = clamp_percent(bbox.y, 0.0, 100.0);
        let width = clamp_percent(bbox.width, 0.0, 100.0 - x).max(1.0);
        let height = clamp_percent(bbox.height, 0.0, 100.0 - y).max(1.0);
        // Only possible right at the far edge, where the 1% floor wins
        let x = x.min(100.0 - width);
        let y = y.min(100.0 - height);

        let (x_px, width_px, width) = fit_axis(x, width, frame.width, self.config.min_size_px);
        let (y_px, height_px, height) = fit_axis(y, height, frame.height, self.config.min_size_px);

        ValidatedCrop {
            x_px,
            y_px,
            width_px,
            height_px,
            percent: PercentBox::new(x, y, width, height),
        }
    }

    /// Validate every section's percent box.
    pub fn validate_sections(&self, sections: &[Section], frame: FrameSize) -> Vec<(String, ValidatedCrop)> {
        sections
            .iter()
            .map(|s| (s.id.clone(), self.validate(&s.bounding_box_percent, frame)))
            .collect()
    }
}

/// NaN collapses to the lower bound.
fn clamp_percent(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Scale one axis to pixels, grow it to the minimum and clip it to the frame.
///
/// Returns `(start_px, extent_px, extent_percent)`.
fn fit_axis(start: f64, extent: f64, frame_extent: u32, min_px: u32) -> (u32, u32, f64) {
    if frame_extent == 0 {
        return (0, 0, extent);
    }
    let total = frame_extent as f64;
    let start_px = ((start / 100.0 * total) as u32).min(frame_extent - 1);
    let mut extent_px = (extent / 100.0 * total) as u32;
    let mut extent_pct = extent;

    if extent_px < min_px {
        extent_px = min_px.min(frame_extent - start_px);
        extent_pct = (extent_px as f64 / total * 100.0).min(100.0 - start);
    }
    if start_px + extent_px > frame_extent {
        extent_px = frame_extent - start_px;
        extent_pct = (extent_px as f64 / total * 100.0).min(100.0 - start);
    }
    (start_px, extent_px, extent_pct)
}

/// Cut the validated rectangle out of the image.
pub fn crop_section(image: &DynamicImage, crop: &ValidatedCrop) -> DynamicImage {
    image.crop_imm(crop.x_px, crop.y_px, crop.width_px, crop.height_px)
}

/// Encode an image as base64 PNG for inline display.
pub fn encode_png_base64(image: &DynamicImage) -> Result<String> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(STANDARD.encode(&png))
}

/// Write one PNG per section into `dir` as `{stem}_{section id}.png`.
///
/// Returns the written paths keyed by section id, in section order.
pub fn export_crops(
    image: &DynamicImage,
    sections: &[Section],
    stem: &str,
    dir: &Path,
    validator: &CropValidator,
) -> Result<Vec<(String, PathBuf)>> {
    std::fs::create_dir_all(dir)?;
    let frame = FrameSize::new(image.width(), image.height());

    let mut written = Vec::with_capacity(sections.len());
    for (id, crop) in validator.validate_sections(sections, frame) {
        let path = dir.join(format!("{}_{}.png", stem, id));
        crop_section(image, &crop).save_with_format(&path, ImageFormat::Png)?;
        log::debug!(
            "{}: cropped {}x{} at ({}, {}) -> {}",
            id,
            crop.width_px,
            crop.height_px,
            crop.x_px,
            crop.y_px,
            path.display()
        );
        written.push((id, path));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn validate(x: f64, y: f64, w: f64, h: f64, frame: FrameSize) -> ValidatedCrop {
        CropValidator::default().validate(&PercentBox::new(x, y, w, h), frame)
    }

    #[test]
    fn test_plain_box_scales() {
        let crop = validate(10.0, 20.0, 50.0, 25.0, FrameSize::new(1000, 800));
        assert_eq!((crop.x_px, crop.y_px, crop.width_px, crop.height_px), (100, 160, 500, 200));
        assert_eq!(crop.percent, PercentBox::new(10.0, 20.0, 50.0, 25.0));
    }

    #[test]
    fn test_overflowing_box_clamped_before_scaling() {
        let crop = validate(95.0, 95.0, 20.0, 20.0, FrameSize::new(2000, 2000));
        assert_eq!(crop.percent.x, 95.0);
        // 5% of 2000 = 100px, already above the minimum
        assert_eq!((crop.x_px, crop.width_px), (1900, 100));
        assert_eq!((crop.y_px, crop.height_px), (1900, 100));
    }

    #[test]
    fn test_small_box_grows_to_minimum() {
        let crop = validate(10.0, 10.0, 1.0, 1.0, FrameSize::new(1000, 1000));
        assert_eq!((crop.width_px, crop.height_px), (50, 50));
        assert!((crop.percent.width - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_growth_stops_at_far_edge() {
        // 98% of 1000 = 980, only 20px remain
        let crop = validate(98.0, 0.0, 1.0, 100.0, FrameSize::new(1000, 600));
        assert_eq!(crop.x_px, 980);
        assert_eq!(crop.width_px, 20);
        assert_eq!(crop.height_px, 600);
    }

    #[test]
    fn test_negative_and_nan_inputs() {
        let crop = validate(-20.0, f64::NAN, 500.0, -3.0, FrameSize::new(400, 300));
        assert_eq!((crop.x_px, crop.y_px), (0, 0));
        assert_eq!(crop.width_px, 400);
        assert_eq!(crop.height_px, 50);
    }

    #[test]
    fn test_far_edge_anchor_stays_inside() {
        let crop = validate(100.0, 100.0, 10.0, 10.0, FrameSize::new(500, 500));
        assert!(crop.x_px + crop.width_px <= 500);
        assert!(crop.width_px >= 1);
        assert!(crop.percent.x + crop.percent.width <= 100.0 + 1e-9);
    }

    #[test]
    fn test_thumbnail_smaller_than_minimum() {
        let crop = validate(0.0, 0.0, 10.0, 10.0, FrameSize::new(30, 20));
        assert_eq!((crop.width_px, crop.height_px), (30, 20));
    }

    #[test]
    fn test_empty_frame() {
        let crop = validate(0.0, 0.0, 10.0, 10.0, FrameSize::new(0, 0));
        assert_eq!((crop.width_px, crop.height_px), (0, 0));
    }

    #[test]
    fn test_crop_and_encode() {
        let image = DynamicImage::new_rgb8(200, 100);
        let crop = validate(50.0, 50.0, 25.0, 50.0, FrameSize::new(200, 100));
        let piece = crop_section(&image, &crop);
        assert_eq!((piece.width(), piece.height()), (50, 50));

        let encoded = encode_png_base64(&piece).unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
