//! Visual block detection.
//!
//! Coarse rectangular regions are found independently of any text content:
//!
//! ```text
//! gray ─► invert ─► blur ─► adaptive threshold ─► dilate (wide, short kernel, N passes)
//!                                                        │
//!                                   ContourBackend (outer contours → bounding rects)
//!                                                        │
//!                         area filter (0.1% < area < 95% of frame) ─► sort by y
//! ```
//!
//! When nothing survives the filter the caller substitutes
//! [`full_frame_block`] so the mapping step always has a candidate.

mod bands;

pub use bands::detect_horizontal_bands;

use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};

use crate::config::{BlockDetectionConfig, BlockSource};
use crate::error::Result;
use crate::frame::ImageFrame;
use crate::geometry::{FrameSize, Rect};
use crate::imaging::{adaptive_threshold_mean, dilate_rect};
use crate::utils::safe_float_cmp;

/// A coarse rectangular region of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualBlock {
    /// Pixel rectangle
    pub bbox: Rect,
}

impl VisualBlock {
    /// Create a block from pixel coordinates.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            bbox: Rect::new(x, y, width, height),
        }
    }
}

/// The synthetic block covering the entire frame.
pub fn full_frame_block(frame: FrameSize) -> VisualBlock {
    VisualBlock {
        bbox: frame.full_rect(),
    }
}

/// Use `blocks` as-is, or the full-frame block when there are none.
pub fn blocks_or_full_frame(blocks: Vec<VisualBlock>, frame: FrameSize) -> Vec<VisualBlock> {
    if blocks.is_empty() {
        log::info!("No visual blocks detected, substituting a full-frame block");
        vec![full_frame_block(frame)]
    } else {
        blocks
    }
}

/// Finds connected foreground regions in a binary image.
///
/// Foreground is any non-zero pixel. Only outermost contours are reported,
/// each reduced to its bounding rectangle.
pub trait ContourBackend: Send + Sync {
    /// Bounding rectangles of the outer contours.
    fn bounding_rects(&self, binary: &GrayImage) -> Result<Vec<Rect>>;

    /// Return the name of this backend for logging.
    fn name(&self) -> &'static str;
}

/// Contour extraction with `imageproc`'s border following.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocContours;

impl ContourBackend for ImageprocContours {
    fn bounding_rects(&self, binary: &GrayImage) -> Result<Vec<Rect>> {
        let contours = find_contours::<i32>(binary);
        let rects = contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter_map(|c| {
                let first = c.points.first()?;
                let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
                for p in &c.points {
                    x0 = x0.min(p.x);
                    y0 = y0.min(p.y);
                    x1 = x1.max(p.x);
                    y1 = y1.max(p.y);
                }
                // Inclusive pixel extents
                Some(Rect::from_points(
                    x0 as f64,
                    y0 as f64,
                    (x1 + 1) as f64,
                    (y1 + 1) as f64,
                ))
            })
            .collect();
        Ok(rects)
    }

    fn name(&self) -> &'static str {
        "imageproc-contours"
    }
}

/// Clip rectangles to the frame and keep those whose area lies strictly
/// inside the configured window, ordered top to bottom.
pub fn filter_blocks(
    rects: Vec<Rect>,
    frame: FrameSize,
    min_area_ratio: f64,
    max_area_ratio: f64,
) -> Vec<VisualBlock> {
    let total = frame.area();
    let min_area = total * min_area_ratio;
    let max_area = total * max_area_ratio;

    let mut blocks: Vec<VisualBlock> = rects
        .into_iter()
        .map(|r| r.clamp_to(frame))
        .filter(|r| {
            let area = r.area();
            area > min_area && area < max_area
        })
        .map(|bbox| VisualBlock { bbox })
        .collect();

    blocks.sort_by(|a, b| {
        safe_float_cmp(a.bbox.y, b.bbox.y).then_with(|| safe_float_cmp(a.bbox.x, b.bbox.x))
    });
    blocks
}

/// Produces the ordered visual block list for a frame.
pub struct VisualBlockDetector {
    backend: Box<dyn ContourBackend>,
    config: BlockDetectionConfig,
}

impl VisualBlockDetector {
    /// Create a detector around a contour backend.
    pub fn new(backend: Box<dyn ContourBackend>, config: BlockDetectionConfig) -> Self {
        Self { backend, config }
    }

    /// Detect blocks, ascending by `y`. May be empty.
    pub fn detect(&self, frame: &ImageFrame) -> Result<Vec<VisualBlock>> {
        let size = frame.size();
        if size.is_empty() {
            return Ok(vec![]);
        }

        let blocks = match self.config.source {
            BlockSource::Contours => {
                let binary = self.preprocess(&frame.to_gray());
                let rects = self.backend.bounding_rects(&binary)?;
                let found = rects.len();
                let blocks = filter_blocks(
                    rects,
                    size,
                    self.config.min_area_ratio,
                    self.config.max_area_ratio,
                );
                log::debug!(
                    "{} found {} contours, {} within the area window",
                    self.backend.name(),
                    found,
                    blocks.len()
                );
                blocks
            },
            BlockSource::HorizontalBands => {
                let gray = blur(&frame.to_gray(), self.config.blur_sigma);
                detect_horizontal_bands(&gray, &self.config.bands)
                    .into_iter()
                    .map(|(start, end)| {
                        VisualBlock::new(0.0, start as f64, size.width as f64, (end - start) as f64)
                    })
                    .collect()
            },
        };

        log::info!("Detected {} visual blocks", blocks.len());
        Ok(blocks)
    }

    /// Binary image handed to the contour backend.
    pub fn preprocess(&self, gray: &GrayImage) -> GrayImage {
        let mut inverted = gray.clone();
        imageops::invert(&mut inverted);
        let blurred = blur(&inverted, self.config.blur_sigma);
        let binary = adaptive_threshold_mean(
            &blurred,
            self.config.adaptive_block_size,
            self.config.adaptive_c,
            true,
        );
        dilate_rect(
            &binary,
            self.config.dilate_kernel_width,
            self.config.dilate_kernel_height,
            self.config.dilate_iterations,
        )
    }
}

fn blur(gray: &GrayImage, sigma: f32) -> GrayImage {
    if sigma > 0.0 {
        gaussian_blur_f32(gray, sigma)
    } else {
        gray.clone()
    }
}
