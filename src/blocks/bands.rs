//! Full-width bands separated by tall whitespace runs.
//!
//! Long landing pages stack their sections vertically with generous padding
//! between them; the horizontal projection profile of the thresholded image
//! drops to (almost) zero across those paddings.

use image::GrayImage;

use crate::config::BandConfig;
use crate::imaging::adaptive_threshold_mean;

/// Split the page into `(start_y, end_y)` row ranges.
///
/// Rows whose normalized ink falls below `whitespace_level` are whitespace.
/// Every whitespace run taller than `min_gap_height` ends a band at the
/// bottom of the run; the final band always reaches the last row. A page
/// without any ink is a single band.
pub fn detect_horizontal_bands(gray: &GrayImage, config: &BandConfig) -> Vec<(u32, u32)> {
    let (_, height) = gray.dimensions();
    if height == 0 {
        return vec![];
    }

    let binary = adaptive_threshold_mean(gray, config.adaptive_block_size, config.adaptive_c, true);
    let profile: Vec<u64> = binary
        .rows()
        .map(|row| row.map(|p| p.0[0] as u64).sum())
        .collect();
    let peak = profile.iter().copied().max().unwrap_or(0);
    if peak == 0 {
        return vec![(0, height)];
    }

    let mut gaps: Vec<(u32, u32)> = Vec::new();
    let mut gap_start: Option<u32> = None;
    for (y, &ink) in profile.iter().enumerate() {
        let y = y as u32;
        let is_white = (ink as f64 / peak as f64) < config.whitespace_level;
        match (is_white, gap_start) {
            (true, None) => gap_start = Some(y),
            (false, Some(start)) => {
                if y - start > config.min_gap_height {
                    gaps.push((start, y));
                }
                gap_start = None;
            },
            _ => {},
        }
    }
    if let Some(start) = gap_start {
        if height - start > config.min_gap_height {
            gaps.push((start, height));
        }
    }

    let mut boundaries = vec![0u32];
    boundaries.extend(gaps.iter().map(|&(_, end)| end));
    if boundaries.last() != Some(&height) {
        boundaries.push(height);
    }

    let bands: Vec<(u32, u32)> = boundaries.windows(2).map(|w| (w[0], w[1])).collect();
    log::debug!("Whitespace gaps {:?} -> {} bands", gaps, bands.len());
    bands
}
