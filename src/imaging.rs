//! Raster preprocessing shared by the OCR extractor and the block detectors.
//!
//! Binary images use 255 for foreground and 0 for background.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::definitions::Image;
use imageproc::integral_image::integral_image;

use crate::error::{Error, Result};

/// Binarize with a global Otsu threshold.
///
/// Pixels brighter than the level chosen by Otsu's method become 255, the
/// rest 0. Fails on zero-sized input so callers can fall back to the raw image.
pub fn binarize_otsu(gray: &GrayImage) -> Result<GrayImage> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::Preprocess(format!(
            "cannot binarize a {}x{} image",
            width, height
        )));
    }
    let level = otsu_level(gray);
    log::trace!("Otsu level {}", level);
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > level { 255 } else { 0 };
    }
    Ok(out)
}

/// Local mean thresholding.
///
/// The threshold at each pixel is the mean of the `block_size` x `block_size`
/// neighbourhood (clipped at the image border) minus `c`. With `invert` set,
/// pixels at or below the threshold become foreground; otherwise pixels
/// above it do.
pub fn adaptive_threshold_mean(gray: &GrayImage, block_size: u32, c: i32, invert: bool) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    // (width + 1) x (height + 1); first row and column are zero
    let integral: Image<Luma<u64>> = integral_image(gray);
    let radius = block_size / 2;

    for y in 0..height {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(height);
        for x in 0..width {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(width);

            let sum = (integral.get_pixel(x1, y1).0[0] + integral.get_pixel(x0, y0).0[0])
                - (integral.get_pixel(x0, y1).0[0] + integral.get_pixel(x1, y0).0[0]);
            let count = ((x1 - x0) * (y1 - y0)) as f64;
            let threshold = sum as f64 / count - c as f64;

            let value = gray.get_pixel(x, y).0[0] as f64;
            let foreground = if invert {
                value <= threshold
            } else {
                value > threshold
            };
            if foreground {
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }
    out
}

/// Binary dilation with a `kernel_width` x `kernel_height` rectangle.
///
/// The kernel anchor sits at its center (`kernel_width / 2`, `kernel_height / 2`).
/// The rectangle is separable, so each pass runs a horizontal then a vertical
/// max filter.
pub fn dilate_rect(
    binary: &GrayImage,
    kernel_width: u32,
    kernel_height: u32,
    iterations: u32,
) -> GrayImage {
    let mut current = binary.clone();
    for _ in 0..iterations {
        let horizontal = max_filter_horizontal(&current, kernel_width);
        current = max_filter_vertical(&horizontal, kernel_height);
    }
    current
}

fn max_filter_horizontal(src: &GrayImage, kernel: u32) -> GrayImage {
    let (width, height) = src.dimensions();
    let anchor = (kernel / 2) as i64;
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let start = (x as i64 - anchor).max(0);
            let end = (x as i64 - anchor + kernel as i64).min(width as i64);
            let mut max = 0u8;
            for sx in start..end {
                max = max.max(src.get_pixel(sx as u32, y).0[0]);
                if max == 255 {
                    break;
                }
            }
            out.put_pixel(x, y, Luma([max]));
        }
    }
    out
}

fn max_filter_vertical(src: &GrayImage, kernel: u32) -> GrayImage {
    let (width, height) = src.dimensions();
    let anchor = (kernel / 2) as i64;
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let start = (y as i64 - anchor).max(0);
        let end = (y as i64 - anchor + kernel as i64).min(height as i64);
        for x in 0..width {
            let mut max = 0u8;
            for sy in start..end {
                max = max.max(src.get_pixel(x, sy as u32).0[0]);
                if max == 255 {
                    break;
                }
            }
            out.put_pixel(x, y, Luma([max]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_image() -> GrayImage {
        // Left half dark, right half light
        GrayImage::from_fn(20, 10, |x, _| if x < 10 { Luma([20]) } else { Luma([230]) })
    }

    #[test]
    fn test_otsu_separates_two_levels() {
        let binary = binarize_otsu(&split_image()).unwrap();
        assert_eq!(binary.get_pixel(2, 5).0[0], 0);
        assert_eq!(binary.get_pixel(17, 5).0[0], 255);
    }

    #[test]
    fn test_otsu_rejects_empty_image() {
        assert!(matches!(binarize_otsu(&GrayImage::new(0, 0)), Err(Error::Preprocess(_))));
    }

    #[test]
    fn test_adaptive_threshold_uniform_image_is_background() {
        let gray = GrayImage::from_pixel(30, 30, Luma([200]));
        let out = adaptive_threshold_mean(&gray, 11, 4, true);
        assert!(out.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_adaptive_threshold_inverted_marks_dark_spot() {
        let mut gray = GrayImage::from_pixel(30, 30, Luma([220]));
        gray.put_pixel(15, 15, Luma([10]));
        let out = adaptive_threshold_mean(&gray, 11, 4, true);
        assert_eq!(out.get_pixel(15, 15).0[0], 255);
        assert_eq!(out.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn test_dilate_rect_grows_point_to_kernel() {
        let mut binary = GrayImage::new(40, 20);
        binary.put_pixel(20, 10, Luma([255]));
        let out = dilate_rect(&binary, 5, 3, 1);

        let lit: Vec<(u32, u32)> = out
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(lit.len(), 15);
        assert!(lit.iter().all(|&(x, y)| (18..=22).contains(&x) && (9..=11).contains(&y)));
    }

    #[test]
    fn test_dilate_iterations_accumulate() {
        let mut binary = GrayImage::new(40, 20);
        binary.put_pixel(20, 10, Luma([255]));
        let once = dilate_rect(&binary, 3, 1, 1);
        let twice = dilate_rect(&binary, 3, 1, 2);
        let count = |img: &GrayImage| img.pixels().filter(|p| p.0[0] == 255).count();
        assert_eq!(count(&once), 3);
        assert_eq!(count(&twice), 5);
    }
}
