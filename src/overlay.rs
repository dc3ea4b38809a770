//! Debug rendering of section boxes on top of the source image.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as PixelRect;

use crate::geometry::Rect;

const PALETTE: [Rgb<u8>; 4] = [
    Rgb([230, 25, 75]),
    Rgb([60, 180, 75]),
    Rgb([0, 130, 200]),
    Rgb([245, 130, 48]),
];

/// Outline each rectangle on an RGB copy of the image.
///
/// Boxes are drawn with a 2px border cycling through a small palette so
/// adjacent sections stay distinguishable. Rectangles with no area are skipped.
pub fn draw_section_overlay(image: &DynamicImage, rects: &[Rect]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for (idx, rect) in rects.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        for inset in 0..2 {
            let inset = inset as f64;
            let width = (rect.width - 2.0 * inset).round();
            let height = (rect.height - 2.0 * inset).round();
            if width < 1.0 || height < 1.0 {
                continue;
            }
            let outline = PixelRect::at((rect.x + inset).round() as i32, (rect.y + inset).round() as i32)
                .of_size(width as u32, height as u32);
            draw_hollow_rect_mut(&mut canvas, outline, color);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_drawn_interior_untouched() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([255, 255, 255])));
        let canvas = draw_section_overlay(&image, &[Rect::new(10.0, 10.0, 20.0, 20.0)]);
        assert_eq!(*canvas.get_pixel(10, 10), PALETTE[0]);
        assert_eq!(*canvas.get_pixel(11, 20), PALETTE[0]);
        assert_eq!(*canvas.get_pixel(20, 20), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(5, 5), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_degenerate_rect_skipped() {
        let image = DynamicImage::new_rgb8(10, 10);
        let canvas = draw_section_overlay(&image, &[Rect::new(2.0, 2.0, 0.0, 5.0)]);
        assert!(canvas.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
