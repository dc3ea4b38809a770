//! Integration tests for crop validation and export.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use screen_sections::config::CropConfig;
use screen_sections::crop::{crop_section, export_crops, CropValidator};
use screen_sections::geometry::{FrameSize, PercentBox, Rect};
use screen_sections::Section;

fn section(id: &str, pct: PercentBox, frame: FrameSize) -> Section {
    Section {
        id: id.to_string(),
        text: "text".to_string(),
        bounding_box_percent: pct,
        bounding_box_pixel: pct.to_pixel_rect(frame),
        word_count: 1,
        element_count: 1,
        confidence: None,
        has_text: true,
    }
}

#[test]
fn test_overflowing_box_clamps_then_grows() {
    let validator = CropValidator::default();
    let overflowing = PercentBox::new(95.0, 95.0, 20.0, 20.0);

    // 5% of 600 is 30px: grown to 50, but only 30px remain past the anchor
    let crop = validator.validate(&overflowing, FrameSize::new(600, 600));
    assert_eq!(crop.percent.x, 95.0);
    assert_eq!(crop.percent.y, 95.0);
    assert_eq!((crop.x_px, crop.y_px), (570, 570));
    assert_eq!((crop.width_px, crop.height_px), (30, 30));

    // Large frame: 5% is already above the minimum
    let crop = validator.validate(&overflowing, FrameSize::new(4000, 4000));
    assert_eq!((crop.x_px, crop.width_px), (3800, 200));
    assert!((crop.percent.width - 5.0).abs() < 1e-9);
}

#[test]
fn test_high_resolution_frame_keeps_requested_size() {
    let validator = CropValidator::default();
    let crop = validator.validate(&PercentBox::new(25.0, 10.0, 50.0, 2.0), FrameSize::new(2732, 20000));
    assert_eq!(crop.x_px, 683);
    assert_eq!(crop.width_px, 1366);
    assert_eq!(crop.height_px, 400);
}

#[test]
fn test_custom_minimum() {
    let validator = CropValidator::new(CropConfig { min_size_px: 10 });
    let crop = validator.validate(&PercentBox::new(0.0, 0.0, 1.0, 1.0), FrameSize::new(500, 500));
    assert_eq!((crop.width_px, crop.height_px), (10, 10));
}

#[test]
fn test_crop_stays_inside_frame() {
    let validator = CropValidator::default();
    let frame = FrameSize::new(321, 123);
    for &(x, y, w, h) in &[
        (0.0, 0.0, 100.0, 100.0),
        (99.9, 99.9, 0.0, 0.0),
        (50.0, 50.0, 80.0, 80.0),
        (-10.0, 120.0, 5.0, 5.0),
    ] {
        let crop = validator.validate(&PercentBox::new(x, y, w, h), frame);
        assert!(crop.x_px + crop.width_px <= frame.width, "{:?}", crop);
        assert!(crop.y_px + crop.height_px <= frame.height, "{:?}", crop);
        assert!(crop.width_px >= 1 && crop.height_px >= 1, "{:?}", crop);
    }
}

#[test]
fn test_crop_pixels_match_source() {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(100, 100, |x, y| {
        Rgb([x as u8, y as u8, 0])
    }));
    let crop = CropValidator::default().validate(&PercentBox::new(10.0, 20.0, 60.0, 60.0), FrameSize::new(100, 100));
    let piece = crop_section(&image, &crop);

    assert_eq!(piece.dimensions(), (60, 60));
    assert_eq!(piece.get_pixel(0, 0).0[..3], [10, 20, 0]);
}

#[test]
fn test_export_writes_one_png_per_section() {
    let dir = tempfile::tempdir().unwrap();
    let frame = FrameSize::new(200, 400);
    let image = DynamicImage::new_rgb8(frame.width, frame.height);
    let sections = vec![
        section("section_1", PercentBox::new(0.0, 0.0, 100.0, 25.0), frame),
        section("section_2", PercentBox::new(0.0, 50.0, 50.0, 1.0), frame),
    ];

    let written = export_crops(&image, &sections, "landing", dir.path(), &CropValidator::default()).unwrap();

    assert_eq!(written.len(), 2);
    assert_eq!(written[0].0, "section_1");
    assert!(written[0].1.ends_with("landing_section_1.png"));
    let second = image::open(&written[1].1).unwrap();
    assert_eq!(second.dimensions(), (100, 50));
    assert_eq!(sections[0].bounding_box_pixel, Rect::new(0.0, 0.0, 200.0, 100.0));
}
