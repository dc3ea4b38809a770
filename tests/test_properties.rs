//! Property-Based Tests
//!
//! Invariants that must hold for arbitrary token layouts and boxes:
//! - Section boxes stay inside the frame
//! - Section ids are gapless and every token is used at most once
//! - Clustering does not depend on input order
//! - Validated crops never leave the frame and respect the minimum size

use proptest::prelude::*;
use screen_sections::blocks::VisualBlock;
use screen_sections::config::{CropConfig, ProximityConfig};
use screen_sections::crop::CropValidator;
use screen_sections::geometry::{FrameSize, PercentBox, Rect};
use screen_sections::ocr::TextToken;
use screen_sections::sectioning::{
    map_tokens_to_blocks, ProximityClusteringStrategy, SectioningContext, SectioningStrategy,
};
use screen_sections::Section;

const WORDS: &[&str] = &[
    "Shop", "now", "FAQ", "Benefits", "free shipping on all orders", "30-day returns", "About us",
    "Clinically proven formula for radiant skin",
];

fn arb_token() -> impl Strategy<Value = TextToken> {
    (0..WORDS.len(), 0.0..900.0f64, 0.0..1900.0f64, 5.0..100.0f64, 5.0..40.0f64, 31u8..=100)
        .prop_map(|(w, x, y, width, height, conf)| TextToken::new(WORDS[w], x, y, width, height, conf))
}

fn arb_block() -> impl Strategy<Value = VisualBlock> {
    (0.0..900.0f64, 0.0..1900.0f64, 10.0..100.0f64, 10.0..100.0f64)
        .prop_map(|(x, y, w, h)| VisualBlock::new(x, y, w, h))
}

fn assert_well_formed(sections: &[Section]) -> Result<(), TestCaseError> {
    for (idx, section) in sections.iter().enumerate() {
        prop_assert_eq!(&section.id, &format!("section_{}", idx + 1));
        prop_assert!(section.bounding_box_percent.is_within_frame(1e-9), "{:?}", section.bounding_box_percent);
        prop_assert!(section.has_text);
        prop_assert!(!section.text.is_empty());
    }
    Ok(())
}

proptest! {
    #[test]
    fn proptest_proximity_sections_well_formed(tokens in prop::collection::vec(arb_token(), 0..60)) {
        let frame = FrameSize::new(1000, 2000);
        let strategy = ProximityClusteringStrategy::new(ProximityConfig::default());
        let sections = strategy.sectionize(&tokens, &SectioningContext::new(frame)).unwrap();

        assert_well_formed(&sections)?;
        let placed: usize = sections.iter().map(|s| s.element_count).sum();
        prop_assert_eq!(placed, tokens.len());
    }

    #[test]
    fn proptest_proximity_ignores_input_order(tokens in prop::collection::vec(arb_token(), 0..40)) {
        let frame = FrameSize::new(1000, 2000);
        let strategy = ProximityClusteringStrategy::new(ProximityConfig::default());
        let context = SectioningContext::new(frame);

        let mut reversed = tokens.clone();
        reversed.reverse();
        let forward = strategy.sectionize(&tokens, &context).unwrap();
        let backward = strategy.sectionize(&reversed, &context).unwrap();

        // Tokens sharing an exact position may swap text order; geometry may not change
        prop_assert_eq!(forward.len(), backward.len());
        for (a, b) in forward.iter().zip(&backward) {
            prop_assert_eq!(a.bounding_box_pixel, b.bounding_box_pixel);
            prop_assert_eq!(a.element_count, b.element_count);
        }
    }

    #[test]
    fn proptest_block_mapping_uses_tokens_once(
        tokens in prop::collection::vec(arb_token(), 0..60),
        blocks in prop::collection::vec(arb_block(), 0..12),
    ) {
        let frame = FrameSize::new(1000, 2000);
        let mapping = map_tokens_to_blocks(&blocks, &tokens, frame, false);

        assert_well_formed(&mapping.sections)?;
        let placed: usize = mapping.sections.iter().map(|s| s.element_count).sum();
        prop_assert_eq!(placed, mapping.assigned_tokens);
        prop_assert!(mapping.assigned_tokens <= tokens.len());
        prop_assert!(mapping.sections.len() <= blocks.len());
    }

    #[test]
    fn proptest_crop_inside_frame(
        x in -50.0..150.0f64,
        y in -50.0..150.0f64,
        w in -10.0..200.0f64,
        h in -10.0..200.0f64,
        fw in 1u32..3000,
        fh in 1u32..3000,
    ) {
        let validator = CropValidator::new(CropConfig::default());
        let crop = validator.validate(&PercentBox::new(x, y, w, h), FrameSize::new(fw, fh));

        prop_assert!(crop.x_px + crop.width_px <= fw);
        prop_assert!(crop.y_px + crop.height_px <= fh);
        prop_assert!(crop.width_px >= 1 && crop.height_px >= 1);
        prop_assert!(crop.width_px >= 50u32.min(fw - crop.x_px));
        prop_assert!(crop.height_px >= 50u32.min(fh - crop.y_px));
        prop_assert!(crop.percent.x >= 0.0 && crop.percent.x + crop.percent.width <= 100.0 + 1e-9);
    }

    #[test]
    fn proptest_percent_round_trip(
        x in 0.0..500.0f64,
        y in 0.0..500.0f64,
        w in 0.0..500.0f64,
        h in 0.0..500.0f64,
    ) {
        let frame = FrameSize::new(1000, 1000);
        let rect = Rect::new(x, y, w, h);
        let back = PercentBox::from_pixel_rect(&rect, frame).to_pixel_rect(frame);
        prop_assert!((back.x - x).abs() < 1e-6);
        prop_assert!((back.y - y).abs() < 1e-6);
        prop_assert!((back.width - w).abs() < 1e-6);
        prop_assert!((back.height - h).abs() < 1e-6);
    }
}
