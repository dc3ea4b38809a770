//! The section record shared by all strategies.

use serde::{Deserialize, Serialize};

use crate::geometry::{FrameSize, PercentBox, Rect};
use crate::ocr::TextToken;

/// Identifier of the `n`-th emitted section (1-based).
pub fn section_id(n: usize) -> String {
    format!("section_{}", n)
}

/// A region of the page with its aggregated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// `section_1..section_N`, unique and gapless in output order
    pub id: String,
    /// Token texts in reading order joined by single spaces
    pub text: String,
    /// Bounding box relative to the frame
    pub bounding_box_percent: PercentBox,
    /// Bounding box in pixels
    pub bounding_box_pixel: Rect,
    /// Whitespace-separated words in `text`
    pub word_count: usize,
    /// Number of tokens aggregated into this section
    pub element_count: usize,
    /// Mean token confidence (proximity clustering only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// False for placeholder sections emitted from empty blocks
    pub has_text: bool,
}

impl Section {
    /// Build a section from tokens already in reading order.
    pub(crate) fn from_tokens(
        id: String,
        tokens: &[&TextToken],
        pixel_box: Rect,
        frame: FrameSize,
    ) -> Self {
        let text = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            id,
            word_count: text.split_whitespace().count(),
            element_count: tokens.len(),
            has_text: !text.is_empty(),
            text,
            bounding_box_percent: PercentBox::from_pixel_rect(&pixel_box, frame),
            bounding_box_pixel: pixel_box,
            confidence: None,
        }
    }

    /// Placeholder for a region without recognized text.
    pub(crate) fn empty(id: String, pixel_box: Rect, frame: FrameSize) -> Self {
        Self::from_tokens(id, &[], pixel_box, frame)
    }
}
