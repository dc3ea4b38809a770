// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Screen Sections
//!
//! Visual layout segmentation for long web-page screenshots: split a raster
//! page into content sections with their text, ready for copy review and
//! per-section cropping.
//!
//! ## Core Features
//!
//! - **Text Tokens**: OCR behind a pluggable backend (Tesseract CLI included),
//!   Otsu binarization and confidence filtering
//! - **Visual Blocks**: adaptive thresholding, rectangular dilation and outer
//!   contour detection, or whitespace band detection
//! - **Two Sectioning Strategies**: block mapping and proximity clustering,
//!   with automatic fallback between them
//! - **Crop Validation**: percentage boxes normalized into safe pixel crops
//! - **Semantic Labeling**: prompt building and tolerant response parsing for
//!   an external language model
//!
//! ## Quick Start
//!
//! ```ignore
//! use screen_sections::blocks::ImageprocContours;
//! use screen_sections::ocr::TesseractCli;
//! use screen_sections::{ImageFrame, SectionEngine, SegmentationConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = ImageFrame::open("landing_page.png")?;
//! let engine = SectionEngine::new(
//!     Box::new(TesseractCli::new()),
//!     Box::new(ImageprocContours),
//!     SegmentationConfig::default(),
//! )?;
//!
//! let outcome = engine.analyze(&frame)?;
//! for section in &outcome.sections {
//!     println!("{} @ {:.1}%: {}", section.id, section.bounding_box_percent.y, section.text);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core types
pub mod config;
pub mod frame;
pub mod geometry;

// Pipeline stages
pub mod blocks;
pub mod imaging;
pub mod ocr;
pub mod sectioning;

// Output handling
pub mod crop;
pub mod labeling;
pub mod overlay;

// Orchestration
pub mod engine;

// Re-exports
pub use config::{SegmentationConfig, StrategyType};
pub use engine::{AnalysisOutcome, LabeledOutcome, NoSectionsCause, SectionEngine};
pub use error::{Error, Result};
pub use frame::ImageFrame;
pub use geometry::{FrameSize, PercentBox, Rect};
pub use sectioning::{Section, StrategyKind};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all other values.
    /// This ensures that sorting operations never panic due to NaN comparisons.
    #[inline]
    pub fn safe_float_cmp(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater, // NaN > all numbers
            (false, true) => Ordering::Less,    // all numbers < NaN
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
