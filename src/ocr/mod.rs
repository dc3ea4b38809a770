//! Text token extraction.
//!
//! The OCR engine itself is an external collaborator behind [`OcrBackend`].
//! [`TextTokenExtractor`] prepares the image for it (grayscale + Otsu
//! binarization, falling back to the untouched image when preprocessing
//! fails) and filters its raw output down to confident, non-empty tokens.
//!
//! ```text
//! ImageFrame ──► grayscale ──► Otsu binarize ──► OcrBackend ──► RawToken[]
//!                                  │ (failure)        ▲               │
//!                                  └──── raw image ───┘      filter (conf > 30, non-empty)
//!                                                                     ▼
//!                                                               TextToken[]
//! ```

mod tesseract;

pub use tesseract::{parse_tsv, TesseractCli};

use std::borrow::Cow;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::config::OcrConfig;
use crate::error::Result;
use crate::frame::ImageFrame;
use crate::geometry::Rect;
use crate::imaging::binarize_otsu;

/// One record as reported by an OCR backend, before any filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    /// Recognized text (may be empty or whitespace)
    pub text: String,
    /// Left edge in pixels
    pub left: i32,
    /// Top edge in pixels
    pub top: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Backend confidence on a 0-100 scale (negative for non-word rows)
    pub confidence: f32,
}

impl RawToken {
    /// Convenience constructor.
    pub fn new(text: &str, left: i32, top: i32, width: u32, height: u32, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            left,
            top,
            width,
            height,
            confidence,
        }
    }
}

/// A recognized word with its pixel box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    /// Trimmed, non-empty text
    pub text: String,
    /// Pixel bounding box (top-left origin)
    pub bbox: Rect,
    /// Confidence on a 0-100 scale
    pub confidence: u8,
}

impl TextToken {
    /// Build a token directly from pixel coordinates.
    pub fn new(text: &str, x: f64, y: f64, width: f64, height: f64, confidence: u8) -> Self {
        Self {
            text: text.to_string(),
            bbox: Rect::new(x, y, width, height),
            confidence,
        }
    }

    /// Number of whitespace-separated words in the token text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// An OCR engine able to turn an image into positioned word records.
///
/// Implementations are treated as pure (if slow) functions of the image.
/// A backend that cannot be invoked at all must report
/// [`Error::OcrUnavailable`](crate::error::Error::OcrUnavailable).
pub trait OcrBackend: Send + Sync {
    /// Recognize all words in the image.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawToken>>;

    /// Return the name of this backend for logging.
    fn name(&self) -> &'static str;
}

/// Keep confident, non-empty tokens.
///
/// Confidence is truncated to an integer before comparing, and tokens at or
/// below `min_confidence` are dropped as noise.
pub fn filter_tokens(raw: Vec<RawToken>, min_confidence: i32) -> Vec<TextToken> {
    raw.into_iter()
        .filter_map(|token| {
            let text = token.text.trim();
            let confidence = token.confidence.trunc() as i32;
            if text.is_empty() || confidence <= min_confidence {
                return None;
            }
            Some(TextToken {
                text: text.to_string(),
                bbox: Rect::new(
                    token.left as f64,
                    token.top as f64,
                    token.width as f64,
                    token.height as f64,
                ),
                confidence: confidence.clamp(0, 100) as u8,
            })
        })
        .collect()
}

/// Runs an OCR backend over a frame and returns filtered tokens.
pub struct TextTokenExtractor {
    backend: Box<dyn OcrBackend>,
    config: OcrConfig,
}

impl TextTokenExtractor {
    /// Create an extractor around a backend.
    pub fn new(backend: Box<dyn OcrBackend>, config: OcrConfig) -> Self {
        Self { backend, config }
    }

    /// Extract tokens from the frame.
    ///
    /// Returns an empty list when nothing clears the confidence cutoff, and
    /// propagates `OcrUnavailable` untouched so the caller can report it.
    pub fn extract(&self, frame: &ImageFrame) -> Result<Vec<TextToken>> {
        let prepared = self.prepare(frame);
        let raw = self.backend.recognize(&prepared)?;
        let total = raw.len();
        let tokens = filter_tokens(raw, self.config.min_confidence);
        log::info!(
            "{} returned {} records, {} tokens kept (confidence > {})",
            self.backend.name(),
            total,
            tokens.len(),
            self.config.min_confidence
        );
        Ok(tokens)
    }

    fn prepare<'a>(&self, frame: &'a ImageFrame) -> Cow<'a, DynamicImage> {
        if !self.config.binarize {
            return Cow::Borrowed(frame.image());
        }
        match binarize_otsu(&frame.to_gray()) {
            Ok(binary) => {
                log::debug!("Image binarized for OCR with Otsu's method");
                Cow::Owned(DynamicImage::ImageLuma8(binary))
            },
            Err(e) => {
                log::warn!("Could not preprocess image ({}), using original", e);
                Cow::Borrowed(frame.image())
            },
        }
    }

    /// Name of the wrapped backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
