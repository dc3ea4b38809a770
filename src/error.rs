//! Error types for the segmentation engine.
//!
//! Only conditions that abort an analysis run (or that a caller must handle
//! explicitly) are errors. Empty block lists, empty token lists and tokens
//! sitting on a block boundary are ordinary outcomes and never show up here.

/// Result type alias for segmentation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while analyzing a page image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source image could not be read or decoded
    #[error("Failed to read image '{path}': {reason}")]
    ImageRead {
        /// Path of the image that failed to load
        path: String,
        /// Decoder or IO failure message
        reason: String,
    },

    /// Image codec error outside of initial loading (e.g. PNG encoding a crop)
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// OCR backend is not installed or cannot be invoked
    #[error("OCR backend unavailable: {0}")]
    OcrUnavailable(String),

    /// OCR backend ran but its output could not be used
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Image preprocessing failed (callers fall back to the raw image)
    #[error("Preprocessing error: {0}")]
    Preprocess(String),

    /// Semantic labeling collaborator failed or returned malformed data
    #[error("Labeling error: {0}")]
    Labeling(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true when the error means the OCR backend could not be reached at all.
    pub fn is_ocr_unavailable(&self) -> bool {
        matches!(self, Error::OcrUnavailable(_))
    }
}
