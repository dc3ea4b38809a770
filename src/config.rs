//! Tunable thresholds for the segmentation pipeline.
//!
//! Every heuristic constant used by the extractor, the block detector, the
//! proximity engine and the crop validator lives here so it can be injected
//! and tested in isolation. `Default` reproduces the tuned values; partial
//! JSON documents override only the fields they name.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Section-header keywords that force a new proximity cluster.
pub const DEFAULT_SECTION_KEYWORDS: &[&str] = &[
    "faq",
    "frequently asked questions",
    "key ingredients",
    "ingredients",
    "how to use",
    "directions",
    "benefits",
    "features",
    "about",
    "testimonials",
    "reviews",
    "what is",
    "why choose",
    "specifications",
    "details",
    "description",
    "overview",
    "summary",
    "highlights",
];

/// Text token extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tokens with confidence at or below this value are discarded (0-100 scale).
    pub min_confidence: i32,
    /// Binarize with a global Otsu threshold before OCR.
    pub binarize: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_confidence: 30,
            binarize: true,
        }
    }
}

/// Where coarse visual blocks come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    /// Dilated binary image fed to the contour backend
    #[default]
    Contours,
    /// Full-width bands separated by tall whitespace runs
    HorizontalBands,
}

/// Visual block detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockDetectionConfig {
    /// Block source used by the engine
    pub source: BlockSource,
    /// Gaussian sigma for noise suppression (matches a 5x5 kernel)
    pub blur_sigma: f32,
    /// Side of the square neighbourhood for adaptive thresholding (odd)
    pub adaptive_block_size: u32,
    /// Constant subtracted from the local mean
    pub adaptive_c: i32,
    /// Dilation kernel width in pixels
    pub dilate_kernel_width: u32,
    /// Dilation kernel height in pixels
    pub dilate_kernel_height: u32,
    /// Number of dilation passes
    pub dilate_iterations: u32,
    /// Blocks must cover more than this fraction of the frame
    pub min_area_ratio: f64,
    /// Blocks must cover less than this fraction of the frame
    pub max_area_ratio: f64,
    /// Horizontal band detection settings
    pub bands: BandConfig,
}

impl Default for BlockDetectionConfig {
    fn default() -> Self {
        Self {
            source: BlockSource::Contours,
            blur_sigma: 1.1,
            adaptive_block_size: 11,
            adaptive_c: 4,
            dilate_kernel_width: 20,
            dilate_kernel_height: 5,
            dilate_iterations: 3,
            min_area_ratio: 0.001,
            max_area_ratio: 0.95,
            bands: BandConfig::default(),
        }
    }
}

/// Horizontal whitespace band settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Whitespace runs must be taller than this to split bands
    pub min_gap_height: u32,
    /// Normalized row ink below this counts as whitespace
    pub whitespace_level: f64,
    /// Adaptive threshold neighbourhood (odd)
    pub adaptive_block_size: u32,
    /// Adaptive threshold constant
    pub adaptive_c: i32,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            min_gap_height: 40,
            whitespace_level: 0.15,
            adaptive_block_size: 15,
            adaptive_c: 10,
        }
    }
}

/// Content-pattern rules that force a cluster break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionBreakRules {
    /// Lowercase keywords that mark a section header
    pub header_keywords: Vec<String>,
    /// Header keywords only count on text shorter than this (chars)
    pub header_max_chars: usize,
    /// Any vertical gap above this always breaks (px)
    pub hard_gap_ceiling: f64,
    /// Word count beyond which a cluster is considered substantial
    pub substantial_word_count: usize,
    /// Gap that breaks a substantial cluster (px)
    pub substantial_gap_ceiling: f64,
    /// Difference in average text length that signals a pattern change (chars)
    pub length_shift_chars: f64,
    /// Gap required alongside a length shift (px)
    pub length_shift_gap: f64,
}

impl Default for SectionBreakRules {
    fn default() -> Self {
        Self {
            header_keywords: DEFAULT_SECTION_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            header_max_chars: 50,
            hard_gap_ceiling: 80.0,
            substantial_word_count: 25,
            substantial_gap_ceiling: 45.0,
            length_shift_chars: 20.0,
            length_shift_gap: 35.0,
        }
    }
}

/// Proximity clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Base center-distance threshold as a fraction of frame height
    pub base_threshold_ratio: f64,
    /// Lower bound for the base threshold (px)
    pub base_threshold_floor: f64,
    /// Vertical gap tolerance before leniency (px)
    pub max_vertical_gap: f64,
    /// Horizontal gap tolerance before leniency (px)
    pub max_horizontal_gap: f64,
    /// Multiplier applied to both tolerances for short tokens or small clusters
    pub leniency_factor: f64,
    /// Tokens with at most this many words are short
    pub short_text_words: usize,
    /// Clusters with at most this many tokens are small
    pub small_cluster_tokens: usize,
    /// Padding added around each cluster's token union (px)
    pub padding: f64,
    /// Forced section-break heuristics
    pub breaks: SectionBreakRules,
}

impl ProximityConfig {
    /// Center-distance threshold for a frame of the given height.
    pub fn base_threshold(&self, frame_height: u32) -> f64 {
        (frame_height as f64 * self.base_threshold_ratio).max(self.base_threshold_floor)
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            base_threshold_ratio: 0.05,
            base_threshold_floor: 40.0,
            max_vertical_gap: 60.0,
            max_horizontal_gap: 70.0,
            leniency_factor: 1.5,
            short_text_words: 3,
            small_cluster_tokens: 2,
            padding: 15.0,
            breaks: SectionBreakRules::default(),
        }
    }
}

/// Crop validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Minimum crop width and height in pixels
    pub min_size_px: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self { min_size_px: 50 }
    }
}

/// Sectioning strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Block mapping with proximity clustering as fallback
    #[default]
    Auto,
    /// Map tokens into detected visual blocks
    BlockMapping,
    /// Group tokens directly by proximity
    ProximityClustering,
}

/// Strategy selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Strategy to run
    pub strategy: StrategyType,
    /// In auto mode, fall back when block mapping assigns fewer than this fraction of tokens
    pub min_coverage: f64,
    /// Emit empty blocks as placeholder sections (`has_text = false`)
    pub include_empty_regions: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            min_coverage: 0.5,
            include_empty_regions: false,
        }
    }
}

/// Complete segmentation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// OCR token extraction
    pub ocr: OcrConfig,
    /// Visual block detection
    pub blocks: BlockDetectionConfig,
    /// Proximity clustering
    pub proximity: ProximityConfig,
    /// Crop validation
    pub crop: CropConfig,
    /// Strategy selection
    pub strategy: StrategyConfig,
}

impl SegmentationConfig {
    /// Create configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from JSON, filling unspecified fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Select the sectioning strategy.
    pub fn with_strategy(mut self, strategy: StrategyType) -> Self {
        self.strategy.strategy = strategy;
        self
    }

    /// Emit empty visual blocks as placeholder sections.
    pub fn with_empty_regions(mut self, enable: bool) -> Self {
        self.strategy.include_empty_regions = enable;
        self
    }

    /// Select the block source.
    pub fn with_block_source(mut self, source: BlockSource) -> Self {
        self.blocks.source = source;
        self
    }

    /// Set the OCR confidence cutoff.
    pub fn with_min_confidence(mut self, min_confidence: i32) -> Self {
        self.ocr.min_confidence = min_confidence;
        self
    }

    /// Check values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let b = &self.blocks;
        if b.blur_sigma <= 0.0 {
            return Err(Error::Config(format!("blur_sigma must be positive, got {}", b.blur_sigma)));
        }
        if b.adaptive_block_size < 3 || b.adaptive_block_size % 2 == 0 {
            return Err(Error::Config(format!(
                "adaptive_block_size must be odd and >= 3, got {}",
                b.adaptive_block_size
            )));
        }
        if b.bands.adaptive_block_size < 3 || b.bands.adaptive_block_size % 2 == 0 {
            return Err(Error::Config(format!(
                "bands.adaptive_block_size must be odd and >= 3, got {}",
                b.bands.adaptive_block_size
            )));
        }
        if b.dilate_kernel_width == 0 || b.dilate_kernel_height == 0 {
            return Err(Error::Config("dilation kernel must be at least 1x1".to_string()));
        }
        if !(0.0..=1.0).contains(&b.min_area_ratio)
            || !(0.0..=1.0).contains(&b.max_area_ratio)
            || b.min_area_ratio >= b.max_area_ratio
        {
            return Err(Error::Config(format!(
                "block area window ({}, {}) is not a valid sub-range of [0, 1]",
                b.min_area_ratio, b.max_area_ratio
            )));
        }
        if self.proximity.leniency_factor < 1.0 {
            return Err(Error::Config(format!(
                "leniency_factor must be >= 1.0, got {}",
                self.proximity.leniency_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.strategy.min_coverage) {
            return Err(Error::Config(format!(
                "min_coverage must be within [0, 1], got {}",
                self.strategy.min_coverage
            )));
        }
        Ok(())
    }
}
