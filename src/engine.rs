//! Analysis orchestration.
//!
//! [`SectionEngine`] owns every collaborator it needs (OCR backend, contour
//! backend, optional labeler) and runs one analysis per call:
//!
//! ```text
//! frame ─► TextTokenExtractor ─► tokens ──┬─► BlockMapping ─► sections
//!   │                                     │        ▲
//!   └──► VisualBlockDetector ─► blocks ───┘        │ coverage too low / no blocks (auto)
//!                                                  ▼
//!                                         ProximityClustering ─► sections
//! ```
//!
//! # Strategy selection
//!
//! - **BlockMapping**: always map into blocks, substituting a full-frame
//!   block when detection finds nothing
//! - **ProximityClustering**: skip block detection entirely
//! - **Auto**: try block mapping and fall back to proximity clustering when no
//!   blocks were found or too few tokens landed inside them

use serde::{Deserialize, Serialize};

use crate::blocks::{blocks_or_full_frame, ContourBackend, VisualBlock, VisualBlockDetector};
use crate::config::{SegmentationConfig, StrategyType};
use crate::crop::{CropValidator, ValidatedCrop};
use crate::error::Result;
use crate::frame::ImageFrame;
use crate::geometry::FrameSize;
use crate::labeling::{annotate_sections, default_annotation, SectionAnnotation, SemanticLabeler};
use crate::ocr::{OcrBackend, TextToken, TextTokenExtractor};
use crate::sectioning::{
    create_strategy, map_tokens_to_blocks, Section, SectioningContext, StrategyKind,
};

/// Why an analysis produced no sections without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSectionsCause {
    /// The OCR backend could not be invoked
    OcrUnavailable,
    /// OCR ran but no token cleared the confidence cutoff
    NoTokens,
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Frame dimensions
    pub frame: FrameSize,
    /// Sections in output order
    pub sections: Vec<Section>,
    /// Strategy that produced `sections` (absent when nothing ran)
    pub strategy: Option<StrategyKind>,
    /// Set when the run ended early
    pub cause: Option<NoSectionsCause>,
    /// Tokens that survived filtering
    pub token_count: usize,
    /// Visual blocks detected (before any full-frame substitution)
    pub block_count: usize,
    /// Fraction of tokens block mapping placed in a block, when it ran
    pub coverage: Option<f64>,
}

impl AnalysisOutcome {
    fn empty(frame: FrameSize, cause: NoSectionsCause) -> Self {
        Self {
            frame,
            sections: Vec::new(),
            strategy: None,
            cause: Some(cause),
            token_count: 0,
            block_count: 0,
            coverage: None,
        }
    }

    /// True when the OCR backend was missing.
    pub fn ocr_unavailable(&self) -> bool {
        self.cause == Some(NoSectionsCause::OcrUnavailable)
    }
}

/// An outcome together with one annotation per section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledOutcome {
    /// The underlying analysis
    pub outcome: AnalysisOutcome,
    /// Annotations in section order
    pub annotations: Vec<SectionAnnotation>,
}

/// The layout segmentation engine.
pub struct SectionEngine {
    extractor: TextTokenExtractor,
    detector: VisualBlockDetector,
    labeler: Option<Box<dyn SemanticLabeler>>,
    validator: CropValidator,
    config: SegmentationConfig,
}

impl SectionEngine {
    /// Create an engine from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::error::Error::Config) when `config`
    /// fails [`SegmentationConfig::validate`].
    pub fn new(
        ocr: Box<dyn OcrBackend>,
        contours: Box<dyn ContourBackend>,
        config: SegmentationConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: TextTokenExtractor::new(ocr, config.ocr.clone()),
            detector: VisualBlockDetector::new(contours, config.blocks.clone()),
            labeler: None,
            validator: CropValidator::new(config.crop.clone()),
            config,
        })
    }

    /// Attach a semantic labeler used by [`analyze_and_label`](Self::analyze_and_label).
    pub fn with_labeler(mut self, labeler: Box<dyn SemanticLabeler>) -> Self {
        self.labeler = Some(labeler);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Validator configured with this engine's crop settings.
    pub fn crop_validator(&self) -> &CropValidator {
        &self.validator
    }

    /// Segment a frame into sections.
    ///
    /// Only hard failures (for example a broken OCR backend) are errors. A
    /// missing OCR backend and an empty token list come back as an outcome
    /// with no sections and a [`NoSectionsCause`].
    pub fn analyze(&self, frame: &ImageFrame) -> Result<AnalysisOutcome> {
        let size = frame.size();
        let tokens = match self.extractor.extract(frame) {
            Ok(tokens) => tokens,
            Err(e) if e.is_ocr_unavailable() => {
                log::warn!("{}", e);
                return Ok(AnalysisOutcome::empty(size, NoSectionsCause::OcrUnavailable));
            },
            Err(e) => return Err(e),
        };
        if tokens.is_empty() {
            log::info!("No text tokens extracted, nothing to segment");
            return Ok(AnalysisOutcome::empty(size, NoSectionsCause::NoTokens));
        }

        let outcome = match self.config.strategy.strategy {
            StrategyType::ProximityClustering => self.run_proximity(frame, &tokens, 0, None)?,
            StrategyType::BlockMapping => {
                let blocks = self.detector.detect(frame)?;
                self.run_block_mapping(frame, &tokens, blocks)
            },
            StrategyType::Auto => self.run_auto(frame, &tokens)?,
        };

        log::info!(
            "{} sections from {} tokens ({:?})",
            outcome.sections.len(),
            outcome.token_count,
            outcome.strategy
        );
        Ok(outcome)
    }

    fn run_auto(&self, frame: &ImageFrame, tokens: &[TextToken]) -> Result<AnalysisOutcome> {
        let blocks = match self.detector.detect(frame) {
            Ok(blocks) => blocks,
            Err(e) => {
                log::warn!("Block detection failed ({}), clustering by proximity", e);
                return self.run_proximity(frame, tokens, 0, None);
            },
        };
        if blocks.is_empty() {
            log::info!("No visual blocks detected, clustering by proximity");
            return self.run_proximity(frame, tokens, 0, None);
        }

        let mapped = self.run_block_mapping(frame, tokens, blocks);
        let coverage = mapped.coverage.unwrap_or(0.0);
        if coverage < self.config.strategy.min_coverage {
            log::info!(
                "Block mapping placed {:.0}% of tokens (minimum {:.0}%), clustering by proximity",
                coverage * 100.0,
                self.config.strategy.min_coverage * 100.0
            );
            return self.run_proximity(frame, tokens, mapped.block_count, mapped.coverage);
        }
        Ok(mapped)
    }

    fn run_block_mapping(
        &self,
        frame: &ImageFrame,
        tokens: &[TextToken],
        blocks: Vec<VisualBlock>,
    ) -> AnalysisOutcome {
        let size = frame.size();
        let block_count = blocks.len();
        let blocks = blocks_or_full_frame(blocks, size);
        let mapping = map_tokens_to_blocks(
            &blocks,
            tokens,
            size,
            self.config.strategy.include_empty_regions,
        );
        AnalysisOutcome {
            frame: size,
            coverage: Some(mapping.coverage()),
            sections: mapping.sections,
            strategy: Some(StrategyKind::BlockMapping),
            cause: None,
            token_count: tokens.len(),
            block_count,
        }
    }

    fn run_proximity(
        &self,
        frame: &ImageFrame,
        tokens: &[TextToken],
        block_count: usize,
        coverage: Option<f64>,
    ) -> Result<AnalysisOutcome> {
        let size = frame.size();
        let strategy = create_strategy(StrategyKind::ProximityClustering, &self.config);
        let context = SectioningContext::new(size);
        let sections = strategy.sectionize(tokens, &context)?;
        Ok(AnalysisOutcome {
            frame: size,
            sections,
            strategy: Some(strategy.kind()),
            cause: None,
            token_count: tokens.len(),
            block_count,
            coverage,
        })
    }

    /// Segment a frame and annotate every section.
    ///
    /// Without a labeler, or when labeling fails, every section gets the
    /// default annotation.
    pub fn analyze_and_label(&self, frame: &ImageFrame) -> Result<LabeledOutcome> {
        let outcome = self.analyze(frame)?;
        let annotations = match &self.labeler {
            Some(labeler) => annotate_sections(labeler.as_ref(), &outcome.sections, frame.image()),
            None => outcome
                .sections
                .iter()
                .enumerate()
                .map(|(idx, section)| default_annotation(idx, section))
                .collect(),
        };
        Ok(LabeledOutcome {
            outcome,
            annotations,
        })
    }

    /// Crop rectangles for every section of an outcome, keyed by section id.
    pub fn validated_crops(&self, outcome: &AnalysisOutcome) -> Vec<(String, ValidatedCrop)> {
        self.validator.validate_sections(&outcome.sections, outcome.frame)
    }
}
