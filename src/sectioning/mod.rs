//! Sectioning strategies: turning tokens (and optionally blocks) into sections.
//!
//! # Available Strategies
//!
//! - [`BlockMappingStrategy`]: assigns tokens to detected visual blocks by center containment
//! - [`ProximityClusteringStrategy`]: greedy top-to-bottom clustering of tokens by proximity
//!
//! Both produce the same [`Section`] type, numbered `section_1..section_N` in
//! output order.

mod block_mapping;
mod proximity;
mod section;

pub use block_mapping::{map_tokens_to_blocks, BlockMapping, BlockMappingStrategy};
pub use proximity::{cluster_tokens, ProximityClusteringStrategy};
pub use section::{section_id, Section};

use serde::{Deserialize, Serialize};

use crate::blocks::VisualBlock;
use crate::config::SegmentationConfig;
use crate::error::Result;
use crate::geometry::FrameSize;
use crate::ocr::TextToken;
use crate::utils::safe_float_cmp;

/// Which strategy produced a set of sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Tokens mapped into visual blocks
    BlockMapping,
    /// Tokens clustered by proximity
    ProximityClustering,
}

/// Trait for grouping text tokens into sections.
///
/// Implementations are deterministic: identical tokens and context always
/// yield identical sections.
pub trait SectioningStrategy: Send + Sync {
    /// Group tokens into ordered sections.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Filtered OCR tokens, in any order
    /// * `context` - Frame dimensions and, for block mapping, the visual blocks
    fn sectionize(&self, tokens: &[TextToken], context: &SectioningContext) -> Result<Vec<Section>>;

    /// Which kind of strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Return the name of this strategy for debugging.
    fn name(&self) -> &'static str;
}

/// Inputs shared by all strategies besides the tokens themselves.
#[derive(Debug, Clone)]
pub struct SectioningContext {
    /// Frame dimensions
    pub frame: FrameSize,
    /// Visual blocks ascending by `y` (ignored by proximity clustering)
    pub blocks: Vec<VisualBlock>,
    /// Emit blocks without tokens as placeholder sections
    pub include_empty_regions: bool,
}

impl SectioningContext {
    /// Context for a frame with no blocks.
    pub fn new(frame: FrameSize) -> Self {
        Self {
            frame,
            blocks: Vec::new(),
            include_empty_regions: false,
        }
    }

    /// Attach visual blocks.
    pub fn with_blocks(mut self, blocks: Vec<VisualBlock>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Enable placeholder sections for empty blocks.
    pub fn with_empty_regions(mut self, enable: bool) -> Self {
        self.include_empty_regions = enable;
        self
    }
}

/// Create a strategy of the given kind from configuration.
pub fn create_strategy(kind: StrategyKind, config: &SegmentationConfig) -> Box<dyn SectioningStrategy> {
    match kind {
        StrategyKind::BlockMapping => Box::new(BlockMappingStrategy),
        StrategyKind::ProximityClustering => {
            Box::new(ProximityClusteringStrategy::new(config.proximity.clone()))
        },
    }
}

/// Sort tokens into reading order: top to bottom, then left to right.
///
/// The sort is stable, so tokens at identical positions keep their input order.
pub fn sort_reading_order(tokens: &mut [TextToken]) {
    tokens.sort_by(|a, b| {
        safe_float_cmp(a.bbox.y, b.bbox.y).then_with(|| safe_float_cmp(a.bbox.x, b.bbox.x))
    });
}
