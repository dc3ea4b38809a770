//! Assign tokens to visual blocks by center containment.

use super::section::{section_id, Section};
use super::{sort_reading_order, SectioningContext, SectioningStrategy, StrategyKind};
use crate::blocks::VisualBlock;
use crate::error::Result;
use crate::geometry::FrameSize;
use crate::ocr::TextToken;
use crate::utils::safe_float_cmp;

/// Sections produced by block mapping plus token accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMapping {
    /// Sections in block order
    pub sections: Vec<Section>,
    /// Tokens whose center fell strictly inside some block
    pub assigned_tokens: usize,
    /// Tokens offered to the mapper
    pub total_tokens: usize,
}

impl BlockMapping {
    /// Fraction of tokens that ended up in a section.
    ///
    /// An empty token list counts as fully covered.
    pub fn coverage(&self) -> f64 {
        if self.total_tokens == 0 {
            1.0
        } else {
            self.assigned_tokens as f64 / self.total_tokens as f64
        }
    }
}

/// Map tokens into blocks.
///
/// Blocks are visited top to bottom. A token belongs to the first block whose
/// interior strictly contains its center, so no token lands in two sections;
/// tokens on a block edge or outside every block are dropped. Block
/// rectangles are clipped to the frame before use. Blocks that
/// collect no text are skipped unless `include_empty_regions` is set, in
/// which case they become placeholder sections numbered in sequence with the
/// others.
pub fn map_tokens_to_blocks(
    blocks: &[VisualBlock],
    tokens: &[TextToken],
    frame: FrameSize,
    include_empty_regions: bool,
) -> BlockMapping {
    let mut ordered_blocks: Vec<&VisualBlock> = blocks.iter().collect();
    ordered_blocks.sort_by(|a, b| safe_float_cmp(a.bbox.y, b.bbox.y));

    let mut ordered_tokens = tokens.to_vec();
    sort_reading_order(&mut ordered_tokens);
    let centers: Vec<_> = ordered_tokens.iter().map(|t| t.bbox.center()).collect();
    let mut taken = vec![false; ordered_tokens.len()];

    let mut sections = Vec::new();
    for block in ordered_blocks {
        let bbox = block.bbox.clamp_to(frame);
        let mut members: Vec<&TextToken> = Vec::new();
        for (idx, token) in ordered_tokens.iter().enumerate() {
            if !taken[idx] && bbox.contains_point_strict(&centers[idx]) {
                taken[idx] = true;
                members.push(token);
            }
        }

        if members.is_empty() {
            if include_empty_regions {
                sections.push(Section::empty(section_id(sections.len() + 1), bbox, frame));
            }
            continue;
        }

        let section = Section::from_tokens(section_id(sections.len() + 1), &members, bbox, frame);
        log::trace!(
            "{}: {} tokens at y={:.0}",
            section.id,
            section.element_count,
            bbox.y
        );
        sections.push(section);
    }

    let assigned_tokens = taken.iter().filter(|&&t| t).count();
    BlockMapping {
        sections,
        assigned_tokens,
        total_tokens: ordered_tokens.len(),
    }
}

/// Strategy wrapper around [`map_tokens_to_blocks`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockMappingStrategy;

impl SectioningStrategy for BlockMappingStrategy {
    fn sectionize(&self, tokens: &[TextToken], context: &SectioningContext) -> Result<Vec<Section>> {
        let mapping =
            map_tokens_to_blocks(&context.blocks, tokens, context.frame, context.include_empty_regions);
        if mapping.assigned_tokens < mapping.total_tokens {
            log::debug!(
                "{} of {} tokens fell outside every block",
                mapping.total_tokens - mapping.assigned_tokens,
                mapping.total_tokens
            );
        }
        Ok(mapping.sections)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::BlockMapping
    }

    fn name(&self) -> &'static str {
        "BlockMapping"
    }
}
