//! Greedy proximity clustering.
//!
//! Tokens are visited in reading order while a single cluster is kept open:
//!
//! ```text
//!            first token
//! NoOpenCluster ───────────► Accumulating ──┐ close enough, no break rule
//!       ▲                        │   ▲      │   (merge)
//!       │ end of input           │   └──────┘
//!       │ (emit)                 │ too far or break rule fires
//!       └────────────────────────┤ (emit, open new cluster)
//!                                ▼
//!                           Accumulating
//! ```
//!
//! Each emitted cluster becomes a section whose box is the union of its
//! tokens, padded and clamped to the frame.

use std::fmt;

use super::section::{section_id, Section};
use super::{sort_reading_order, SectioningContext, SectioningStrategy, StrategyKind};
use crate::config::{ProximityConfig, SectionBreakRules};
use crate::error::Result;
use crate::geometry::FrameSize;
use crate::ocr::TextToken;

/// Why a token was refused by the open cluster despite being close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakReason {
    HeaderKeyword,
    HardGap,
    SubstantialCluster,
    LengthShift,
}

impl fmt::Display for BreakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BreakReason::HeaderKeyword => "header keyword",
            BreakReason::HardGap => "hard gap",
            BreakReason::SubstantialCluster => "substantial cluster",
            BreakReason::LengthShift => "text length shift",
        };
        write!(f, "{}", s)
    }
}

struct Cluster {
    tokens: Vec<TextToken>,
    bottom: f64,
    center_y: f64,
    right: f64,
    words: usize,
    chars: usize,
}

impl Cluster {
    fn open(token: TextToken) -> Self {
        Self {
            bottom: token.bbox.bottom(),
            center_y: token.bbox.center().y,
            right: token.bbox.right(),
            words: token.word_count(),
            chars: token.text.chars().count(),
            tokens: vec![token],
        }
    }

    fn merge(&mut self, token: TextToken) {
        self.bottom = self.bottom.max(token.bbox.bottom());
        self.right = self.right.max(token.bbox.right());
        self.words += token.word_count();
        self.chars += token.text.chars().count();
        let n = (self.tokens.len() + 1) as f64;
        self.center_y = (self.center_y * (n - 1.0) + token.bbox.center().y) / n;
        self.tokens.push(token);
    }

    fn average_chars(&self) -> f64 {
        self.chars as f64 / self.tokens.len() as f64
    }

    fn accepts(&self, token: &TextToken, base_threshold: f64, config: &ProximityConfig) -> bool {
        let lenient = token.word_count() <= config.short_text_words
            || self.tokens.len() <= config.small_cluster_tokens;
        let factor = if lenient { config.leniency_factor } else { 1.0 };

        let center_distance = (token.bbox.center().y - self.center_y).abs();
        let vertical_gap = token.bbox.top() - self.bottom;
        let horizontal_gap = token.bbox.left() - self.right;

        let close = center_distance < base_threshold
            && vertical_gap < config.max_vertical_gap * factor
            && horizontal_gap < config.max_horizontal_gap * factor;
        if !close {
            return false;
        }
        match self.break_reason(token, vertical_gap, &config.breaks) {
            Some(reason) => {
                log::trace!("'{}' starts a new section: {}", token.text, reason);
                false
            },
            None => true,
        }
    }

    fn break_reason(&self, token: &TextToken, gap: f64, rules: &SectionBreakRules) -> Option<BreakReason> {
        let lowered = token.text.to_lowercase();
        let text = lowered.trim();
        let len = text.chars().count();

        if len < rules.header_max_chars
            && rules.header_keywords.iter().any(|k| text.contains(k.as_str()))
        {
            return Some(BreakReason::HeaderKeyword);
        }
        if gap > rules.hard_gap_ceiling {
            return Some(BreakReason::HardGap);
        }
        if self.words > rules.substantial_word_count && gap > rules.substantial_gap_ceiling {
            return Some(BreakReason::SubstantialCluster);
        }
        if (self.average_chars() - len as f64).abs() > rules.length_shift_chars
            && gap > rules.length_shift_gap
        {
            return Some(BreakReason::LengthShift);
        }
        None
    }
}

enum ClusterState {
    NoOpenCluster,
    Accumulating(Cluster),
}

/// Group tokens into clusters in reading order.
///
/// Each inner vector is one cluster, its tokens in reading order. The result
/// depends only on the tokens, the frame height and the configuration.
pub fn cluster_tokens(
    tokens: &[TextToken],
    frame_height: u32,
    config: &ProximityConfig,
) -> Vec<Vec<TextToken>> {
    let mut ordered = tokens.to_vec();
    sort_reading_order(&mut ordered);
    let base_threshold = config.base_threshold(frame_height);

    let mut clusters = Vec::new();
    let mut state = ClusterState::NoOpenCluster;
    for token in ordered {
        state = match state {
            ClusterState::NoOpenCluster => ClusterState::Accumulating(Cluster::open(token)),
            ClusterState::Accumulating(mut open) => {
                if open.accepts(&token, base_threshold, config) {
                    open.merge(token);
                    ClusterState::Accumulating(open)
                } else {
                    clusters.push(open.tokens);
                    ClusterState::Accumulating(Cluster::open(token))
                }
            },
        };
    }
    if let ClusterState::Accumulating(open) = state {
        clusters.push(open.tokens);
    }
    clusters
}

/// Sections from token proximity alone.
#[derive(Debug, Clone, Default)]
pub struct ProximityClusteringStrategy {
    config: ProximityConfig,
}

impl ProximityClusteringStrategy {
    /// Create the strategy with the given thresholds.
    pub fn new(config: ProximityConfig) -> Self {
        Self { config }
    }

    fn cluster_section(&self, n: usize, tokens: &[TextToken], frame: FrameSize) -> Option<Section> {
        let first = tokens.first()?;
        let union = tokens.iter().fold(first.bbox, |acc, t| acc.union(&t.bbox));
        let pixel_box = union.expand(self.config.padding).clamp_to(frame);

        let members: Vec<&TextToken> = tokens.iter().collect();
        let mut section = Section::from_tokens(section_id(n), &members, pixel_box, frame);
        let total: f64 = tokens.iter().map(|t| t.confidence as f64).sum();
        section.confidence = Some(total / tokens.len() as f64);
        Some(section)
    }
}

impl SectioningStrategy for ProximityClusteringStrategy {
    fn sectionize(&self, tokens: &[TextToken], context: &SectioningContext) -> Result<Vec<Section>> {
        let clusters = cluster_tokens(tokens, context.frame.height, &self.config);
        log::debug!("Clustered {} tokens into {} groups", tokens.len(), clusters.len());

        let sections = clusters
            .iter()
            .enumerate()
            .filter_map(|(idx, cluster)| self.cluster_section(idx + 1, cluster, context.frame))
            .collect();
        Ok(sections)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ProximityClustering
    }

    fn name(&self) -> &'static str {
        "ProximityClustering"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f64, y: f64) -> TextToken {
        TextToken::new(text, x, y, 60.0, 20.0, 80)
    }

    fn texts(cluster: &[TextToken]) -> Vec<&str> {
        cluster.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_line_of_words_is_one_cluster() {
        let tokens = vec![word("Buy", 10.0, 100.0), word("now", 80.0, 100.0), word("today", 150.0, 102.0)];
        let clusters = cluster_tokens(&tokens, 1000, &ProximityConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(texts(&clusters[0]), vec!["Buy", "now", "today"]);
    }

    #[test]
    fn test_far_apart_tokens_split() {
        let tokens = vec![word("Top", 10.0, 100.0), word("Bottom", 10.0, 300.0)];
        let clusters = cluster_tokens(&tokens, 1000, &ProximityConfig::default());
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_wide_column_gap_splits() {
        // 200px to the right of the cluster's right edge
        let tokens = vec![word("Left", 10.0, 100.0), word("Right", 270.0, 100.0)];
        let clusters = cluster_tokens(&tokens, 1000, &ProximityConfig::default());
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_header_keyword_breaks_close_token() {
        let tokens = vec![word("Great", 10.0, 100.0), word("Benefits", 10.0, 125.0)];
        let clusters = cluster_tokens(&tokens, 1000, &ProximityConfig::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(texts(&clusters[1]), vec!["Benefits"]);
    }

    #[test]
    fn test_long_text_does_not_trigger_header_rule() {
        let long = "about this product we wrote a very long sentence here";
        assert!(long.len() >= 50);
        let tokens = vec![
            TextToken::new("intro text goes right here", 10.0, 100.0, 300.0, 20.0, 80),
            TextToken::new(long, 10.0, 125.0, 300.0, 20.0, 80),
        ];
        let clusters = cluster_tokens(&tokens, 1000, &ProximityConfig::default());
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_break_rule_order() {
        let rules = SectionBreakRules::default();
        let mut cluster = Cluster::open(TextToken::new(
            "one two three four five six seven eight nine ten",
            0.0,
            0.0,
            400.0,
            20.0,
            90,
        ));
        for _ in 0..2 {
            cluster.merge(TextToken::new(
                "one two three four five six seven eight nine ten",
                0.0,
                25.0,
                400.0,
                20.0,
                90,
            ));
        }
        assert_eq!(cluster.words, 30);

        let faq = word("FAQ", 0.0, 100.0);
        assert_eq!(cluster.break_reason(&faq, 50.0, &rules), Some(BreakReason::HeaderKeyword));

        let plain = TextToken::new("one two three four five six seven eight nine ten", 0.0, 100.0, 400.0, 20.0, 90);
        assert_eq!(cluster.break_reason(&plain, 81.0, &rules), Some(BreakReason::HardGap));
        assert_eq!(cluster.break_reason(&plain, 50.0, &rules), Some(BreakReason::SubstantialCluster));
        assert_eq!(cluster.break_reason(&plain, 40.0, &rules), None);

        let short = word("ok", 0.0, 100.0);
        assert_eq!(cluster.break_reason(&short, 40.0, &rules), Some(BreakReason::LengthShift));
    }

    #[test]
    fn test_section_box_is_padded_and_clamped() {
        let strategy = ProximityClusteringStrategy::default();
        let context = SectioningContext::new(FrameSize::new(200, 150));
        let tokens = vec![word("Edge", 5.0, 120.0)];
        let sections = strategy.sectionize(&tokens, &context).unwrap();
        assert_eq!(sections.len(), 1);
        let b = sections[0].bounding_box_pixel;
        assert_eq!((b.x, b.y), (0.0, 105.0));
        assert_eq!((b.right(), b.bottom()), (80.0, 150.0));
        assert_eq!(sections[0].confidence, Some(80.0));
        assert!(sections[0].bounding_box_percent.is_within_frame(1e-9));
    }

    #[test]
    fn test_running_center_is_mean_of_members() {
        let mut cluster = Cluster::open(word("a", 0.0, 0.0));
        cluster.merge(word("b", 70.0, 10.0));
        cluster.merge(word("c", 140.0, 20.0));
        assert!((cluster.center_y - 20.0).abs() < 1e-9);
        assert_eq!(cluster.bottom, 40.0);
        assert_eq!(cluster.right, 200.0);
    }
}
