//! Semantic labeling of sections by an external language model.
//!
//! The model itself sits behind [`SemanticLabeler`]; this module renders the
//! prompt, digs the JSON array out of free-form responses and matches the
//! annotations back to sections. Labeling is best-effort: any failure
//! degrades to [`default_annotation`] for every section instead of an error.

use image::DynamicImage;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::geometry::PercentBox;
use crate::sectioning::Section;

lazy_static! {
    static ref FENCED_JSON_ARRAY: Regex =
        Regex::new(r"(?s)```json\s*(\[.*?\])\s*```").expect("valid regex");
}

const DEFAULT_PURPOSE: &str = "Content section requiring copywriting optimization";
const DEFAULT_STRUCTURE: &str = "Standard text format";
const DEFAULT_NOTES: &str = "Requires copywriting analysis - semantic labeling failed";
const DEFAULT_SCORE: u8 = 5;

/// Everything a labeler gets to see.
pub struct LabelingRequest<'a> {
    /// Rendered instructions, see [`build_prompt`]
    pub prompt: String,
    /// Sections being labeled
    pub sections: &'a [Section],
    /// The analyzed image, for visual context
    pub image: &'a DynamicImage,
}

/// An external model that answers a labeling prompt with free-form text.
pub trait SemanticLabeler: Send + Sync {
    /// Return the raw response text.
    fn label(&self, request: &LabelingRequest<'_>) -> Result<String>;

    /// Return the name of this labeler for logging.
    fn name(&self) -> &'static str;
}

/// Copywriting annotation for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAnnotation {
    /// Id of the annotated section
    pub id: String,
    /// Coarse role such as hero, navigation, content, cta or footer
    #[serde(rename = "type")]
    pub section_type: String,
    /// What the copy in this section is for
    pub purpose: String,
    /// Recommended text structure
    pub text_structure: String,
    /// Position description
    pub location: String,
    /// The section's text as the model saw it
    pub current_text: String,
    /// 1-10
    pub copywriting_score: u8,
    /// Suggested improvements
    pub improvement_notes: String,
    /// Copied from the section, never taken from the model
    pub bounding_box: PercentBox,
}

/// Annotation used whenever the model's answer is missing or unusable.
pub fn default_annotation(index: usize, section: &Section) -> SectionAnnotation {
    SectionAnnotation {
        id: section.id.clone(),
        section_type: if section.has_text { "content" } else { "empty" }.to_string(),
        purpose: DEFAULT_PURPOSE.to_string(),
        text_structure: DEFAULT_STRUCTURE.to_string(),
        location: format!("Section {}", index + 1),
        current_text: section.text.clone(),
        copywriting_score: DEFAULT_SCORE,
        improvement_notes: DEFAULT_NOTES.to_string(),
        bounding_box: section.bounding_box_percent,
    }
}

/// Render the labeling prompt for a list of sections.
pub fn build_prompt(sections: &[Section]) -> String {
    let summary = sections
        .iter()
        .map(|s| {
            format!(
                "Section {}: '{}' [Position: {:.1}% from top, {} words]",
                s.id, s.text, s.bounding_box_percent.y, s.word_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze these {count} pre-grouped sections for copywriting effectiveness:

{summary}

For each section, provide copywriting analysis in this EXACT JSON format:
[{{
    "id": "section_1",
    "type": "hero/navigation/content/cta/footer",
    "purpose": "Specific copywriting purpose of this section",
    "text_structure": "Required text structure for optimal conversion",
    "location": "Position description",
    "current_text": "Exact text from the section",
    "copywriting_score": 1-10,
    "improvement_notes": "Specific copywriting improvements needed"
}}]

Focus purely on copywriting effectiveness, the spatial grouping is already done.
Return one object per section, in the order given."#,
        count = sections.len(),
        summary = summary
    )
}

/// Locate the JSON array in a model response.
///
/// A fenced ```` ```json ```` block wins; otherwise everything from the first
/// `[` to the last `]`.
fn extract_json_array(response: &str) -> Option<&str> {
    if let Some(caps) = FENCED_JSON_ARRAY.captures(response) {
        return caps.get(1).map(|m| m.as_str());
    }
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end > start {
        Some(&response[start..=end])
    } else {
        None
    }
}

/// Cut a truncated array after its last complete object and close it.
fn repair_truncated(json: &str) -> Option<String> {
    let last_brace = json.rfind('}')?;
    let mut repaired = json[..=last_brace].to_string();
    if repaired.matches('[').count() > repaired.matches(']').count() {
        repaired.push(']');
    }
    Some(repaired)
}

fn string_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn score_field(obj: &Value) -> u8 {
    let score = match obj.get("copywriting_score") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    score
        .filter(|s| s.is_finite())
        .map(|s| s.round().clamp(1.0, 10.0) as u8)
        .unwrap_or(DEFAULT_SCORE)
}

/// Parse the annotations out of a model response.
///
/// Fields are read leniently and missing ones take the default values. Ids
/// and bounding boxes are left for [`annotate_sections`] to fill in.
pub fn parse_annotations(response: &str) -> Result<Vec<SectionAnnotation>> {
    let json = extract_json_array(response)
        .ok_or_else(|| Error::Labeling("no JSON array in response".to_string()))?;

    let values: Vec<Value> = match serde_json::from_str(json) {
        Ok(values) => values,
        Err(first) => {
            log::warn!("Annotation JSON did not parse ({}), attempting repair", first);
            let repaired = repair_truncated(json).ok_or(Error::Json(first))?;
            serde_json::from_str(&repaired)?
        },
    };

    let annotations = values
        .iter()
        .enumerate()
        .map(|(idx, obj)| SectionAnnotation {
            id: string_field(obj, "id").unwrap_or_default(),
            section_type: string_field(obj, "type").unwrap_or_else(|| "content".to_string()),
            purpose: string_field(obj, "purpose").unwrap_or_else(|| DEFAULT_PURPOSE.to_string()),
            text_structure: string_field(obj, "text_structure")
                .unwrap_or_else(|| DEFAULT_STRUCTURE.to_string()),
            location: string_field(obj, "location").unwrap_or_else(|| format!("Section {}", idx + 1)),
            current_text: string_field(obj, "current_text").unwrap_or_default(),
            copywriting_score: score_field(obj),
            improvement_notes: string_field(obj, "improvement_notes").unwrap_or_default(),
            bounding_box: PercentBox::full(),
        })
        .collect();
    Ok(annotations)
}

/// Label sections, falling back to defaults on any failure.
///
/// Annotations are matched to sections by position. The section's own id and
/// bounding box always win over whatever the model returned; sections the
/// model skipped get the default annotation and surplus annotations are
/// dropped.
pub fn annotate_sections(
    labeler: &dyn SemanticLabeler,
    sections: &[Section],
    image: &DynamicImage,
) -> Vec<SectionAnnotation> {
    if sections.is_empty() {
        return vec![];
    }

    let request = LabelingRequest {
        prompt: build_prompt(sections),
        sections,
        image,
    };
    let parsed = labeler
        .label(&request)
        .and_then(|response| parse_annotations(&response));

    let parsed = match parsed {
        Ok(parsed) => {
            log::info!("{} annotated {} of {} sections", labeler.name(), parsed.len().min(sections.len()), sections.len());
            parsed
        },
        Err(e) => {
            log::warn!("{} labeling failed ({}), using default annotations", labeler.name(), e);
            vec![]
        },
    };
    if parsed.len() > sections.len() {
        log::debug!("Dropping {} surplus annotations", parsed.len() - sections.len());
    }

    let mut parsed = parsed.into_iter();
    sections
        .iter()
        .enumerate()
        .map(|(idx, section)| match parsed.next() {
            Some(mut annotation) => {
                annotation.id = section.id.clone();
                annotation.bounding_box = section.bounding_box_percent;
                if annotation.current_text.is_empty() {
                    annotation.current_text = section.text.clone();
                }
                annotation
            },
            None => default_annotation(idx, section),
        })
        .collect()
}
