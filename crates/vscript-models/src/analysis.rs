//! Per-video pattern analysis.
//!
//! The generative service returns loosely structured JSON. It is first
//! deserialized into [`AnalysisPayload`], a strict wire type in which every
//! field has an explicit default, and then converted into the domain type
//! [`ItemAnalysis`]. A field that is missing on the wire stays absent in the
//! domain type and simply contributes nothing to aggregation.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateItem;
use crate::timestamp::OffsetValue;

// ============================================================================
// Categorical labels
// ============================================================================

/// Kind of opening hook.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum HookType {
    Question,
    Statistic,
    Promise,
    ProblemStatement,
    Other,
}

impl HookType {
    /// Normalise a free-form label (`"Problem Statement"`, `"stat"`, ...).
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "question" | "questions" | "rhetorical_question" => Self::Question,
            "statistic" | "statistics" | "stat" | "fact" | "number" => Self::Statistic,
            "promise" | "benefit" | "outcome" => Self::Promise,
            "problem_statement" | "problem" | "pain_point" => Self::ProblemStatement,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Statistic => "statistic",
            Self::Promise => "promise",
            Self::ProblemStatement => "problem-statement",
            Self::Other => "other",
        }
    }
}

/// Kind of call-to-action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CtaType {
    Like,
    Subscribe,
    Comment,
    Share,
    Other,
}

impl CtaType {
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "like" | "likes" => Self::Like,
            "subscribe" | "subscription" | "suscribe" => Self::Subscribe,
            "comment" | "comments" => Self::Comment,
            "share" => Self::Share,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Subscribe => "subscribe",
            Self::Comment => "comment",
            Self::Share => "share",
            Self::Other => "other",
        }
    }
}

/// Qualitative effectiveness of a hook as judged by the analyzer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum EffectivenessTag {
    High,
    #[default]
    Medium,
    Low,
}

impl EffectivenessTag {
    /// Unknown labels map to `Medium`.
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "high" | "very_high" | "strong" => Self::High,
            "low" | "weak" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}

// ============================================================================
// Wire payload
// ============================================================================

/// Structured analysis exactly as requested from the generative service.
///
/// Every field is optional on the wire. Explicit `null`s are stripped from
/// the JSON before it reaches this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalysisPayload {
    pub hook: Option<HookPayload>,
    pub structure: Option<StructurePayload>,
    /// `null`/missing means "no CTA data", which differs from an empty list.
    pub ctas: Option<Vec<CtaPayload>>,
    pub technical_terms: Vec<String>,
    pub transition_phrases: Vec<String>,
    pub common_phrases: Vec<String>,
    pub techniques: Vec<TechniquePayload>,
    pub title_keywords: Vec<String>,
    pub estimated_tags: Vec<String>,
}

impl AnalysisPayload {
    /// True when the payload carries no usable signal at all.
    pub fn is_empty(&self) -> bool {
        self.hook
            .as_ref()
            .map_or(true, |h| h.text.trim().is_empty())
            && self.structure.as_ref().map_or(true, |s| {
                s.sections.is_empty() && s.intro_end.is_none() && s.conclusion_start.is_none()
            })
            && self.ctas.as_ref().map_or(true, Vec::is_empty)
            && self.technical_terms.is_empty()
            && self.transition_phrases.is_empty()
            && self.common_phrases.is_empty()
            && self.techniques.is_empty()
            && self.title_keywords.is_empty()
            && self.estimated_tags.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HookPayload {
    pub start: Option<OffsetValue>,
    pub end: Option<OffsetValue>,
    pub text: String,
    /// question | statistic | promise | problem-statement | other
    #[serde(rename = "type")]
    pub hook_type: String,
    /// high | medium | low
    pub effectiveness: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StructurePayload {
    pub sections: Vec<SectionPayload>,
    pub intro_end: Option<OffsetValue>,
    pub conclusion_start: Option<OffsetValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SectionPayload {
    pub label: String,
    pub start: Option<OffsetValue>,
    pub end: Option<OffsetValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CtaPayload {
    pub text: String,
    pub offset: Option<OffsetValue>,
    pub position_percent: Option<f64>,
    /// like | subscribe | comment | share | other
    #[serde(rename = "type")]
    pub cta_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TechniquePayload {
    pub name: String,
    pub description: String,
}

// ============================================================================
// Domain types
// ============================================================================

/// The opening segment of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OpeningHook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_seconds: Option<f64>,
    /// Verbatim hook text
    pub text: String,
    pub hook_type: HookType,
    #[serde(default)]
    pub effectiveness: EffectivenessTag,
}

impl OpeningHook {
    /// `end - start`, when both are known and ordered.
    pub fn duration_seconds(&self) -> Option<f64> {
        span(self.start_seconds, self.end_seconds)
    }
}

/// One labelled section of the video body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_seconds: Option<f64>,
}

impl Section {
    pub fn duration_seconds(&self) -> Option<f64> {
        span(self.start_seconds, self.end_seconds)
    }
}

/// Ordered sections plus intro/conclusion boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoStructure {
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro_end_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion_start_seconds: Option<f64>,
}

impl VideoStructure {
    /// Number of sections, or `None` when no sections were reported.
    pub fn section_count(&self) -> Option<usize> {
        (!self.sections.is_empty()).then_some(self.sections.len())
    }

    /// Mean duration of the sections with usable timing.
    pub fn mean_section_seconds(&self) -> Option<f64> {
        let durations: Vec<f64> = self
            .sections
            .iter()
            .filter_map(Section::duration_seconds)
            .collect();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    }
}

/// A verbal prompt urging viewer engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CallToAction {
    /// Verbatim CTA text
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_seconds: Option<f64>,
    /// Position as a percentage (0-100) of the total duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_percent: Option<f64>,
    pub cta_type: CtaType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Vocabulary {
    #[serde(default)]
    pub technical_terms: Vec<String>,
    #[serde(default)]
    pub transition_phrases: Vec<String>,
    #[serde(default)]
    pub common_phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Technique {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeoSignals {
    #[serde(default)]
    pub title_keywords: Vec<String>,
    #[serde(default)]
    pub estimated_tags: Vec<String>,
}

/// One item's extracted pattern signals.
///
/// Immutable once produced; consumed only by the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItemAnalysis {
    /// Source candidate ID
    pub item_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub channel: String,

    /// Publish date of the source item, used for tie-breaking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<OpeningHook>,

    #[serde(default)]
    pub structure: VideoStructure,

    /// `None` when the analysis carried no CTA data at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctas: Option<Vec<CallToAction>>,

    #[serde(default)]
    pub vocabulary: Vocabulary,

    #[serde(default)]
    pub techniques: Vec<Technique>,

    #[serde(default)]
    pub seo: SeoSignals,

    /// 1-5 synthesis weight copied from the source candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness_score: Option<f64>,
}

impl ItemAnalysis {
    /// An analysis with no signals, for callers assembling one by hand.
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            title: String::new(),
            url: String::new(),
            channel: String::new(),
            published_at: None,
            duration_seconds: None,
            hook: None,
            structure: VideoStructure::default(),
            ctas: None,
            vocabulary: Vocabulary::default(),
            techniques: Vec::new(),
            seo: SeoSignals::default(),
            effectiveness_score: None,
        }
    }

    /// Build the domain analysis for `item` from a wire payload.
    ///
    /// The effectiveness score is always taken from the candidate, never
    /// from the payload.
    pub fn from_payload(item: &CandidateItem, payload: AnalysisPayload) -> Self {
        let duration = item.duration_seconds;

        let hook = payload.hook.and_then(|h| {
            let text = h.text.trim().to_string();
            (!text.is_empty()).then(|| OpeningHook {
                start_seconds: h.start.as_ref().and_then(OffsetValue::to_seconds),
                end_seconds: h.end.as_ref().and_then(OffsetValue::to_seconds),
                text,
                hook_type: HookType::from_label(&h.hook_type),
                effectiveness: EffectivenessTag::from_label(&h.effectiveness),
            })
        });

        let structure = payload
            .structure
            .map(|s| VideoStructure {
                sections: s
                    .sections
                    .into_iter()
                    .enumerate()
                    .map(|(i, sec)| {
                        let label = sec.label.trim();
                        Section {
                            label: if label.is_empty() {
                                format!("Section {}", i + 1)
                            } else {
                                label.to_string()
                            },
                            start_seconds: sec.start.as_ref().and_then(OffsetValue::to_seconds),
                            end_seconds: sec.end.as_ref().and_then(OffsetValue::to_seconds),
                        }
                    })
                    .collect(),
                intro_end_seconds: s.intro_end.as_ref().and_then(OffsetValue::to_seconds),
                conclusion_start_seconds: s
                    .conclusion_start
                    .as_ref()
                    .and_then(OffsetValue::to_seconds),
            })
            .unwrap_or_default();

        let ctas = payload.ctas.map(|list| {
            list.into_iter()
                .filter_map(|c| {
                    let text = c.text.trim().to_string();
                    if text.is_empty() {
                        return None;
                    }
                    let offset_seconds = c.offset.as_ref().and_then(OffsetValue::to_seconds);
                    let position_percent = c
                        .position_percent
                        .filter(|p| p.is_finite() && (0.0..=100.0).contains(p))
                        .or_else(|| derive_position(offset_seconds, duration));
                    Some(CallToAction {
                        text,
                        offset_seconds,
                        position_percent,
                        cta_type: CtaType::from_label(&c.cta_type),
                    })
                })
                .collect()
        });

        let techniques = dedup_techniques(payload.techniques);

        Self {
            item_id: item.id.clone(),
            title: item.title.clone(),
            url: item.url.clone(),
            channel: item.channel.clone(),
            published_at: item.published_at,
            duration_seconds: Some(duration),
            hook,
            structure,
            ctas,
            vocabulary: Vocabulary {
                technical_terms: clean_terms(payload.technical_terms),
                transition_phrases: clean_terms(payload.transition_phrases),
                common_phrases: clean_terms(payload.common_phrases),
            },
            techniques,
            seo: SeoSignals {
                title_keywords: clean_terms(payload.title_keywords),
                estimated_tags: clean_terms(payload.estimated_tags),
            },
            effectiveness_score: Some(item.effectiveness_score()),
        }
    }

    /// Synthesis weight: the effectiveness score when present, finite and
    /// positive.
    pub fn weight(&self) -> Option<f64> {
        self.effectiveness_score.filter(|s| s.is_finite() && *s > 0.0)
    }
}

fn span(start: Option<f64>, end: Option<f64>) -> Option<f64> {
    match (start, end) {
        (Some(s), Some(e)) if e >= s => Some(e - s),
        _ => None,
    }
}

fn derive_position(offset_seconds: Option<f64>, duration_seconds: u32) -> Option<f64> {
    let offset = offset_seconds?;
    if duration_seconds == 0 {
        return None;
    }
    let pct = (offset / duration_seconds as f64 * 100.0).clamp(0.0, 100.0);
    Some((pct * 10.0).round() / 10.0)
}

/// Trim, drop blanks and remove case-insensitive duplicates, keeping the
/// first spelling.
fn clean_terms(terms: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

fn dedup_techniques(techniques: Vec<TechniquePayload>) -> Vec<Technique> {
    let mut out: Vec<Technique> = Vec::new();
    for t in techniques {
        let name = t.name.trim();
        if name.is_empty() {
            continue;
        }
        let description = t.description.trim().to_string();
        match out
            .iter_mut()
            .find(|existing| existing.name.to_lowercase() == name.to_lowercase())
        {
            Some(existing) if description.len() > existing.description.len() => {
                existing.description = description;
            }
            Some(_) => {}
            None => out.push(Technique {
                name: name.to_string(),
                description,
            }),
        }
    }
    out
}
