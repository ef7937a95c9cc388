//! Cohort-wide pattern synthesis.
//!
//! [`SynthesisPatterns`] holds the structured, deterministic aggregate.
//! [`PatternSynthesis`] wraps it with run metadata and the narrative report
//! that grounds script generation.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{CtaType, HookType};

/// A ranked opening hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankedHook {
    /// Verbatim text from the best-ranked contributor
    pub text: String,
    pub hook_type: HookType,
    /// Mean effectiveness of the items that used this exact hook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<f64>,
    /// Distinct items whose hook has the same type
    pub frequency: usize,
    pub source_item_id: String,
}

/// Hooks grouped by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HookGroup {
    pub hook_type: HookType,
    pub frequency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_effectiveness: Option<f64>,
    pub best_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SecondsRange {
    pub min_seconds: u32,
    pub max_seconds: u32,
}

/// Weighted structural statistics. Every field is derived across the
/// cohort; `None` means no item contributed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OptimalStructure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_duration_range: Option<SecondsRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_duration_seconds: Option<u32>,
    pub total_target_seconds: u32,
}

/// A bucket of near-identical calls-to-action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankedCta {
    /// Verbatim text from the highest-weight contributor
    pub text: String,
    pub cta_type: CtaType,
    /// Weighted mean position, percent of total duration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_percent: Option<f64>,
    pub frequency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeyVocabulary {
    pub technical_terms: Vec<TermCount>,
    pub transition_phrases: Vec<TermCount>,
    pub common_phrases: Vec<TermCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankedTechnique {
    pub name: String,
    pub description: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeoSource {
    Keyword,
    Tag,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SeoTerm {
    pub term: String,
    pub count: usize,
    pub source: SeoSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeoPatterns {
    pub title_keywords: Vec<TermCount>,
    pub tags: Vec<TermCount>,
    /// Keywords and tags merged and ranked by combined frequency
    pub pool: Vec<SeoTerm>,
}

/// Output of the pure aggregation steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SynthesisPatterns {
    pub top_hooks: Vec<RankedHook>,
    pub hook_groups: Vec<HookGroup>,
    pub optimal_structure: OptimalStructure,
    pub effective_ctas: Vec<RankedCta>,
    pub key_vocabulary: KeyVocabulary,
    pub notable_techniques: Vec<RankedTechnique>,
    pub seo_patterns: SeoPatterns,
    /// Unweighted mean of the items' effectiveness scores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_effectiveness: Option<f64>,
    /// Items that carried a usable weight
    pub weighted_items: usize,
}

/// How the narrative report was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportQuality {
    /// Rendered by the generative service
    Narrative,
    /// Deterministic template fallback
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrativeReport {
    pub markdown: String,
    pub quality: ReportQuality,
}

/// The synthesizer's single output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PatternSynthesis {
    pub topic: String,

    /// Analyses that actually contributed
    pub items_analyzed: usize,

    /// Cohort size originally requested, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_requested: Option<usize>,

    #[serde(flatten)]
    pub patterns: SynthesisPatterns,

    pub report: NarrativeReport,

    pub synthesized_at: DateTime<Utc>,
}

impl PatternSynthesis {
    /// True when the report fell back to the template renderer.
    pub fn is_degraded(&self) -> bool {
        self.report.quality == ReportQuality::Template
    }

    pub fn with_items_requested(mut self, requested: usize) -> Self {
        self.items_requested = Some(requested);
        self
    }
}
