//! Generated scripts and SEO metadata validation.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Title length bounds, in characters.
pub const TITLE_CHARS: RangeInclusive<usize> = 50..=70;

/// Description length bounds, in words.
pub const DESCRIPTION_WORDS: RangeInclusive<usize> = 150..=200;

/// Tag count bounds.
pub const TAG_COUNT: RangeInclusive<usize> = 15..=20;

/// Publishing metadata for a script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// A single SEO bound violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum SeoIssue {
    TitleLength { chars: usize },
    DescriptionLength { words: usize },
    TagCount { tags: usize },
}

impl std::fmt::Display for SeoIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeoIssue::TitleLength { chars } => write!(
                f,
                "title is {} characters (expected {}-{})",
                chars,
                TITLE_CHARS.start(),
                TITLE_CHARS.end()
            ),
            SeoIssue::DescriptionLength { words } => write!(
                f,
                "description is {} words (expected {}-{})",
                words,
                DESCRIPTION_WORDS.start(),
                DESCRIPTION_WORDS.end()
            ),
            SeoIssue::TagCount { tags } => write!(
                f,
                "{} tags (expected {}-{})",
                tags,
                TAG_COUNT.start(),
                TAG_COUNT.end()
            ),
        }
    }
}

/// Result of local SEO validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SeoValidation {
    pub issues: Vec<SeoIssue>,
}

impl SeoValidation {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl SeoMetadata {
    /// Check title, description and tag bounds.
    pub fn validate(&self) -> SeoValidation {
        let mut issues = Vec::new();

        let chars = self.title.trim().chars().count();
        if !TITLE_CHARS.contains(&chars) {
            issues.push(SeoIssue::TitleLength { chars });
        }

        let words = self.description.split_whitespace().count();
        if !DESCRIPTION_WORDS.contains(&words) {
            issues.push(SeoIssue::DescriptionLength { words });
        }

        let tags = self.tags.iter().filter(|t| !t.trim().is_empty()).count();
        if !TAG_COUNT.contains(&tags) {
            issues.push(SeoIssue::TagCount { tags });
        }

        SeoValidation { issues }
    }
}

/// The final script artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedScript {
    pub user_idea: String,

    /// Full script in markdown
    pub script_markdown: String,

    pub seo: SeoMetadata,

    pub seo_validation: SeoValidation,

    /// Spoken duration estimate from the word count
    pub estimated_duration_minutes: f64,

    pub word_count: usize,

    pub target_duration_minutes: f64,

    /// ISO language code of the script text
    pub language: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Topic of the synthesis used as grounding
    pub synthesis_topic: String,

    /// Number of analyzed reference videos behind the synthesis
    pub reference_count: usize,

    /// Local estimate, 1-100
    pub estimated_quality_score: u8,

    pub generated_at: DateTime<Utc>,
}
