//! Script generator: idea + synthesis in, script with SEO metadata out.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use vscript_llm::{generate_json, GenerationRequest, LlmError, TextGenerator};
use vscript_models::script::{DESCRIPTION_WORDS, TAG_COUNT, TITLE_CHARS};
use vscript_models::{GeneratedScript, PatternSynthesis, SeoMetadata, SeoValidation};

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::retry::{retry_async, RetryConfig};

/// Speaking rate used to size scripts.
pub const WORDS_PER_MINUTE: f64 = 150.0;

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
struct ScriptPayload {
    /// Full script in markdown, with [MM:SS] section timestamps
    script_markdown: String,
    /// SEO title
    title: String,
    /// SEO description
    description: String,
    /// SEO tags
    tags: Vec<String>,
}

/// Writes scripts grounded in a pattern synthesis.
pub struct ScriptGenerator {
    generator: Arc<dyn TextGenerator>,
    retry: RetryConfig,
}

impl ScriptGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            retry: RetryConfig::new("script_generation"),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Generate a script for `idea`. SEO bounds are validated locally after
    /// the service returns; violations are reported, not fatal.
    pub async fn generate(
        &self,
        idea: &str,
        synthesis: &PatternSynthesis,
        target_minutes: f64,
        style: Option<&str>,
    ) -> WorkerResult<GeneratedScript> {
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(WorkerError::invalid_input("idea must not be empty"));
        }
        if !(target_minutes.is_finite() && target_minutes > 0.0) {
            return Err(WorkerError::invalid_input(format!(
                "target duration must be positive, got {target_minutes}"
            )));
        }
        let style = style.map(str::trim).filter(|s| !s.is_empty());

        let prompt = build_prompt(idea, synthesis, target_minutes, style);
        let payload: ScriptPayload = retry_async(&self.retry, LlmError::is_retryable, || {
            let request = GenerationRequest::new(prompt.clone())
                .with_temperature(0.7)
                .with_max_output_tokens(8192);
            generate_json::<ScriptPayload>(self.generator.as_ref(), request)
        })
        .await?;

        let script_markdown = payload.script_markdown.trim().to_string();
        if script_markdown.is_empty() {
            return Err(WorkerError::script_failed("generated script was empty"));
        }

        let seo = SeoMetadata {
            title: payload.title.trim().to_string(),
            description: payload.description.trim().to_string(),
            tags: clean_tags(payload.tags),
        };
        let seo_validation = seo.validate();
        for issue in &seo_validation.issues {
            warn!(issue = %issue, "SEO metadata out of bounds");
        }
        metrics::record_seo_issues(seo_validation.issues.len());

        let word_count = spoken_word_count(&script_markdown);
        let estimated_duration_minutes = round1(word_count as f64 / WORDS_PER_MINUTE);
        let estimated_quality_score = estimate_quality(
            &seo_validation,
            synthesis.patterns.average_effectiveness,
            estimated_duration_minutes,
            target_minutes,
        );

        metrics::record_script_generated("en");
        info!(
            words = word_count,
            estimated_minutes = estimated_duration_minutes,
            quality = estimated_quality_score,
            "Script generated"
        );

        Ok(GeneratedScript {
            user_idea: idea.to_string(),
            script_markdown,
            seo,
            seo_validation,
            estimated_duration_minutes,
            word_count,
            target_duration_minutes: target_minutes,
            language: "en".to_string(),
            style: style.map(str::to_string),
            synthesis_topic: synthesis.topic.clone(),
            reference_count: synthesis.items_analyzed,
            estimated_quality_score,
            generated_at: Utc::now(),
        })
    }
}

fn build_prompt(
    idea: &str,
    synthesis: &PatternSynthesis,
    target_minutes: f64,
    style: Option<&str>,
) -> String {
    let target_words = (target_minutes * WORDS_PER_MINUTE).round() as u64;
    let style_line = style
        .map(|s| format!("STYLE: {s}\n"))
        .unwrap_or_default();

    format!(
        r#"Write an original YouTube script for this idea:

IDEA: {idea}
TARGET LENGTH: {target_minutes} minutes (~{target_words} spoken words at {wpm} words per minute)
{style_line}
The report below summarizes what worked across {items} successful videos about "{topic}".
Follow its hook types, structure, CTA placement and vocabulary, but do not copy sentences
from it. Mark each section with a [MM:SS] timestamp.

{report}

Also return SEO metadata:
- title: {title_min}-{title_max} characters
- description: {desc_min}-{desc_max} words
- tags: {tags_min}-{tags_max} tags"#,
        wpm = WORDS_PER_MINUTE,
        items = synthesis.items_analyzed,
        topic = synthesis.topic,
        report = synthesis.report.markdown,
        title_min = TITLE_CHARS.start(),
        title_max = TITLE_CHARS.end(),
        desc_min = DESCRIPTION_WORDS.start(),
        desc_max = DESCRIPTION_WORDS.end(),
        tags_min = TAG_COUNT.start(),
        tags_max = TAG_COUNT.end(),
    )
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Words a narrator would say: headings, fenced blocks and `[...]`
/// directions or timestamps are skipped.
pub fn spoken_word_count(markdown: &str) -> usize {
    let mut in_fence = false;
    let mut count = 0;
    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || trimmed.starts_with('#') {
            continue;
        }

        let mut spoken = String::with_capacity(line.len());
        let mut depth = 0usize;
        for c in line.chars() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                _ if depth == 0 => spoken.push(c),
                _ => {}
            }
        }
        count += spoken
            .split_whitespace()
            .filter(|w| w.chars().any(char::is_alphanumeric))
            .count();
    }
    count
}

/// 1-100 estimate from SEO validity (40), cohort effectiveness (40) and
/// how close the length lands to the target (20).
pub fn estimate_quality(
    validation: &SeoValidation,
    average_effectiveness: Option<f64>,
    estimated_minutes: f64,
    target_minutes: f64,
) -> u8 {
    let seo = 40.0 * (3.0 - validation.issues.len().min(3) as f64) / 3.0;
    let effectiveness = average_effectiveness
        .filter(|e| e.is_finite())
        .map(|e| 40.0 * ((e.clamp(1.0, 5.0) - 1.0) / 4.0))
        .unwrap_or(20.0);
    let duration = if target_minutes > 0.0 {
        20.0 * (1.0 - ((estimated_minutes - target_minutes).abs() / target_minutes)).max(0.0)
    } else {
        0.0
    };
    (seo + effectiveness + duration).round().clamp(1.0, 100.0) as u8
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use vscript_llm::{CannedGenerator, CannedReply};
    use vscript_models::{NarrativeReport, ReportQuality, SeoIssue, SynthesisPatterns};

    fn synthesis() -> PatternSynthesis {
        PatternSynthesis {
            topic: "n8n".to_string(),
            items_analyzed: 4,
            items_requested: Some(5),
            patterns: SynthesisPatterns {
                average_effectiveness: Some(5.0),
                ..Default::default()
            },
            report: NarrativeReport {
                markdown: "## Hooks\nQuestions work best.".to_string(),
                quality: ReportQuality::Template,
            },
            synthesized_at: Utc::now(),
        }
    }

    fn reply(words: usize) -> String {
        let body = vec!["word"; words].join(" ");
        serde_json::json!({
            "script_markdown": format!("# Title\n[00:00] {body}"),
            "title": "x".repeat(60),
            "description": vec!["desc"; 170].join(" "),
            "tags": (0..16).map(|i| format!("#tag{i}")).collect::<Vec<_>>(),
        })
        .to_string()
    }

    #[test]
    fn test_spoken_word_count() {
        let md = "# Intro\n[00:00] Hello there, friends!\n[B-ROLL: terminal]\n```\ncode here\n```\n- Step one -";
        assert_eq!(spoken_word_count(md), 5);
    }

    #[test]
    fn test_estimate_quality_bounds() {
        let perfect = estimate_quality(&SeoValidation::default(), Some(5.0), 10.0, 10.0);
        assert_eq!(perfect, 100);

        let bad = SeoValidation {
            issues: vec![
                SeoIssue::TitleLength { chars: 1 },
                SeoIssue::DescriptionLength { words: 1 },
                SeoIssue::TagCount { tags: 0 },
            ],
        };
        assert_eq!(estimate_quality(&bad, Some(1.0), 100.0, 10.0), 1);
        assert_eq!(estimate_quality(&bad, None, 10.0, 10.0), 40);
    }

    #[tokio::test]
    async fn test_generate_script() {
        let generator = Arc::new(CannedGenerator::new(reply(1500)));
        let script = ScriptGenerator::new(generator.clone())
            .generate("n8n local install", &synthesis(), 10.0, Some("casual"))
            .await
            .unwrap();

        assert_eq!(script.word_count, 1500);
        assert_eq!(script.estimated_duration_minutes, 10.0);
        assert!(script.seo_validation.is_valid());
        assert_eq!(script.seo.tags[0], "tag0");
        assert_eq!(script.reference_count, 4);
        assert_eq!(script.estimated_quality_score, 100);
        assert_eq!(script.style.as_deref(), Some("casual"));

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("Questions work best."));
        assert!(prompt.contains("~1500 spoken words"));
        assert!(prompt.contains("STYLE: casual"));
    }

    #[tokio::test]
    async fn test_generate_reports_seo_issues() {
        let reply = serde_json::json!({
            "script_markdown": "Short script.",
            "title": "Too short",
            "tags": ["a", "A", "b"],
        })
        .to_string();
        let script = ScriptGenerator::new(Arc::new(CannedGenerator::new(reply)))
            .generate("idea", &synthesis(), 10.0, None)
            .await
            .unwrap();

        assert_eq!(script.seo.tags, vec!["a", "b"]);
        assert_eq!(script.seo_validation.issues.len(), 3);
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_script() {
        let err = ScriptGenerator::new(Arc::new(CannedGenerator::new(r#"{"title": "t"}"#)))
            .generate("idea", &synthesis(), 10.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::ScriptFailed(_)));
    }

    #[tokio::test]
    async fn test_generate_propagates_quota() {
        let generator = CannedGenerator::with_fallback(CannedReply::QuotaExceeded);
        let err = ScriptGenerator::new(Arc::new(generator))
            .generate("idea", &synthesis(), 10.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Llm(ref e) if e.is_quota_exceeded()));
    }

    #[tokio::test]
    async fn test_generate_validates_input() {
        let generator = Arc::new(CannedGenerator::new(reply(10)));
        let script_gen = ScriptGenerator::new(generator.clone());
        assert!(script_gen.generate("  ", &synthesis(), 10.0, None).await.is_err());
        assert!(script_gen.generate("idea", &synthesis(), 0.0, None).await.is_err());
        assert_eq!(generator.call_count(), 0);
    }
}
