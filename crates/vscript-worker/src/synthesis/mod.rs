//! Pattern synthesizer.
//!
//! Turns a cohort of per-item analyses into one [`PatternSynthesis`]:
//! - [`aggregate`]: pure weighted aggregation (hooks, structure, CTAs,
//!   vocabulary, techniques, SEO)
//! - [`report`]: narrative rendering through the generative service, with a
//!   deterministic template fallback

pub mod aggregate;
pub mod report;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use vscript_llm::{strip_code_fences, GenerationRequest, LlmError, TextGenerator};
use vscript_models::{ItemAnalysis, NarrativeReport, PatternSynthesis, ReportQuality, SynthesisPatterns};

use crate::error::WorkerResult;
use crate::metrics;

pub use aggregate::aggregate;
pub use report::{build_narrative_prompt, has_required_headings, render_template_report, REPORT_HEADINGS};

const DEFAULT_NARRATIVE_TIMEOUT: Duration = Duration::from_secs(120);

/// Aggregates analyses and renders the synthesis report.
pub struct PatternSynthesizer {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl PatternSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
            timeout: DEFAULT_NARRATIVE_TIMEOUT,
        }
    }

    /// Synthesizer that always uses the template report.
    pub fn template_only() -> Self {
        Self {
            generator: None,
            timeout: DEFAULT_NARRATIVE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Synthesize `analyses` for `topic`.
    ///
    /// Fails with `InsufficientData` on an empty cohort. A narrative
    /// rendering failure degrades the report to the template, never the run.
    pub async fn synthesize(
        &self,
        topic: &str,
        analyses: &[ItemAnalysis],
        target_minutes: f64,
    ) -> WorkerResult<PatternSynthesis> {
        let patterns = aggregate(topic, analyses, target_minutes)?;
        let report = self.render(topic, &patterns, analyses.len()).await;

        metrics::record_synthesis(match report.quality {
            ReportQuality::Narrative => "narrative",
            ReportQuality::Template => "template",
        });
        info!(
            topic = %topic,
            items_analyzed = analyses.len(),
            hooks = patterns.top_hooks.len(),
            ctas = patterns.effective_ctas.len(),
            quality = ?report.quality,
            "Synthesis complete"
        );

        Ok(PatternSynthesis {
            topic: topic.to_string(),
            items_analyzed: analyses.len(),
            items_requested: None,
            patterns,
            report,
            synthesized_at: Utc::now(),
        })
    }

    async fn render(
        &self,
        topic: &str,
        patterns: &SynthesisPatterns,
        items_analyzed: usize,
    ) -> NarrativeReport {
        let Some(generator) = self.generator.as_ref() else {
            return template(topic, patterns, items_analyzed);
        };

        let request = GenerationRequest::new(build_narrative_prompt(topic, patterns, items_analyzed))
            .with_temperature(0.3);
        let result = match tokio::time::timeout(self.timeout, generator.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout)),
        };

        match result {
            Ok(text) => {
                let markdown = strip_code_fences(&text).trim().to_string();
                if has_required_headings(&markdown) {
                    return NarrativeReport {
                        markdown,
                        quality: ReportQuality::Narrative,
                    };
                }
                warn!(topic = %topic, "Narrative report missing required headings, using template");
            }
            Err(e) => {
                warn!(topic = %topic, error = %e, "Narrative rendering unavailable, using template");
            }
        }
        template(topic, patterns, items_analyzed)
    }
}

fn template(topic: &str, patterns: &SynthesisPatterns, items_analyzed: usize) -> NarrativeReport {
    NarrativeReport {
        markdown: render_template_report(topic, patterns, items_analyzed),
        quality: ReportQuality::Template,
    }
}
