//! Per-item analyzer: transcript in, structural/rhetorical signals out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use vscript_llm::{generate_json, GenerationRequest, TextGenerator};
use vscript_models::{AnalysisPayload, CandidateItem, ItemAnalysis};

use crate::error::AnalysisError;
use crate::metrics;
use crate::pool::run_bounded;
use crate::retry::{retry_async, RetryConfig};

/// Extracts an [`ItemAnalysis`] per candidate via the generative service.
pub struct ItemAnalyzer {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    retry: RetryConfig,
    transcript_chars: usize,
    parallelism: usize,
}

impl ItemAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            timeout: Duration::from_secs(180),
            retry: RetryConfig::new("item_analysis"),
            transcript_chars: 60_000,
            parallelism: 3,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_transcript_chars(mut self, chars: usize) -> Self {
        self.transcript_chars = chars.max(1);
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Analyze one item. The effectiveness score always comes from the item.
    pub async fn analyze(&self, item: &CandidateItem) -> Result<ItemAnalysis, AnalysisError> {
        let transcript = item
            .transcript
            .as_ref()
            .filter(|t| !t.is_blank())
            .ok_or_else(|| AnalysisError::MissingTranscript(item.id.clone()))?;

        let prompt = build_prompt(item, &transcript.to_prompt_text(self.transcript_chars));

        let payload = retry_async(&self.retry, is_retryable, || {
            let request = GenerationRequest::new(prompt.clone()).with_temperature(0.2);
            async move {
                match tokio::time::timeout(
                    self.timeout,
                    generate_json::<AnalysisPayload>(self.generator.as_ref(), request),
                )
                .await
                {
                    Ok(Ok(payload)) => Ok(payload),
                    Ok(Err(e)) => Err(AnalysisError::from_llm(&item.id, e)),
                    Err(_) => Err(AnalysisError::Timeout {
                        item_id: item.id.clone(),
                        timeout: self.timeout,
                    }),
                }
            }
        })
        .await?;

        if payload.is_empty() {
            return Err(AnalysisError::Empty {
                item_id: item.id.clone(),
            });
        }

        Ok(ItemAnalysis::from_payload(item, payload))
    }

    /// Analyze every item with a bounded pool, dropping failures.
    pub async fn analyze_all(&self, items: &[CandidateItem]) -> Vec<ItemAnalysis> {
        let results = run_bounded(items.iter().collect(), self.parallelism, |item| async move {
            self.analyze(item).await
        })
        .await;

        let mut analyses = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(analysis) => {
                    metrics::record_analysis_success();
                    analyses.push(analysis);
                }
                Err(e) => {
                    metrics::record_analysis_failure(e.kind());
                    warn!(error = %e, "Dropping item from cohort");
                }
            }
        }

        info!(
            requested = items.len(),
            analyzed = analyses.len(),
            "Item analysis finished"
        );
        analyses
    }
}

fn is_retryable(err: &AnalysisError) -> bool {
    match err {
        AnalysisError::Timeout { .. } => true,
        AnalysisError::Service { source, .. } => source.is_retryable(),
        _ => false,
    }
}

fn build_prompt(item: &CandidateItem, transcript: &str) -> String {
    format!(
        r#"Analyze the structure and rhetoric of this YouTube video transcript.

VIDEO: "{title}" by {channel}
DURATION: {duration} seconds

Extract, using offsets in seconds (or MM:SS) from the timestamps in the transcript:
1. hook: the opening hook (usually the first 15-45 seconds): start, end, verbatim text,
   type (question | statistic | promise | problem-statement | other) and
   effectiveness (high | medium | low)
2. structure: ordered sections with label, start and end; intro_end; conclusion_start
3. ctas: every call to action with verbatim text, offset, position_percent (0-100 of
   the total duration) and type (like | subscribe | comment | share | other)
4. technical_terms, transition_phrases and common_phrases as used by the speaker
5. techniques: notable persuasion or teaching techniques, each with name and a short description
6. title_keywords and estimated_tags for SEO

Quote text verbatim. Leave a field out rather than guessing.

TRANSCRIPT:
{transcript}"#,
        title = item.title,
        channel = item.channel,
        duration = item.duration_seconds,
    )
}
