//! Single-video transcription and summaries.

use std::path::PathBuf;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use vscript_models::{RunId, TranscriptSource, VideoMetadata, VideoSummary};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub youtube_url: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub message: String,
    pub video: VideoMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub source: TranscriptSource,
    pub detected_language: Option<String>,
    /// Transcript length in characters
    pub transcription_length: usize,
    pub word_count: usize,
    pub transcript_preview: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub youtube_url: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub run_id: RunId,
    pub summary: VideoSummary,
    pub markdown: String,
    pub transcript_source: TranscriptSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// POST /api/transcribe
pub async fn transcribe(
    State(state): State<AppState>,
    Json(request): Json<TranscribeRequest>,
) -> ApiResult<Json<TranscribeResponse>> {
    let url = validated_url(&request.youtube_url)?;
    info!(url = %url, "Transcription requested");

    let outcome = state
        .pipeline
        .transcribe_video(url, request.title.as_deref())
        .await?;

    let transcript = outcome.transcript;
    Ok(Json(TranscribeResponse {
        message: "Transcription completed".to_string(),
        filename: outcome
            .output_path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned()),
        source: transcript.source,
        detected_language: transcript.language.clone(),
        transcription_length: transcript.text.chars().count(),
        word_count: transcript.word_count(),
        transcript_preview: preview(&transcript.text),
        video: outcome.video,
        text: transcript.text,
    }))
}

/// POST /api/summaries
pub async fn create_summary(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> ApiResult<Json<SummaryResponse>> {
    let url = validated_url(&request.youtube_url)?;
    info!(url = %url, "Summary requested");

    let outcome = state.pipeline.summarize_video(url).await?;
    Ok(Json(SummaryResponse {
        run_id: outcome.run_id,
        markdown: outcome.summary.to_markdown(),
        summary: outcome.summary,
        transcript_source: outcome.transcript_source,
        output_dir: outcome.output_dir,
    }))
}

fn validated_url(url: &str) -> ApiResult<&str> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ApiError::bad_request("youtube_url must be an http(s) URL"));
    }
    Ok(url)
}

/// First characters of a transcript, with an ellipsis when cut.
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short"), "short");
        let long = "ñ".repeat(250);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview(&"a".repeat(PREVIEW_CHARS)), "a".repeat(PREVIEW_CHARS));
    }

    #[test]
    fn test_validated_url() {
        assert_eq!(validated_url("  https://youtu.be/x ").unwrap(), "https://youtu.be/x");
        assert!(validated_url("youtu.be/x").is_err());
    }
}
