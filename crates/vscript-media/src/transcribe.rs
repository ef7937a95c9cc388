//! Speech-to-text through a whisper-compatible CLI.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use vscript_models::{TimedLine, Transcript, TranscriptSource};

use crate::command::{check_whisper, run_with_timeout};
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

/// Transcribe `audio` with the configured model; JSON output lands next to it.
pub async fn transcribe_audio(config: &MediaConfig, audio: &Path) -> MediaResult<Transcript> {
    let whisper = check_whisper(config)?;
    let output_dir = audio.parent().unwrap_or_else(|| Path::new("."));

    info!(audio = %audio.display(), model = %config.whisper_model, "Transcribing audio");

    let args = vec![
        audio.to_string_lossy().into_owned(),
        "--model".to_string(),
        config.whisper_model.clone(),
        "--output_format".to_string(),
        "json".to_string(),
        "--output_dir".to_string(),
        output_dir.to_string_lossy().into_owned(),
        "--fp16".to_string(),
        "False".to_string(),
        "--verbose".to_string(),
        "False".to_string(),
    ];

    let output = run_with_timeout(&whisper, &args, config.transcribe_timeout).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::transcription_failed(stderr.trim().to_string()));
    }

    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    let json_path = output_dir.join(format!("{}.json", stem));
    let content = tokio::fs::read_to_string(&json_path).await?;
    tokio::fs::remove_file(&json_path).await.ok();

    parse_whisper_json(&content)
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    text: String,
}

/// Parse whisper's JSON output.
pub fn parse_whisper_json(content: &str) -> MediaResult<Transcript> {
    let parsed: WhisperOutput = serde_json::from_str(content)?;

    let segments: Vec<TimedLine> = parsed
        .segments
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| TimedLine {
            start_seconds: s.start.max(0.0).floor(),
            text: s.text.trim().to_string(),
        })
        .collect();

    let mut transcript = if segments.is_empty() {
        Transcript::from_text(parsed.text.trim(), TranscriptSource::SpeechToText)
    } else {
        Transcript::from_segments(segments, TranscriptSource::SpeechToText)
    };

    if transcript.is_blank() {
        return Err(MediaError::transcription_failed("speech-to-text produced no text"));
    }
    if let Some(lang) = parsed.language.filter(|l| !l.is_empty()) {
        transcript = transcript.with_language(lang);
    }
    Ok(transcript)
}
