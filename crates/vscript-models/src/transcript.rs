//! Transcripts produced by the audio pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::format_clock;

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSource {
    /// Platform subtitles (manual or automatic captions)
    Subtitles,
    /// Downloaded audio run through speech-to-text
    SpeechToText,
    /// Supplied by the caller
    Provided,
}

/// A transcript line with a coarse start offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimedLine {
    pub start_seconds: f64,
    pub text: String,
}

/// Plain-text transcript with optional timing hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transcript {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<TimedLine>,

    pub source: TranscriptSource,
}

impl Transcript {
    /// Build a transcript from timed lines; the plain text is their join.
    pub fn from_segments(segments: Vec<TimedLine>, source: TranscriptSource) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            language: None,
            segments,
            source,
        }
    }

    pub fn from_text(text: impl Into<String>, source: TranscriptSource) -> Self {
        Self {
            text: text.into(),
            language: None,
            segments: Vec::new(),
            source,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Render for a prompt: `[MM:SS] text` lines when timing is known,
    /// otherwise plain text. Truncated to `max_chars` on a char boundary.
    pub fn to_prompt_text(&self, max_chars: usize) -> String {
        let rendered = if self.segments.is_empty() {
            self.text.clone()
        } else {
            self.segments
                .iter()
                .map(|s| format!("[{}] {}", format_clock(s.start_seconds), s.text.trim()))
                .collect::<Vec<_>>()
                .join("\n")
        };

        match rendered.char_indices().nth(max_chars) {
            Some((idx, _)) => rendered[..idx].to_string(),
            None => rendered,
        }
    }

    /// Plain-text file body: timed lines when available.
    pub fn to_file_text(&self) -> String {
        self.to_prompt_text(usize::MAX)
    }
}
