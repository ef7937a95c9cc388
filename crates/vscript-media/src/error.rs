//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while searching, downloading or transcribing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found (looked for {0})")]
    YtDlpNotFound(String),

    #[error("speech-to-text binary not found (looked for {0})")]
    SpeechToTextNotFound(String),

    #[error("{program} failed: {message}")]
    CommandFailed {
        program: String,
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Media unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Rate limited by video platform: {0}")]
    RateLimited(String),

    #[error("No subtitles available")]
    NoSubtitles,

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    pub fn transcription_failed(message: impl Into<String>) -> Self {
        Self::TranscriptionFailed(message.into())
    }

    /// Classify yt-dlp stderr into a typed error.
    pub fn from_ytdlp_stderr(stderr: &str) -> Self {
        let msg = stderr.to_lowercase();
        let summary = last_error_line(stderr);

        if msg.contains("429") || msg.contains("too many requests") {
            return Self::RateLimited(summary);
        }
        if msg.contains("private video")
            || msg.contains("video unavailable")
            || msg.contains("video is unavailable")
            || msg.contains("has been removed")
            || msg.contains("not available in your country")
            || (msg.contains("age") && msg.contains("restrict"))
            || msg.contains("live event")
        {
            return Self::Unavailable(summary);
        }
        if msg.contains("unsupported url") || msg.contains("requested format is not available") {
            return Self::UnsupportedFormat(summary);
        }
        Self::download_failed(summary)
    }

    /// Whether retrying the same item could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MediaError::DownloadFailed { .. }
                | MediaError::RateLimited(_)
                | MediaError::Timeout(_)
                | MediaError::Io(_)
        )
    }
}

fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR"))
        .or_else(|| stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or("no output")
        .to_string()
}
