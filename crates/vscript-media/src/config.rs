//! Media tool configuration.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// yt-dlp executable name or path
    pub ytdlp_bin: String,
    /// Speech-to-text executable (openai-whisper CLI compatible)
    pub whisper_bin: String,
    /// Speech-to-text model name
    pub whisper_model: String,
    /// Try platform subtitles before downloading audio
    pub prefer_subtitles: bool,
    /// Subtitle languages in preference order
    pub subtitle_languages: Vec<String>,
    /// Netscape-format cookies file passed to yt-dlp
    pub cookies_path: Option<PathBuf>,
    /// Timeout for a search invocation
    pub search_timeout: Duration,
    /// Timeout for a subtitle or audio download
    pub download_timeout: Duration,
    /// Timeout for one speech-to-text run
    pub transcribe_timeout: Duration,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            whisper_bin: "whisper".to_string(),
            whisper_model: "base".to_string(),
            prefer_subtitles: true,
            subtitle_languages: vec!["en".into(), "en-US".into(), "en-GB".into(), "es".into()],
            cookies_path: None,
            search_timeout: Duration::from_secs(120),
            download_timeout: Duration::from_secs(600),
            transcribe_timeout: Duration::from_secs(1800),
        }
    }
}

impl MediaConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ytdlp_bin: std::env::var("YTDLP_BIN").unwrap_or(defaults.ytdlp_bin),
            whisper_bin: std::env::var("WHISPER_BIN").unwrap_or(defaults.whisper_bin),
            whisper_model: std::env::var("WHISPER_MODEL").unwrap_or(defaults.whisper_model),
            prefer_subtitles: std::env::var("MEDIA_PREFER_SUBTITLES")
                .ok()
                .map(|s| !matches!(s.trim().to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            subtitle_languages: std::env::var("MEDIA_SUBTITLE_LANGS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(String::from)
                        .collect::<Vec<_>>()
                })
                .filter(|langs| !langs.is_empty())
                .unwrap_or(defaults.subtitle_languages),
            cookies_path: std::env::var("YTDLP_COOKIES_PATH").ok().map(PathBuf::from),
            search_timeout: Duration::from_secs(
                std::env::var("SEARCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            download_timeout: Duration::from_secs(
                std::env::var("DOWNLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            transcribe_timeout: Duration::from_secs(
                std::env::var("TRANSCRIBE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
        }
    }
}
