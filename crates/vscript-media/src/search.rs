//! Video index: keyword search returning engagement metadata.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use vscript_models::{canonical_watch_url, DurationRange, VideoMetadata};

use crate::command::{check_ytdlp, run_with_timeout, ytdlp_base_args};
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

/// A search against the video index.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    pub duration: Option<DurationRange>,
}

/// External video-metadata provider.
#[async_trait]
pub trait VideoIndex: Send + Sync {
    /// Ordered results; an empty list is a valid answer.
    async fn search(&self, request: &SearchRequest) -> MediaResult<Vec<VideoMetadata>>;

    /// Metadata for one video URL. Indexes that cannot resolve single
    /// videos report it as unavailable.
    async fn lookup(&self, url: &str) -> MediaResult<VideoMetadata> {
        Err(MediaError::Unavailable(format!("metadata lookup not supported for {url}")))
    }
}

/// Searches YouTube through `yt-dlp ytsearchN:<query> --dump-json`.
pub struct YtDlpSearcher {
    config: MediaConfig,
}

impl YtDlpSearcher {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, request: &SearchRequest) -> Vec<String> {
        let mut args = ytdlp_base_args(&self.config);
        args.extend([
            "--dump-json".to_string(),
            "--skip-download".to_string(),
            "--ignore-errors".to_string(),
        ]);
        if let Some(range) = request.duration {
            args.push("--match-filter".to_string());
            args.push(format!(
                "duration >= {} & duration <= {}",
                (range.min_minutes * 60.0).floor() as u64,
                (range.max_minutes * 60.0).ceil() as u64
            ));
        }
        args.push(format!("ytsearch{}:{}", request.max_results.max(1), request.query));
        args
    }

    fn build_lookup_args(&self, url: &str) -> Vec<String> {
        let mut args = ytdlp_base_args(&self.config);
        args.extend([
            "--dump-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            url.to_string(),
        ]);
        args
    }
}

#[async_trait]
impl VideoIndex for YtDlpSearcher {
    async fn search(&self, request: &SearchRequest) -> MediaResult<Vec<VideoMetadata>> {
        let ytdlp = check_ytdlp(&self.config)?;
        info!(query = %request.query, max_results = request.max_results, "Searching videos");

        let output =
            run_with_timeout(&ytdlp, &self.build_args(request), self.config.search_timeout).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        // --ignore-errors exits non-zero when any single entry fails; only
        // treat it as a failure when nothing usable came back.
        let results = parse_search_output(&stdout);
        if results.is_empty() && !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::from_ytdlp_stderr(&stderr));
        }

        info!(results = results.len(), "Search finished");
        Ok(results)
    }

    async fn lookup(&self, url: &str) -> MediaResult<VideoMetadata> {
        let ytdlp = check_ytdlp(&self.config)?;
        let output =
            run_with_timeout(&ytdlp, &self.build_lookup_args(url), self.config.search_timeout).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::from_ytdlp_stderr(&stderr));
        }

        parse_search_output(&String::from_utf8_lossy(&output.stdout))
            .into_iter()
            .next()
            .ok_or_else(|| MediaError::Unavailable(format!("no metadata returned for {url}")))
    }
}

/// One `--dump-json` line, reduced to the fields we use.
#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    like_count: Option<u64>,
    /// `YYYYMMDD`
    #[serde(default)]
    upload_date: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

impl From<YtDlpEntry> for VideoMetadata {
    fn from(e: YtDlpEntry) -> Self {
        VideoMetadata {
            url: e.webpage_url.unwrap_or_else(|| canonical_watch_url(&e.id)),
            title: e.title.unwrap_or_default(),
            channel: e.channel.or(e.uploader).unwrap_or_default(),
            view_count: e.view_count.unwrap_or(0),
            like_count: e.like_count,
            published_at: e
                .upload_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y%m%d").ok()),
            duration_seconds: e
                .duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| d.round() as u32),
            id: e.id,
        }
    }
}

/// Parse newline-delimited yt-dlp JSON, skipping unparsable lines.
pub fn parse_search_output(stdout: &str) -> Vec<VideoMetadata> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('{'))
        .filter_map(|line| match serde_json::from_str::<YtDlpEntry>(line) {
            Ok(entry) => Some(VideoMetadata::from(entry)),
            Err(e) => {
                warn!(error = %e, "Skipping unparsable search result");
                None
            }
        })
        .collect()
}
