//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use vscript_models::{DurationRange, QualityModel, QualityWeights};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Cohort size: candidates kept after ranking
    pub max_videos: usize,
    /// Items transcribed/analyzed concurrently
    pub max_parallel: usize,
    /// Timeout for one item's transcript acquisition
    pub item_timeout: Duration,
    /// Timeout for one item's analysis call
    pub analysis_timeout: Duration,
    /// Retries for a retryable analysis failure
    pub analysis_retries: u32,
    /// Default script length when the idea states none
    pub target_minutes: f64,
    /// Accepted candidate durations
    pub duration_range: DurationRange,
    /// Scratch space for downloads
    pub work_dir: PathBuf,
    /// Root for persisted run artifacts
    pub output_dir: PathBuf,
    /// Write artifacts to `output_dir`
    pub persist: bool,
    /// Also produce a Spanish translation of the script
    pub translate_to_spanish: bool,
    /// Transcript characters sent per analysis prompt
    pub transcript_prompt_chars: usize,
    /// Candidate quality model
    pub quality: QualityModel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_videos: 10,
            max_parallel: 3,
            item_timeout: Duration::from_secs(900),
            analysis_timeout: Duration::from_secs(180),
            analysis_retries: 2,
            target_minutes: 10.0,
            duration_range: DurationRange::new(3.0, 30.0),
            work_dir: std::env::temp_dir().join("vscript"),
            output_dir: PathBuf::from("output"),
            persist: true,
            translate_to_spanish: false,
            transcript_prompt_chars: 60_000,
            quality: QualityModel::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let weights = QualityWeights {
            views: env_parse("QUALITY_WEIGHT_VIEWS").unwrap_or(defaults.quality.weights.views),
            duration: env_parse("QUALITY_WEIGHT_DURATION")
                .unwrap_or(defaults.quality.weights.duration),
            recency: env_parse("QUALITY_WEIGHT_RECENCY").unwrap_or(defaults.quality.weights.recency),
            completeness: env_parse("QUALITY_WEIGHT_COMPLETENESS")
                .unwrap_or(defaults.quality.weights.completeness),
        };

        Self {
            max_videos: env_parse("PIPELINE_MAX_VIDEOS").unwrap_or(defaults.max_videos),
            max_parallel: env_parse("PIPELINE_MAX_PARALLEL").unwrap_or(defaults.max_parallel),
            item_timeout: Duration::from_secs(env_parse("PIPELINE_ITEM_TIMEOUT_SECS").unwrap_or(900)),
            analysis_timeout: Duration::from_secs(
                env_parse("PIPELINE_ANALYSIS_TIMEOUT_SECS").unwrap_or(180),
            ),
            analysis_retries: env_parse("PIPELINE_ANALYSIS_RETRIES")
                .unwrap_or(defaults.analysis_retries),
            target_minutes: env_parse("PIPELINE_TARGET_MINUTES").unwrap_or(defaults.target_minutes),
            duration_range: DurationRange::new(
                env_parse("PIPELINE_MIN_DURATION_MINUTES")
                    .unwrap_or(defaults.duration_range.min_minutes),
                env_parse("PIPELINE_MAX_DURATION_MINUTES")
                    .unwrap_or(defaults.duration_range.max_minutes),
            ),
            work_dir: std::env::var("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("PIPELINE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            persist: env_flag("PIPELINE_PERSIST").unwrap_or(defaults.persist),
            translate_to_spanish: env_flag("PIPELINE_TRANSLATE_ES")
                .unwrap_or(defaults.translate_to_spanish),
            transcript_prompt_chars: env_parse("PIPELINE_TRANSCRIPT_PROMPT_CHARS")
                .unwrap_or(defaults.transcript_prompt_chars),
            quality: QualityModel::new(
                weights,
                env_parse("QUALITY_REFERENCE_VIEWS").unwrap_or(defaults.quality.reference_views),
            ),
        }
    }

    /// Concurrency bound, never below one.
    pub fn parallelism(&self) -> usize {
        self.max_parallel.max(1)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_videos, 10);
        assert_eq!(config.parallelism(), 3);
        assert_eq!(config.quality.reference_views, 100_000);
        assert!(config.duration_range.contains(600));
    }

    #[test]
    fn test_parallelism_floor() {
        let config = PipelineConfig {
            max_parallel: 0,
            ..Default::default()
        };
        assert_eq!(config.parallelism(), 1);
    }
}
