//! Discovered candidate videos.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scoring::{effectiveness_from_quality, EngagementSignals, QualityModel};
use crate::transcript::Transcript;

/// Raw metadata as returned by a video index, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub published_at: Option<NaiveDate>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

/// Accepted duration window in minutes, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DurationRange {
    pub min_minutes: f64,
    pub max_minutes: f64,
}

impl DurationRange {
    pub fn new(min_minutes: f64, max_minutes: f64) -> Self {
        Self {
            min_minutes,
            max_minutes,
        }
    }

    pub fn contains(&self, duration_seconds: u32) -> bool {
        let minutes = duration_seconds as f64 / 60.0;
        minutes >= self.min_minutes && minutes <= self.max_minutes
    }
}

impl Default for DurationRange {
    fn default() -> Self {
        Self::new(3.0, 30.0)
    }
}

/// One discovered video.
///
/// The quality score is fixed at construction; the only later change is
/// attaching a transcript, which yields a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CandidateItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub channel: String,
    pub view_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<NaiveDate>,
    pub duration_seconds: u32,
    quality_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
}

impl CandidateItem {
    /// Score raw metadata. Returns `None` when the duration is unknown or zero.
    pub fn from_metadata(
        meta: VideoMetadata,
        model: &QualityModel,
        target_minutes: Option<f64>,
        today: NaiveDate,
    ) -> Option<Self> {
        let duration_seconds = meta.duration_seconds.filter(|d| *d > 0)?;
        let signals = EngagementSignals {
            view_count: meta.view_count,
            like_count: meta.like_count,
            duration_seconds,
            published_at: meta.published_at,
        };
        let quality_score = model.score(&signals, target_minutes, today);

        Some(Self {
            id: meta.id,
            url: meta.url,
            title: meta.title,
            channel: meta.channel,
            view_count: meta.view_count,
            like_count: meta.like_count,
            published_at: meta.published_at,
            duration_seconds,
            quality_score,
            transcript: None,
        })
    }

    /// Quality score in [0, 5].
    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    /// Quality rescaled to the 1-5 effectiveness range used as a synthesis weight.
    pub fn effectiveness_score(&self) -> f64 {
        effectiveness_from_quality(self.quality_score)
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds as f64 / 60.0
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn has_transcript(&self) -> bool {
        self.transcript.as_ref().is_some_and(|t| !t.is_blank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptSource;

    fn meta(duration: Option<u32>) -> VideoMetadata {
        VideoMetadata {
            id: "abc".into(),
            url: "https://www.youtube.com/watch?v=abc".into(),
            title: "Install n8n locally".into(),
            channel: "Automations".into(),
            view_count: 100_000,
            like_count: Some(5_000),
            published_at: NaiveDate::from_ymd_opt(2026, 2, 1),
            duration_seconds: duration,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    #[test]
    fn test_from_metadata_scores_once() {
        let item =
            CandidateItem::from_metadata(meta(Some(600)), &QualityModel::default(), Some(10.0), today())
                .unwrap();
        assert_eq!(item.quality_score(), 5.0);
        assert_eq!(item.effectiveness_score(), 5.0);
        assert!(!item.has_transcript());
    }

    #[test]
    fn test_missing_duration_is_rejected() {
        let model = QualityModel::default();
        assert!(CandidateItem::from_metadata(meta(None), &model, None, today()).is_none());
        assert!(CandidateItem::from_metadata(meta(Some(0)), &model, None, today()).is_none());
    }

    #[test]
    fn test_with_transcript_keeps_score() {
        let item =
            CandidateItem::from_metadata(meta(Some(600)), &QualityModel::default(), Some(10.0), today())
                .unwrap();
        let score = item.quality_score();
        let enriched = item.with_transcript(Transcript::from_text("hi", TranscriptSource::Provided));
        assert!(enriched.has_transcript());
        assert_eq!(enriched.quality_score(), score);
    }

    #[test]
    fn test_duration_range() {
        let range = DurationRange::new(3.0, 30.0);
        assert!(range.contains(180));
        assert!(range.contains(1800));
        assert!(!range.contains(179));
        assert!(!range.contains(1801));
    }
}
