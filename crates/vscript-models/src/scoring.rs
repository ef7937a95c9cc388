//! Candidate quality scoring.
//!
//! The quality score is a 0-5 blend of four engagement signals. It is
//! computed once when a [`CandidateItem`](crate::CandidateItem) is created,
//! used to rank candidates, and later rescaled to the 1-5 effectiveness
//! score that weights the item's analysis during synthesis.

use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound of the quality score.
pub const MAX_QUALITY_SCORE: f64 = 5.0;

/// Effectiveness score bounds.
pub const MIN_EFFECTIVENESS: f64 = 1.0;
pub const MAX_EFFECTIVENESS: f64 = 5.0;

/// View count treated as a perfect view score.
pub const DEFAULT_REFERENCE_VIEWS: u64 = 100_000;

/// Target duration assumed when the caller expresses no preference.
pub const DEFAULT_TARGET_MINUTES: f64 = 15.0;

/// Relative weights of the four quality signals.
///
/// Weights need not sum to one; they are normalised before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QualityWeights {
    pub views: f64,
    pub duration: f64,
    pub recency: f64,
    pub completeness: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            views: 0.4,
            duration: 0.2,
            recency: 0.2,
            completeness: 0.2,
        }
    }
}

impl QualityWeights {
    /// Weights scaled to sum to one. Negative or non-finite weights count as
    /// zero; an all-zero set falls back to the defaults.
    pub fn normalized(&self) -> Self {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let (v, d, r, c) = (
            clean(self.views),
            clean(self.duration),
            clean(self.recency),
            clean(self.completeness),
        );
        let sum = v + d + r + c;
        if sum <= f64::EPSILON {
            return Self::default();
        }
        Self {
            views: v / sum,
            duration: d / sum,
            recency: r / sum,
            completeness: c / sum,
        }
    }
}

/// Engagement signals feeding the quality score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementSignals {
    pub view_count: u64,
    pub like_count: Option<u64>,
    pub duration_seconds: u32,
    pub published_at: Option<NaiveDate>,
}

/// Tunable quality model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QualityModel {
    pub weights: QualityWeights,
    pub reference_views: u64,
}

impl Default for QualityModel {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            reference_views: DEFAULT_REFERENCE_VIEWS,
        }
    }
}

impl QualityModel {
    pub fn new(weights: QualityWeights, reference_views: u64) -> Self {
        Self {
            weights,
            reference_views,
        }
    }

    /// Score a candidate in [0, 5], rounded to two decimals.
    ///
    /// `target_minutes` of `None` means "no preference" and uses
    /// [`DEFAULT_TARGET_MINUTES`].
    pub fn score(
        &self,
        signals: &EngagementSignals,
        target_minutes: Option<f64>,
        today: NaiveDate,
    ) -> f64 {
        let w = self.weights.normalized();
        let target = target_minutes
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or(DEFAULT_TARGET_MINUTES);

        let blended = view_score(signals.view_count, self.reference_views) * w.views
            + duration_score(signals.duration_seconds, target) * w.duration
            + recency_score(signals.published_at, today) * w.recency
            + completeness_score(signals.like_count) * w.completeness;

        round2((blended * MAX_QUALITY_SCORE).clamp(0.0, MAX_QUALITY_SCORE))
    }
}

/// Views normalised against the reference count, capped at 1.
pub fn view_score(view_count: u64, reference_views: u64) -> f64 {
    if reference_views == 0 {
        return 1.0;
    }
    (view_count as f64 / reference_views as f64).min(1.0)
}

/// Proximity of the duration to the target: within 3 minutes scores 1.0,
/// within 6 minutes 0.7, anything further 0.4.
pub fn duration_score(duration_seconds: u32, target_minutes: f64) -> f64 {
    let diff = (duration_seconds as f64 / 60.0 - target_minutes).abs();
    if diff <= 3.0 {
        1.0
    } else if diff <= 6.0 {
        0.7
    } else {
        0.4
    }
}

/// Recency by calendar year: this year scores 1.0, each year older loses
/// 0.2, floored at 0.3. Unknown dates score 0.5.
pub fn recency_score(published_at: Option<NaiveDate>, today: NaiveDate) -> f64 {
    match published_at {
        Some(date) => {
            let years_old = (today.year() - date.year()) as f64;
            (1.0 - years_old * 0.2).clamp(0.3, 1.0)
        }
        None => 0.5,
    }
}

/// Metadata completeness: a known like count scores 1.0, otherwise 0.8.
pub fn completeness_score(like_count: Option<u64>) -> f64 {
    if like_count.is_some() {
        1.0
    } else {
        0.8
    }
}

/// Rescale a 0-5 quality score to the 1-5 effectiveness range.
pub fn effectiveness_from_quality(quality: f64) -> f64 {
    if !quality.is_finite() {
        return MIN_EFFECTIVENESS;
    }
    let q = quality.clamp(0.0, MAX_QUALITY_SCORE);
    round2(MIN_EFFECTIVENESS + q * (MAX_EFFECTIVENESS - MIN_EFFECTIVENESS) / MAX_QUALITY_SCORE)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn signals(views: u64, likes: Option<u64>, minutes: u32, published: Option<NaiveDate>) -> EngagementSignals {
        EngagementSignals {
            view_count: views,
            like_count: likes,
            duration_seconds: minutes * 60,
            published_at: published,
        }
    }

    #[test]
    fn test_perfect_candidate_scores_five() {
        let model = QualityModel::default();
        let today = date(2026, 6, 1);
        let s = signals(250_000, Some(10_000), 10, Some(date(2026, 1, 15)));
        assert_eq!(model.score(&s, Some(10.0), today), 5.0);
    }

    #[test]
    fn test_blended_score_matches_weights() {
        let model = QualityModel::default();
        let today = date(2026, 6, 1);
        // views 0.1, duration 0.4 (15 min off target), recency 0.6, completeness 0.8
        let s = signals(10_000, None, 25, Some(date(2024, 1, 1)));
        let expected = (0.1 * 0.4 + 0.4 * 0.2 + 0.6 * 0.2 + 0.8 * 0.2) * 5.0;
        assert!((model.score(&s, Some(10.0), today) - round2(expected)).abs() < 1e-9);
    }

    #[test]
    fn test_default_target_is_fifteen_minutes() {
        let model = QualityModel::default();
        let today = date(2026, 6, 1);
        let s = signals(100_000, Some(1), 15, Some(date(2026, 1, 1)));
        assert_eq!(model.score(&s, None, today), 5.0);
    }

    #[test]
    fn test_duration_bands() {
        assert_eq!(duration_score(600, 10.0), 1.0);
        assert_eq!(duration_score(13 * 60, 10.0), 1.0);
        assert_eq!(duration_score(15 * 60, 10.0), 0.7);
        assert_eq!(duration_score(30 * 60, 10.0), 0.4);
    }

    #[test]
    fn test_recency_floor_and_unknown() {
        let today = date(2026, 6, 1);
        assert_eq!(recency_score(Some(date(2010, 1, 1)), today), 0.3);
        assert_eq!(recency_score(None, today), 0.5);
        assert_eq!(recency_score(Some(date(2027, 1, 1)), today), 1.0);
    }

    #[test]
    fn test_custom_weights_are_normalised() {
        let weights = QualityWeights {
            views: 2.0,
            duration: 0.0,
            recency: 0.0,
            completeness: 0.0,
        };
        let model = QualityModel::new(weights, 1_000);
        let s = signals(500, None, 60, None);
        assert_eq!(model.score(&s, Some(10.0), date(2026, 1, 1)), 2.5);
    }

    #[test]
    fn test_zero_weights_fall_back_to_defaults() {
        let zero = QualityWeights {
            views: 0.0,
            duration: -1.0,
            recency: f64::NAN,
            completeness: 0.0,
        };
        assert_eq!(zero.normalized(), QualityWeights::default());
    }

    #[test]
    fn test_effectiveness_scaling() {
        assert_eq!(effectiveness_from_quality(0.0), 1.0);
        assert_eq!(effectiveness_from_quality(5.0), 5.0);
        assert_eq!(effectiveness_from_quality(2.5), 3.0);
        assert_eq!(effectiveness_from_quality(9.0), 5.0);
        assert_eq!(effectiveness_from_quality(f64::NAN), 1.0);
    }
}
