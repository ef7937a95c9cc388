//! Candidate finder: search, score, filter, rank.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use vscript_media::{SearchRequest, VideoIndex};
use vscript_models::{CandidateItem, DurationRange, QualityModel};

use crate::error::WorkerResult;
use crate::metrics;

/// Upper bound on how many raw results are requested from the index.
const MAX_FETCH: usize = 50;

/// Finds and ranks candidate videos for a query.
pub struct CandidateFinder {
    index: Arc<dyn VideoIndex>,
    quality: QualityModel,
    reference_date: Option<NaiveDate>,
}

impl CandidateFinder {
    pub fn new(index: Arc<dyn VideoIndex>, quality: QualityModel) -> Self {
        Self {
            index,
            quality,
            reference_date: None,
        }
    }

    /// Score recency against a fixed date instead of today.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Candidates ranked by quality score, best first.
    ///
    /// Zero results and index failures both yield an empty list.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        range: DurationRange,
        target_minutes: f64,
    ) -> WorkerResult<Vec<CandidateItem>> {
        if max_results == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Over-fetch so the duration filter still leaves a full cohort.
        let request = SearchRequest {
            query: query.trim().to_string(),
            max_results: (max_results * 2).min(MAX_FETCH).max(max_results),
            duration: Some(range),
        };

        let raw = match self.index.search(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(query = %request.query, error = %e, "Video search failed, continuing with no candidates");
                return Ok(Vec::new());
            }
        };

        let today = self
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let target = (target_minutes.is_finite() && target_minutes > 0.0).then_some(target_minutes);
        let fetched = raw.len();

        let candidates = rank_candidates(
            raw.into_iter()
                .filter_map(|meta| CandidateItem::from_metadata(meta, &self.quality, target, today))
                .filter(|item| range.contains(item.duration_seconds))
                .collect(),
            max_results,
        );

        metrics::set_candidates_found(candidates.len());
        info!(
            query = %request.query,
            fetched = fetched,
            kept = candidates.len(),
            "Candidates ranked"
        );
        Ok(candidates)
    }
}

/// Sort by quality score descending, then newer publish date (unknown dates
/// last), then ID ascending. Drops duplicate IDs and keeps the first
/// `max_results`.
pub fn rank_candidates(mut items: Vec<CandidateItem>, max_results: usize) -> Vec<CandidateItem> {
    items.sort_by(|a, b| {
        b.quality_score()
            .total_cmp(&a.quality_score())
            .then_with(|| b.published_at.cmp(&a.published_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.id.clone()));
    items.truncate(max_results);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vscript_media::{MediaError, MediaResult};
    use vscript_models::VideoMetadata;

    struct FixedIndex(Vec<VideoMetadata>);

    #[async_trait]
    impl VideoIndex for FixedIndex {
        async fn search(&self, _request: &SearchRequest) -> MediaResult<Vec<VideoMetadata>> {
            Ok(self.0.clone())
        }
    }

    struct FailingIndex;

    #[async_trait]
    impl VideoIndex for FailingIndex {
        async fn search(&self, _request: &SearchRequest) -> MediaResult<Vec<VideoMetadata>> {
            Err(MediaError::RateLimited("429".to_string()))
        }
    }

    fn meta(id: &str, views: u64, minutes: u32) -> VideoMetadata {
        VideoMetadata {
            id: id.to_string(),
            url: format!("https://www.youtube.com/watch?v={id}"),
            title: format!("Video {id}"),
            channel: "chan".to_string(),
            view_count: views,
            like_count: Some(views / 20),
            published_at: NaiveDate::from_ymd_opt(2024, 1, 1),
            duration_seconds: Some(minutes * 60),
        }
    }

    fn finder(index: impl VideoIndex + 'static) -> CandidateFinder {
        CandidateFinder::new(Arc::new(index), QualityModel::default())
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_search_ranks_and_filters() {
        let index = FixedIndex(vec![
            meta("low", 1_000, 10),
            meta("high", 500_000, 10),
            meta("short", 900_000, 1),
            meta("mid", 50_000, 10),
        ]);

        let items = finder(index)
            .search("rust", 10, DurationRange::new(3.0, 30.0), 10.0)
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
        assert!(items.windows(2).all(|w| w[0].quality_score() >= w[1].quality_score()));
    }

    #[tokio::test]
    async fn test_search_truncates() {
        let index = FixedIndex((0..8).map(|i| meta(&format!("v{i}"), 10_000 * (i + 1), 10)).collect());
        let items = finder(index)
            .search("rust", 3, DurationRange::default(), 10.0)
            .await
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "v7");
    }

    #[tokio::test]
    async fn test_search_tolerates_empty_and_failure() {
        let items = finder(FixedIndex(Vec::new()))
            .search("rust", 5, DurationRange::default(), 10.0)
            .await
            .unwrap();
        assert!(items.is_empty());

        let items = finder(FailingIndex)
            .search("rust", 5, DurationRange::default(), 10.0)
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_rank_ties_prefer_newer_then_id() {
        // Views above the reference and ages past the recency floor give equal scores.
        let model = QualityModel::default();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let item = |id: &str, published: Option<NaiveDate>| {
            let mut m = meta(id, 5_000_000, 10);
            m.published_at = published;
            CandidateItem::from_metadata(m, &model, Some(10.0), today).unwrap()
        };
        let items = vec![
            item("b-2015", NaiveDate::from_ymd_opt(2015, 3, 1)),
            item("z-2018", NaiveDate::from_ymd_opt(2018, 3, 1)),
            item("a-2015", NaiveDate::from_ymd_opt(2015, 3, 1)),
            item("b-2015", NaiveDate::from_ymd_opt(2015, 3, 1)),
        ];
        assert_eq!(items[0].quality_score(), items[1].quality_score());

        let ranked = rank_candidates(items, 10);
        let ids: Vec<_> = ranked.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["z-2018", "a-2015", "b-2015"]);
    }

    #[tokio::test]
    async fn test_unknown_duration_dropped() {
        let mut m = meta("nodur", 100_000, 10);
        m.duration_seconds = None;
        let items = finder(FixedIndex(vec![m]))
            .search("rust", 5, DurationRange::default(), 10.0)
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
