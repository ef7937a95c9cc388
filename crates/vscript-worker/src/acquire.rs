//! Transcript acquirer: attach a transcript to every candidate that can get one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use vscript_media::{AudioPipeline, MediaError};
use vscript_models::{CandidateItem, Transcript};

use crate::metrics;
use crate::pool::run_bounded;

/// Why one item produced no transcript.
#[derive(Debug, Error)]
enum AcquireFailure {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("transcript was empty")]
    Blank,

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<AcquireFailure> for MediaError {
    fn from(failure: AcquireFailure) -> Self {
        match failure {
            AcquireFailure::Media(e) => e,
            AcquireFailure::Blank => MediaError::transcription_failed("transcript was empty"),
            AcquireFailure::TimedOut(d) => MediaError::Timeout(d.as_secs()),
        }
    }
}

/// Fetches transcripts for a cohort with a bounded worker pool.
pub struct TranscriptAcquirer {
    pipeline: Arc<dyn AudioPipeline>,
    work_dir: PathBuf,
    parallelism: usize,
    item_timeout: Duration,
}

impl TranscriptAcquirer {
    pub fn new(
        pipeline: Arc<dyn AudioPipeline>,
        work_dir: impl Into<PathBuf>,
        parallelism: usize,
        item_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            work_dir: work_dir.into(),
            parallelism: parallelism.max(1),
            item_timeout,
        }
    }

    /// Items that ended up with a transcript, in input order.
    ///
    /// Items that already carry one pass through untouched; failures are
    /// logged and dropped.
    pub async fn acquire(&self, items: Vec<CandidateItem>) -> Vec<CandidateItem> {
        let requested = items.len();
        let results = run_bounded(items, self.parallelism, |item| self.acquire_one(item)).await;

        let acquired: Vec<CandidateItem> = results.into_iter().flatten().collect();
        info!(
            requested = requested,
            acquired = acquired.len(),
            "Transcript acquisition finished"
        );
        acquired
    }

    /// Transcript for one video outside a cohort run. `dir_name` names the
    /// scratch directory under the work dir.
    pub async fn transcribe_url(&self, url: &str, dir_name: &str) -> Result<Transcript, MediaError> {
        let dir = self.work_dir.join(sanitize_dir_name(dir_name));
        tokio::fs::create_dir_all(&dir).await?;
        let result = self.fetch(url, &dir).await;
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            warn!(path = %dir.display(), error = %e, "Failed to clean work dir");
        }

        let transcript = result?;
        metrics::record_transcript("ok");
        info!(url = %url, words = transcript.word_count(), "Transcript acquired");
        Ok(transcript)
    }

    async fn acquire_one(&self, item: CandidateItem) -> Option<CandidateItem> {
        if item.has_transcript() {
            return Some(item);
        }

        let item_dir = self.work_dir.join(sanitize_dir_name(&item.id));
        let result = match tokio::fs::create_dir_all(&item_dir).await {
            Ok(()) => self.fetch(&item.url, &item_dir).await,
            Err(e) => Err(MediaError::Io(e).into()),
        };

        if let Err(e) = tokio::fs::remove_dir_all(&item_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %item_dir.display(), error = %e, "Failed to clean item work dir");
            }
        }

        match result {
            Ok(transcript) => {
                metrics::record_transcript("ok");
                info!(
                    item_id = %item.id,
                    words = transcript.word_count(),
                    "Transcript acquired"
                );
                Some(item.with_transcript(transcript))
            }
            Err(e) => {
                metrics::record_transcript("failed");
                warn!(item_id = %item.id, url = %item.url, error = %e, "Dropping item without transcript");
                None
            }
        }
    }

    async fn fetch(&self, url: &str, dir: &Path) -> Result<Transcript, AcquireFailure> {
        let transcript = tokio::time::timeout(self.item_timeout, self.pipeline.transcribe(url, dir))
        .await
        .map_err(|_| AcquireFailure::TimedOut(self.item_timeout))??;

        if transcript.is_blank() {
            return Err(AcquireFailure::Blank);
        }
        Ok(transcript)
    }
}

fn sanitize_dir_name(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "item".to_string()
    } else {
        cleaned
    }
}
