//! Audio pipeline: item locator in, transcript out.

use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};

use vscript_models::Transcript;

use crate::config::MediaConfig;
use crate::download::download_audio;
use crate::error::{MediaError, MediaResult};
use crate::subtitles::fetch_subtitles;
use crate::transcribe::transcribe_audio;

/// External download + speech-to-text collaborator.
#[async_trait]
pub trait AudioPipeline: Send + Sync {
    /// Produce a transcript for `url`, using `workdir` for temporary files.
    async fn transcribe(&self, url: &str, workdir: &Path) -> MediaResult<Transcript>;
}

/// Subtitles first, then audio download + speech-to-text.
pub struct YtDlpAudioPipeline {
    config: MediaConfig,
}

impl YtDlpAudioPipeline {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AudioPipeline for YtDlpAudioPipeline {
    async fn transcribe(&self, url: &str, workdir: &Path) -> MediaResult<Transcript> {
        if self.config.prefer_subtitles {
            match fetch_subtitles(&self.config, url, workdir).await {
                Ok(transcript) if !transcript.is_blank() => return Ok(transcript),
                Ok(_) | Err(MediaError::NoSubtitles) => {
                    info!(url = %url, "No subtitles, falling back to speech-to-text");
                }
                // Unavailable media will not download either
                Err(e @ MediaError::Unavailable(_)) => return Err(e),
                Err(e) => {
                    warn!(url = %url, error = %e, "Subtitle fetch failed, falling back to speech-to-text");
                }
            }
        }

        let audio = download_audio(&self.config, url, workdir).await?;
        let result = transcribe_audio(&self.config, &audio).await;

        if let Err(e) = tokio::fs::remove_file(&audio).await {
            warn!(path = %audio.display(), error = %e, "Failed to remove temporary audio");
        }
        result
    }
}
