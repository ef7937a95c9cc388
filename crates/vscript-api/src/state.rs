//! Application state.

use std::sync::Arc;

use vscript_llm::GeminiClient;
use vscript_media::{MediaConfig, YtDlpAudioPipeline, YtDlpSearcher};
use vscript_worker::{PatternSynthesizer, PipelineConfig, PipelineServices, ScriptPipeline};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<ScriptPipeline>,
    /// Synthesizer for caller-supplied analyses
    pub synthesizer: Arc<PatternSynthesizer>,
    /// Name of the generative backend, for readiness output
    pub generator_name: String,
    /// Media tooling to probe on readiness; `None` skips the probe
    pub media: Option<MediaConfig>,
}

impl AppState {
    /// Build state from explicit collaborators.
    pub fn new(config: ApiConfig, pipeline_config: PipelineConfig, services: PipelineServices) -> Self {
        let generator_name = services.generator.name().to_string();
        let synthesizer = Arc::new(PatternSynthesizer::new(services.generator.clone()));
        Self {
            config,
            pipeline: Arc::new(ScriptPipeline::new(pipeline_config, services)),
            synthesizer,
            generator_name,
            media: None,
        }
    }

    /// Probe `media` tooling on readiness checks.
    pub fn with_media(mut self, media: MediaConfig) -> Self {
        self.media = Some(media);
        self
    }

    /// Production state: Gemini plus yt-dlp, configured from the environment.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let generator = GeminiClient::from_env()?;
        let media = MediaConfig::from_env();
        let services = PipelineServices {
            generator: Arc::new(generator),
            index: Arc::new(YtDlpSearcher::new(media.clone())),
            audio: Arc::new(YtDlpAudioPipeline::new(media.clone())),
        };
        Ok(Self::new(config, PipelineConfig::from_env(), services).with_media(media))
    }
}
