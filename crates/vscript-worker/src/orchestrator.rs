//! End-to-end pipeline: idea → query → candidates → transcripts →
//! analyses → synthesis → script (→ translation).
//!
//! Stages run strictly in sequence; stages 3 and 4 fan out over the cohort.
//! Per-item failures shrink the cohort, they never abort the run.
//!
//! The pipeline also serves single-video requests: transcribe one URL, or
//! transcribe and summarize it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn, Instrument};

use vscript_llm::TextGenerator;
use vscript_media::{AudioPipeline, VideoIndex};
use vscript_models::{
    canonical_watch_url, extract_youtube_id, GeneratedScript, PatternSynthesis, RefinedQuery,
    RunId, Transcript, TranscriptSource, VideoMetadata, VideoSummary,
};

use crate::acquire::TranscriptAcquirer;
use crate::analyzer::ItemAnalyzer;
use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::finder::CandidateFinder;
use crate::logging::RunLogger;
use crate::metrics;
use crate::persist::ArtifactStore;
use crate::query::QueryRefiner;
use crate::retry::RetryConfig;
use crate::script::ScriptGenerator;
use crate::summarize::VideoSummarizer;
use crate::synthesis::PatternSynthesizer;
use crate::translate::ScriptTranslator;

/// External collaborators the pipeline is built on.
#[derive(Clone)]
pub struct PipelineServices {
    pub generator: Arc<dyn TextGenerator>,
    pub index: Arc<dyn VideoIndex>,
    pub audio: Arc<dyn AudioPipeline>,
}

/// One pipeline run's input. Unset fields fall back to [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineRequest {
    pub idea: String,
    pub target_minutes: Option<f64>,
    pub style: Option<String>,
    pub max_videos: Option<usize>,
    pub translate_to_spanish: Option<bool>,
    pub run_id: Option<RunId>,
}

impl PipelineRequest {
    pub fn new(idea: impl Into<String>) -> Self {
        Self {
            idea: idea.into(),
            ..Default::default()
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: RunId,
    pub query: RefinedQuery,
    pub candidates_found: usize,
    pub transcripts_acquired: usize,
    pub synthesis: PatternSynthesis,
    pub script: GeneratedScript,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_script: Option<GeneratedScript>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// One transcribed video.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptOutcome {
    pub video: VideoMetadata,
    pub transcript: Transcript,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

/// One summarized video.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutcome {
    pub run_id: RunId,
    pub summary: VideoSummary,
    pub transcript_source: TranscriptSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// The assembled pipeline.
pub struct ScriptPipeline {
    config: PipelineConfig,
    index: Arc<dyn VideoIndex>,
    refiner: QueryRefiner,
    finder: CandidateFinder,
    acquirer: TranscriptAcquirer,
    analyzer: ItemAnalyzer,
    synthesizer: PatternSynthesizer,
    script_generator: ScriptGenerator,
    translator: ScriptTranslator,
    summarizer: VideoSummarizer,
}

impl ScriptPipeline {
    pub fn new(config: PipelineConfig, services: PipelineServices) -> Self {
        let parallelism = config.parallelism();
        Self {
            refiner: QueryRefiner::new(services.generator.clone()),
            index: services.index.clone(),
            finder: CandidateFinder::new(services.index, config.quality),
            acquirer: TranscriptAcquirer::new(
                services.audio,
                config.work_dir.clone(),
                parallelism,
                config.item_timeout,
            ),
            analyzer: ItemAnalyzer::new(services.generator.clone())
                .with_timeout(config.analysis_timeout)
                .with_retry(RetryConfig::new("item_analysis").with_max_retries(config.analysis_retries))
                .with_transcript_chars(config.transcript_prompt_chars)
                .with_parallelism(parallelism),
            synthesizer: PatternSynthesizer::new(services.generator.clone()),
            script_generator: ScriptGenerator::new(services.generator.clone()),
            summarizer: VideoSummarizer::new(services.generator.clone()),
            translator: ScriptTranslator::new(services.generator),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn synthesizer(&self) -> &PatternSynthesizer {
        &self.synthesizer
    }

    /// Run the whole pipeline for one idea.
    pub async fn run(&self, request: PipelineRequest) -> WorkerResult<PipelineOutcome> {
        let idea = request.idea.trim().to_string();
        if idea.is_empty() {
            return Err(WorkerError::invalid_input("idea must not be empty"));
        }
        if let Some(t) = request.target_minutes {
            if !(t.is_finite() && t > 0.0) {
                return Err(WorkerError::invalid_input(format!(
                    "target duration must be positive, got {t}"
                )));
            }
        }

        let run_id = request.run_id.clone().unwrap_or_default();
        let logger = RunLogger::new(&run_id, "pipeline");
        let span = logger.create_span();
        let started = Instant::now();

        let result = self
            .run_stages(&idea, &request, &run_id, &logger)
            .instrument(span)
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => metrics::record_run("success", elapsed),
            Err(e) => {
                metrics::record_run("failure", elapsed);
                logger.log_error(&e.to_string());
            }
        }
        result
    }

    /// Look up and transcribe one video. A non-blank `title` replaces the
    /// looked-up one. With persistence on, the transcript is written under
    /// `transcripts/` in the output directory.
    pub async fn transcribe_video(
        &self,
        url: &str,
        title: Option<&str>,
    ) -> WorkerResult<TranscriptOutcome> {
        let (mut video, transcript) = self.fetch_video(url).await?;
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            video.title = title.to_string();
        }
        let output_path = if self.config.persist {
            ArtifactStore::in_dir(&self.config.output_dir)
                .save_transcript(&video.title, &transcript)
                .await
        } else {
            None
        };
        Ok(TranscriptOutcome {
            video,
            transcript,
            output_path,
        })
    }

    /// Transcribe one video and write an executive summary of it.
    pub async fn summarize_video(&self, url: &str) -> WorkerResult<SummaryOutcome> {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "summary");
        let span = logger.create_span();
        let started = Instant::now();

        let result = self
            .summarize_stages(url, &run_id, &logger)
            .instrument(span)
            .await;

        metrics::record_stage_duration("summary", started.elapsed().as_secs_f64());
        if let Err(e) = &result {
            logger.log_error(&e.to_string());
        }
        result
    }

    async fn summarize_stages(
        &self,
        url: &str,
        run_id: &RunId,
        logger: &RunLogger,
    ) -> WorkerResult<SummaryOutcome> {
        logger.log_start(url);
        let (video, transcript) = self.fetch_video(url).await?;
        let summary = self
            .summarizer
            .summarize(&video.url, &video.title, &transcript)
            .await?;

        let output_dir = if self.config.persist {
            let store = ArtifactStore::new(&self.config.output_dir, run_id);
            store.save_transcript(&video.title, &transcript).await;
            store.save_summary(&summary).await;
            Some(store.run_dir().to_path_buf())
        } else {
            None
        };
        logger.log_completion(&format!(
            "{} key points, {} moments",
            summary.key_points.len(),
            summary.timestamps.len()
        ));
        Ok(SummaryOutcome {
            run_id: run_id.clone(),
            summary,
            transcript_source: transcript.source,
            output_dir,
        })
    }

    /// Metadata and transcript for one URL. A failed metadata lookup falls
    /// back to the bare video ID.
    async fn fetch_video(&self, url: &str) -> WorkerResult<(VideoMetadata, Transcript)> {
        let video_id = extract_youtube_id(url)
            .map_err(|e| WorkerError::invalid_input(format!("{url}: {e}")))?;
        let watch_url = canonical_watch_url(&video_id);

        let video = match self.index.lookup(&watch_url).await {
            Ok(video) => video,
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Metadata lookup failed, using the video ID");
                VideoMetadata {
                    id: video_id.clone(),
                    url: watch_url.clone(),
                    title: video_id.clone(),
                    channel: String::new(),
                    view_count: 0,
                    like_count: None,
                    published_at: None,
                    duration_seconds: None,
                }
            }
        };

        let transcript = self.acquirer.transcribe_url(&watch_url, &video_id).await?;
        info!(video_id = %video_id, title = %video.title, words = transcript.word_count(), "Video transcribed");
        Ok((video, transcript))
    }

    async fn run_stages(
        &self,
        idea: &str,
        request: &PipelineRequest,
        run_id: &RunId,
        logger: &RunLogger,
    ) -> WorkerResult<PipelineOutcome> {
        let store = self
            .config
            .persist
            .then(|| ArtifactStore::new(&self.config.output_dir, run_id));
        let max_videos = request.max_videos.unwrap_or(self.config.max_videos).max(1);

        // 1. Query refinement
        let log = logger.stage("refine");
        log.log_start(idea);
        let stage = Instant::now();
        let query = self.refiner.optimize(idea).await;
        if query.is_fallback() {
            log.log_warning("generative service unavailable, using stopword-stripped idea");
        }
        let target_minutes = request
            .target_minutes
            .or(query.estimated_minutes)
            .unwrap_or(self.config.target_minutes);
        metrics::record_stage_duration("refine", stage.elapsed().as_secs_f64());
        log.log_completion(&format!("query={:?} target={}min", query.search_query, target_minutes));

        // 2. Candidate discovery
        let log = logger.stage("discover");
        log.log_start(&query.search_query);
        let stage = Instant::now();
        let candidates = self
            .finder
            .search(
                &query.search_query,
                max_videos,
                self.config.duration_range,
                target_minutes,
            )
            .await?;
        metrics::record_stage_duration("discover", stage.elapsed().as_secs_f64());
        if candidates.is_empty() {
            return Err(WorkerError::NoCandidates(query.search_query.clone()));
        }
        log.log_completion(&format!("{} candidates", candidates.len()));
        let candidates_found = candidates.len();

        // 3. Transcripts
        let log = logger.stage("transcribe");
        log.log_start(&format!("{candidates_found} items"));
        let stage = Instant::now();
        let items = self.acquirer.acquire(candidates).await;
        metrics::record_stage_duration("transcribe", stage.elapsed().as_secs_f64());
        if items.len() < candidates_found {
            log.log_warning(&format!(
                "{} of {} items dropped without transcript",
                candidates_found - items.len(),
                candidates_found
            ));
        }
        log.log_completion(&format!("{} transcripts", items.len()));
        if let Some(store) = &store {
            store.save_transcripts(&items).await;
        }

        // 4. Per-item analysis
        let log = logger.stage("analyze");
        log.log_start(&format!("{} items", items.len()));
        let stage = Instant::now();
        let analyses = self.analyzer.analyze_all(&items).await;
        metrics::record_stage_duration("analyze", stage.elapsed().as_secs_f64());
        if analyses.is_empty() {
            return Err(WorkerError::insufficient_data(Some(max_videos), 0));
        }
        if analyses.len() < items.len() {
            log.log_warning(&format!(
                "{} of {} analyses failed",
                items.len() - analyses.len(),
                items.len()
            ));
        }
        log.log_completion(&format!("{} analyses", analyses.len()));

        // 5. Synthesis
        let log = logger.stage("synthesize");
        log.log_start(&format!("{} analyses", analyses.len()));
        let stage = Instant::now();
        let synthesis = self
            .synthesizer
            .synthesize(&query.search_query, &analyses, target_minutes)
            .await?
            .with_items_requested(max_videos);
        metrics::record_stage_duration("synthesize", stage.elapsed().as_secs_f64());
        if synthesis.is_degraded() {
            log.log_warning("narrative report degraded to template");
        }
        log.log_completion(&format!(
            "{} of {} requested items contributed",
            synthesis.items_analyzed, max_videos
        ));
        if let Some(store) = &store {
            store.save_synthesis(&synthesis).await;
        }

        // 6. Script
        let log = logger.stage("script");
        log.log_start(idea);
        let stage = Instant::now();
        let script = self
            .script_generator
            .generate(idea, &synthesis, target_minutes, request.style.as_deref())
            .await?;
        metrics::record_stage_duration("script", stage.elapsed().as_secs_f64());
        for issue in &script.seo_validation.issues {
            log.log_warning(&format!("SEO: {issue}"));
        }
        log.log_completion(&format!(
            "{} words, quality {}/100",
            script.word_count, script.estimated_quality_score
        ));
        if let Some(store) = &store {
            store.save_script(&script).await;
        }

        // 7. Translation
        let translate = request
            .translate_to_spanish
            .unwrap_or(self.config.translate_to_spanish);
        let translated_script = if translate {
            let log = logger.stage("translate");
            log.log_start("es");
            let stage = Instant::now();
            let translated = self.translator.translate_to_spanish(&script).await;
            metrics::record_stage_duration("translate", stage.elapsed().as_secs_f64());
            log.log_completion("es");
            if let Some(store) = &store {
                store.save_script(&translated).await;
            }
            Some(translated)
        } else {
            None
        };

        logger.log_completion("run finished");
        Ok(PipelineOutcome {
            run_id: run_id.clone(),
            query,
            candidates_found,
            transcripts_acquired: items.len(),
            synthesis,
            script,
            translated_script,
            output_dir: store.map(|s| s.run_dir().to_path_buf()),
        })
    }
}
