//! Single-video transcription and summaries against in-memory collaborators.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use vscript_llm::{CannedGenerator, CannedReply};
use vscript_media::{AudioPipeline, MediaError, MediaResult, SearchRequest, VideoIndex};
use vscript_models::{Transcript, TranscriptSource, VideoMetadata};
use vscript_worker::{PipelineConfig, PipelineServices, ScriptPipeline, WorkerError};

const VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Index that knows a single video by ID.
struct OneVideoIndex;

#[async_trait]
impl VideoIndex for OneVideoIndex {
    async fn search(&self, _request: &SearchRequest) -> MediaResult<Vec<VideoMetadata>> {
        Ok(Vec::new())
    }

    async fn lookup(&self, url: &str) -> MediaResult<VideoMetadata> {
        if !url.contains(VIDEO_ID) {
            return Err(MediaError::Unavailable(url.to_string()));
        }
        Ok(VideoMetadata {
            id: VIDEO_ID.to_string(),
            url: url.to_string(),
            title: "Self-host n8n with Docker".to_string(),
            channel: "chan".to_string(),
            view_count: 50_000,
            like_count: None,
            published_at: None,
            duration_seconds: Some(480),
        })
    }
}

/// Index without metadata lookups.
struct SearchOnlyIndex;

#[async_trait]
impl VideoIndex for SearchOnlyIndex {
    async fn search(&self, _request: &SearchRequest) -> MediaResult<Vec<VideoMetadata>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct CountingAudio {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl AudioPipeline for CountingAudio {
    async fn transcribe(&self, url: &str, _workdir: &Path) -> MediaResult<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MediaError::Unavailable(url.to_string()));
        }
        Ok(Transcript::from_text(
            "Ever wondered how to self-host n8n? In this video we install it with Docker \
             and build the first workflow. Subscribe for more!",
            TranscriptSource::Provided,
        ))
    }
}

const SUMMARY: &str = "# 📹 Summary: Self-host n8n

## 🎯 Executive Summary
A walkthrough of installing n8n with Docker.

## 🔑 Key Points
1. **Docker**: one container is enough
2. **Workflows**: build the first one in minutes

## ⏱️ Important Moments
- **00:00** - Hook
- **02:10** - Docker install

## 💡 Conclusion
Self-hosting n8n is quick.

## ✅ Action Items
1. Install Docker
2. Run the n8n container
";

fn config(tmp: &TempDir) -> PipelineConfig {
    PipelineConfig {
        work_dir: tmp.path().join("work"),
        output_dir: tmp.path().join("output"),
        ..PipelineConfig::default()
    }
}

fn pipeline(
    config: PipelineConfig,
    generator: CannedGenerator,
    index: Arc<dyn VideoIndex>,
    audio: Arc<CountingAudio>,
) -> ScriptPipeline {
    ScriptPipeline::new(
        config,
        PipelineServices {
            generator: Arc::new(generator),
            index,
            audio,
        },
    )
}

fn summary_generator() -> CannedGenerator {
    CannedGenerator::unavailable().when("Generate a structured summary", CannedReply::text(SUMMARY))
}

#[tokio::test]
async fn test_summarize_video_persists_summary_and_transcript() {
    let tmp = TempDir::new().unwrap();
    let pipeline = pipeline(
        config(&tmp),
        summary_generator(),
        Arc::new(OneVideoIndex),
        Arc::new(CountingAudio::default()),
    );

    let outcome = pipeline
        .summarize_video(&format!("https://youtu.be/{VIDEO_ID}?t=42"))
        .await
        .unwrap();

    let summary = &outcome.summary;
    assert_eq!(summary.video_title, "Self-host n8n with Docker");
    assert_eq!(summary.video_id.as_deref(), Some(VIDEO_ID));
    assert_eq!(summary.language, "en");
    assert_eq!(summary.key_points.len(), 2);
    assert_eq!(summary.timestamps[1].timestamp, "02:10");
    assert_eq!(summary.action_items, vec!["Install Docker", "Run the n8n container"]);
    assert_eq!(outcome.transcript_source, TranscriptSource::Provided);

    let run_dir = tmp.path().join("output").join(outcome.run_id.as_str());
    assert_eq!(outcome.output_dir.as_deref(), Some(run_dir.as_path()));
    let md = std::fs::read_to_string(run_dir.join("summary.md")).unwrap();
    assert!(md.contains("Self-host n8n with Docker"));
    assert!(run_dir.join("summary.json").exists());
    assert_eq!(std::fs::read_dir(run_dir.join("transcripts")).unwrap().count(), 1);
}

#[tokio::test]
async fn test_transcribe_video_falls_back_to_video_id() {
    let tmp = TempDir::new().unwrap();
    let audio = Arc::new(CountingAudio::default());
    let pipeline = pipeline(
        config(&tmp),
        CannedGenerator::unavailable(),
        Arc::new(SearchOnlyIndex),
        audio.clone(),
    );

    let outcome = pipeline
        .transcribe_video(&format!("https://www.youtube.com/watch?v={VIDEO_ID}&list=abc"), None)
        .await
        .unwrap();

    assert_eq!(outcome.video.id, VIDEO_ID);
    assert_eq!(outcome.video.title, VIDEO_ID);
    assert_eq!(outcome.video.url, format!("https://www.youtube.com/watch?v={VIDEO_ID}"));
    assert!(outcome.transcript.text.starts_with("Ever wondered"));
    assert_eq!(audio.calls.load(Ordering::SeqCst), 1);

    let path = outcome.output_path.unwrap();
    assert!(path.starts_with(tmp.path().join("output").join("transcripts")));
    assert!(path.exists());

    let outcome = pipeline
        .transcribe_video(&format!("https://youtu.be/{VIDEO_ID}"), Some("  My n8n notes "))
        .await
        .unwrap();
    assert_eq!(outcome.video.title, "My n8n notes");
}

#[tokio::test]
async fn test_invalid_url_rejected_before_download() {
    let tmp = TempDir::new().unwrap();
    let audio = Arc::new(CountingAudio::default());
    let pipeline = pipeline(
        config(&tmp),
        summary_generator(),
        Arc::new(OneVideoIndex),
        audio.clone(),
    );

    let err = pipeline.summarize_video("https://vimeo.com/12345").await.unwrap_err();
    assert!(err.is_client_error());
    let err = pipeline.transcribe_video("not a url", Some("Title")).await.unwrap_err();
    assert!(matches!(err, WorkerError::InvalidInput(_)));
    assert_eq!(audio.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_single_video_failures() {
    let tmp = TempDir::new().unwrap();
    let failing_audio = Arc::new(CountingAudio {
        fail: true,
        ..CountingAudio::default()
    });
    let pipeline_a = pipeline(
        config(&tmp),
        summary_generator(),
        Arc::new(OneVideoIndex),
        failing_audio,
    );
    let url = format!("https://www.youtube.com/watch?v={VIDEO_ID}");
    let err = pipeline_a.summarize_video(&url).await.unwrap_err();
    assert!(matches!(err, WorkerError::Media(_)));

    let unparseable = CannedGenerator::unavailable()
        .when("Generate a structured summary", CannedReply::text("I cannot summarize this."));
    let config = PipelineConfig {
        persist: false,
        ..config(&tmp)
    };
    let pipeline_b = pipeline(
        config,
        unparseable,
        Arc::new(OneVideoIndex),
        Arc::new(CountingAudio::default()),
    );
    let err = pipeline_b.summarize_video(&url).await.unwrap_err();
    assert!(matches!(err, WorkerError::SummaryFailed(_)));
    assert!(!tmp.path().join("output").exists());
}
