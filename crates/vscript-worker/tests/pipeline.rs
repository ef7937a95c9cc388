//! End-to-end pipeline runs against in-memory collaborators.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;

use vscript_llm::{CannedGenerator, CannedReply};
use vscript_media::{AudioPipeline, MediaError, MediaResult, SearchRequest, VideoIndex};
use vscript_models::{RefinementSource, RunId, Transcript, TranscriptSource, VideoMetadata};
use vscript_worker::{PipelineConfig, PipelineRequest, PipelineServices, ScriptPipeline, WorkerError};

struct FixedIndex(Vec<VideoMetadata>);

#[async_trait]
impl VideoIndex for FixedIndex {
    async fn search(&self, _request: &SearchRequest) -> MediaResult<Vec<VideoMetadata>> {
        Ok(self.0.clone())
    }
}

/// Transcribes everything except URLs containing "private".
struct FakeAudio;

#[async_trait]
impl AudioPipeline for FakeAudio {
    async fn transcribe(&self, url: &str, _workdir: &Path) -> MediaResult<Transcript> {
        if url.contains("private") {
            return Err(MediaError::Unavailable(url.to_string()));
        }
        Ok(Transcript::from_text(
            "What if I told you n8n runs on your laptop? Subscribe for more!",
            TranscriptSource::Provided,
        ))
    }
}

fn video(id: &str, title: &str, views: u64) -> VideoMetadata {
    VideoMetadata {
        id: id.to_string(),
        url: format!("https://www.youtube.com/watch?v={id}"),
        title: title.to_string(),
        channel: "chan".to_string(),
        view_count: views,
        like_count: Some(views / 25),
        published_at: NaiveDate::from_ymd_opt(2024, 2, 1),
        duration_seconds: Some(600),
    }
}

fn cohort() -> Vec<VideoMetadata> {
    vec![
        video("aaa", "Install n8n locally", 120_000),
        video("bbb", "n8n in 10 minutes", 60_000),
        video("ccc", "Broken video", 40_000),
        video("private1", "Members only", 90_000),
    ]
}

fn generator() -> CannedGenerator {
    let query = json!({
        "search_query": "n8n local install",
        "audience": "beginners",
        "content_type": "tutorial",
        "keywords": ["n8n", "install"],
        "estimated_minutes": 8
    });
    let analysis = json!({
        "hook": {"start": 0, "end": 9, "text": "What if I told you n8n runs on your laptop?",
                 "type": "question", "effectiveness": "high"},
        "structure": {"sections": [{"label": "Intro", "start": 0, "end": 60},
                                   {"label": "Install", "start": 60, "end": 400}],
                      "intro_end": 60},
        "ctas": [{"text": "Subscribe for more!", "position_percent": 95, "type": "subscribe"}],
        "technical_terms": ["n8n", "Docker"],
        "title_keywords": ["n8n", "install"],
        "estimated_tags": ["n8n tutorial"]
    });
    let script = json!({
        "script_markdown": "# Install n8n\n[00:00] What if your automations ran for free?\n[00:30] Let's install n8n.",
        "title": "Install n8n Locally",
        "description": "Run n8n on your own machine.",
        "tags": ["#n8n", "automation", "N8N"]
    });

    CannedGenerator::unavailable()
        .when("Turn the video idea below", CannedReply::text(query.to_string()))
        .when("VIDEO: \"Broken video\"", CannedReply::text("not json at all"))
        .when("VIDEO: \"", CannedReply::text(analysis.to_string()))
        .when("Write an original YouTube script", CannedReply::text(script.to_string()))
        .when("SCRIPT TO TRANSLATE", CannedReply::text("# Instala n8n\n[00:00] ¿Y si tus automatizaciones fueran gratis?"))
        .when("ORIGINAL TITLE", CannedReply::text("Instala n8n en local"))
        .when("ORIGINAL DESCRIPTION", CannedReply::text("Ejecuta n8n en tu propia máquina."))
}

fn config(tmp: &TempDir) -> PipelineConfig {
    PipelineConfig {
        max_videos: 4,
        work_dir: tmp.path().join("work"),
        output_dir: tmp.path().join("output"),
        ..PipelineConfig::default()
    }
}

fn pipeline(config: PipelineConfig, generator: CannedGenerator, videos: Vec<VideoMetadata>) -> ScriptPipeline {
    ScriptPipeline::new(
        config,
        PipelineServices {
            generator: Arc::new(generator),
            index: Arc::new(FixedIndex(videos)),
            audio: Arc::new(FakeAudio),
        },
    )
}

#[tokio::test]
async fn test_full_run_shrinks_cohort_and_persists() {
    let tmp = TempDir::new().unwrap();
    let pipeline = pipeline(config(&tmp), generator(), cohort());

    let request = PipelineRequest {
        translate_to_spanish: Some(true),
        run_id: Some(RunId::from_string("run-1")),
        ..PipelineRequest::new("Quiero un tutorial de n8n de 8 minutos")
    };
    let outcome = pipeline.run(request).await.unwrap();

    assert_eq!(outcome.query.source, RefinementSource::Generated);
    assert_eq!(outcome.query.search_query, "n8n local install");
    assert_eq!(outcome.candidates_found, 4);
    assert_eq!(outcome.transcripts_acquired, 3);

    // "Broken video" fails analysis and is dropped, honestly reported
    let synthesis = &outcome.synthesis;
    assert_eq!(synthesis.items_analyzed, 2);
    assert_eq!(synthesis.items_requested, Some(4));
    assert!(synthesis.is_degraded());
    assert_eq!(synthesis.patterns.top_hooks[0].frequency, 2);
    assert_eq!(synthesis.patterns.effective_ctas[0].frequency, 2);
    assert_eq!(synthesis.patterns.optimal_structure.total_target_seconds, 480);

    let script = &outcome.script;
    assert_eq!(script.language, "en");
    assert_eq!(script.target_duration_minutes, 8.0);
    assert_eq!(script.reference_count, 2);
    assert_eq!(script.seo.tags, vec!["n8n", "automation"]);
    assert!(!script.seo_validation.is_valid());

    let translated = outcome.translated_script.as_ref().unwrap();
    assert_eq!(translated.language, "es");
    assert_eq!(translated.seo.title, "Instala n8n en local");

    let run_dir = tmp.path().join("output").join("run-1");
    assert_eq!(outcome.output_dir.as_deref(), Some(run_dir.as_path()));
    for name in [
        "synthesis.json",
        "synthesis_report.md",
        "script.md",
        "script.json",
        "script_es.md",
        "script_es.json",
    ] {
        assert!(run_dir.join(name).exists(), "missing {name}");
    }
    let transcripts = std::fs::read_dir(run_dir.join("transcripts")).unwrap().count();
    assert_eq!(transcripts, 3);
}

#[tokio::test]
async fn test_discovery_shortfall_reported_against_request() {
    let tmp = TempDir::new().unwrap();
    let config = PipelineConfig {
        persist: false,
        ..config(&tmp)
    };
    let pipeline = pipeline(config, generator(), cohort());

    let request = PipelineRequest {
        max_videos: Some(10),
        ..PipelineRequest::new("n8n tutorial")
    };
    let outcome = pipeline.run(request).await.unwrap();

    assert_eq!(outcome.candidates_found, 4);
    assert_eq!(outcome.synthesis.items_analyzed, 2);
    assert_eq!(outcome.synthesis.items_requested, Some(10));
}

#[tokio::test]
async fn test_no_search_results() {
    let tmp = TempDir::new().unwrap();
    let pipeline = pipeline(config(&tmp), generator(), Vec::new());

    let err = pipeline.run(PipelineRequest::new("n8n tutorial")).await.unwrap_err();
    assert!(matches!(err, WorkerError::NoCandidates(ref q) if q == "n8n local install"));
}

#[tokio::test]
async fn test_all_analyses_failing_is_insufficient_data() {
    let tmp = TempDir::new().unwrap();
    let generator = CannedGenerator::with_fallback(CannedReply::QuotaExceeded);
    let config = PipelineConfig {
        persist: false,
        ..config(&tmp)
    };
    let pipeline = pipeline(config, generator, cohort());

    let err = pipeline.run(PipelineRequest::new("n8n tutorial")).await.unwrap_err();
    assert!(matches!(
        err,
        WorkerError::InsufficientData {
            requested: Some(4),
            analyzed: 0
        }
    ));
    assert!(!tmp.path().join("output").exists());
}

#[tokio::test]
async fn test_rejects_bad_input() {
    let tmp = TempDir::new().unwrap();
    let pipeline = pipeline(config(&tmp), generator(), cohort());

    let err = pipeline.run(PipelineRequest::new("   ")).await.unwrap_err();
    assert!(err.is_client_error());

    let request = PipelineRequest {
        target_minutes: Some(-3.0),
        ..PipelineRequest::new("n8n")
    };
    assert!(pipeline.run(request).await.unwrap_err().is_client_error());
}
