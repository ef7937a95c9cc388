//! Router-level tests with in-memory collaborators.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use vscript_api::{create_router, ApiConfig, AppState};
use vscript_llm::{CannedGenerator, CannedReply};
use vscript_media::{AudioPipeline, MediaResult, SearchRequest, VideoIndex};
use vscript_models::{
    CallToAction, CtaType, EffectivenessTag, HookType, ItemAnalysis, OpeningHook, Transcript,
    TranscriptSource, VideoMetadata,
};
use vscript_worker::{PipelineConfig, PipelineServices};

struct FixedIndex;

#[async_trait]
impl VideoIndex for FixedIndex {
    async fn search(&self, _request: &SearchRequest) -> MediaResult<Vec<VideoMetadata>> {
        Ok(["v1", "v2"]
            .iter()
            .map(|id| VideoMetadata {
                id: id.to_string(),
                url: format!("https://www.youtube.com/watch?v={id}"),
                title: format!("n8n tutorial {id}"),
                channel: "chan".to_string(),
                view_count: 50_000,
                like_count: Some(2_000),
                published_at: NaiveDate::from_ymd_opt(2024, 4, 1),
                duration_seconds: Some(540),
            })
            .collect())
    }
}

struct FakeAudio;

#[async_trait]
impl AudioPipeline for FakeAudio {
    async fn transcribe(&self, _url: &str, _workdir: &Path) -> MediaResult<Transcript> {
        Ok(Transcript::from_text(
            "Ever wondered how to self-host n8n? Subscribe!",
            TranscriptSource::Provided,
        ))
    }
}

fn generator() -> CannedGenerator {
    let analysis = json!({
        "hook": {"start": 0, "end": 6, "text": "Ever wondered how to self-host n8n?",
                 "type": "question", "effectiveness": "high"},
        "ctas": [{"text": "Subscribe!", "position_percent": 90, "type": "subscribe"}],
        "technical_terms": ["n8n"]
    });
    let script = json!({
        "script_markdown": "# n8n\n[00:00] Ever wanted your own automation server?",
        "title": "Self-host n8n",
        "description": "A short guide.",
        "tags": ["n8n"]
    });
    let summary = "## Executive Summary\nHow to self-host n8n.\n\n\
                   ## Key Points\n1. Install\n2. Subscribe\n\n\
                   ## Important Moments\n- **00:00** - Hook\n\n\
                   ## Conclusion\nEasy.\n";
    CannedGenerator::unavailable()
        .when("VIDEO: \"", CannedReply::text(analysis.to_string()))
        .when("Write an original YouTube script", CannedReply::text(script.to_string()))
        .when("Generate a structured summary", CannedReply::text(summary))
}

fn app_with(config: ApiConfig) -> Router {
    let tmp = std::env::temp_dir().join("vscript-api-tests");
    let pipeline_config = PipelineConfig {
        persist: false,
        work_dir: tmp,
        ..PipelineConfig::default()
    };
    let services = PipelineServices {
        generator: Arc::new(generator()),
        index: Arc::new(FixedIndex),
        audio: Arc::new(FakeAudio),
    };
    create_router(AppState::new(config, pipeline_config, services), None)
}

fn app() -> Router {
    app_with(ApiConfig::default())
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn analysis(id: &str, score: f64, hook: &str, hook_type: HookType, cta: Option<f64>) -> ItemAnalysis {
    ItemAnalysis {
        effectiveness_score: Some(score),
        hook: Some(OpeningHook {
            start_seconds: Some(0.0),
            end_seconds: Some(8.0),
            text: hook.to_string(),
            hook_type,
            effectiveness: EffectivenessTag::Medium,
        }),
        ctas: cta.map(|position| {
            vec![CallToAction {
                text: "Subscribe for more".to_string(),
                offset_seconds: None,
                position_percent: Some(position),
                cta_type: CtaType::Subscribe,
            }]
        }),
        ..ItemAnalysis::new(id)
    }
}

fn abc_analyses() -> Value {
    serde_json::to_value(vec![
        analysis("a", 5.0, "What if I told you...", HookType::Question, Some(10.0)),
        analysis("b", 3.0, "Here's the secret", HookType::Promise, None),
        analysis("c", 4.0, "What if I told you...", HookType::Question, Some(12.0)),
    ])
    .unwrap()
}

#[tokio::test]
async fn test_health_and_ready() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app()
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["generator"]["detail"], "canned");
    assert_eq!(body["checks"]["ytdlp"]["status"], "skipped");
}

#[tokio::test]
async fn test_synthesize_template() {
    let request = post_json(
        "/api/synthesize",
        &json!({"topic": "n8n", "analyses": abc_analyses(), "template_only": true}),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["items_analyzed"], 3);
    assert_eq!(body["top_hooks"][0]["hook_type"], "question");
    assert_eq!(body["top_hooks"][0]["frequency"], 2);
    assert_eq!(body["effective_ctas"][0]["frequency"], 2);
    assert_eq!(body["effective_ctas"][0]["position_percent"], 10.9);
    assert_eq!(body["report"]["quality"], "template");
}

#[tokio::test]
async fn test_synthesize_degrades_when_service_unavailable() {
    let request = post_json(
        "/api/synthesize",
        &json!({"topic": "n8n", "analyses": abc_analyses(), "target_minutes": 8}),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["report"]["quality"], "template");
    assert_eq!(body["optimal_structure"]["total_target_seconds"], 480);
}

#[tokio::test]
async fn test_synthesize_empty_cohort() {
    let request = post_json("/api/synthesize", &json!({"topic": "n8n", "analyses": []}));
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "insufficient_data");
}

#[tokio::test]
async fn test_synthesize_rejects_blank_topic() {
    let request = post_json("/api/synthesize", &json!({"topic": "  ", "analyses": []}));
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_script() {
    let request = post_json(
        "/api/scripts",
        &json!({"idea": "self-host n8n", "target_minutes": 9, "max_videos": 2}),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["candidates_found"], 2);
    assert_eq!(body["synthesis"]["items_analyzed"], 2);
    assert_eq!(body["query"]["source"], "fallback");
    assert_eq!(body["script"]["language"], "en");
    assert_eq!(body["script"]["reference_count"], 2);
    assert!(body.get("translated_script").is_none());
    assert!(body.get("output_dir").is_none());
}

#[tokio::test]
async fn test_create_script_validates_input() {
    let request = post_json("/api/scripts", &json!({"idea": "n8n", "max_videos": 0}));
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = post_json("/api/scripts", &json!({"idea": ""}));
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["detail"]
        .as_str()
        .unwrap()
        .contains("idea"));
}

#[tokio::test]
async fn test_transcribe_video() {
    let request = post_json(
        "/api/transcribe",
        &json!({"youtube_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ", "title": "n8n notes"}),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["video"]["id"], "dQw4w9WgXcQ");
    assert_eq!(body["video"]["title"], "n8n notes");
    assert_eq!(body["source"], "provided");
    assert_eq!(body["word_count"], 7);
    assert_eq!(body["transcription_length"], 46);
    assert_eq!(body["transcript_preview"], body["text"]);
    assert!(body.get("filename").is_none());
}

#[tokio::test]
async fn test_create_summary() {
    let request = post_json(
        "/api/summaries",
        &json!({"youtube_url": "https://youtu.be/dQw4w9WgXcQ"}),
    );
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["summary"]["video_id"], "dQw4w9WgXcQ");
    assert_eq!(body["summary"]["language"], "en");
    assert_eq!(body["summary"]["executive_summary"], "How to self-host n8n.");
    assert_eq!(body["summary"]["key_points"].as_array().unwrap().len(), 2);
    assert_eq!(body["summary"]["timestamps"][0]["timestamp"], "00:00");
    assert!(body["markdown"].as_str().unwrap().contains("## Key Points"));
    assert!(body.get("output_dir").is_none());
}

#[tokio::test]
async fn test_single_video_rejects_bad_urls() {
    for (uri, url) in [
        ("/api/transcribe", "youtu.be/dQw4w9WgXcQ"),
        ("/api/transcribe", "https://vimeo.com/12345"),
        ("/api/summaries", "https://www.youtube.com/watch?v=short"),
    ] {
        let response = app()
            .oneshot(post_json(uri, &json!({"youtube_url": url})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri} {url}");
    }
}

#[tokio::test]
async fn test_unknown_route() {
    let response = app()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let app = app_with(ApiConfig {
        rate_limit_rps: 1,
        ..ApiConfig::default()
    });
    let request = || {
        let mut request = post_json(
            "/api/synthesize",
            &json!({"topic": "n8n", "analyses": abc_analyses(), "template_only": true}),
        );
        request
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        request
    };

    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = app.oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));
}
