//! Full pipeline runs.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vscript_worker::{PipelineOutcome, PipelineRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_IDEA_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ScriptRequest {
    pub idea: String,
    #[serde(default)]
    pub target_minutes: Option<f64>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub max_videos: Option<usize>,
    #[serde(default)]
    pub translate_to_spanish: Option<bool>,
}

/// POST /api/scripts
///
/// Runs the whole pipeline in the request. Slow by nature: minutes, not
/// seconds, with real media tooling.
pub async fn create_script(
    State(state): State<AppState>,
    Json(request): Json<ScriptRequest>,
) -> ApiResult<Json<PipelineOutcome>> {
    if request.idea.chars().count() > MAX_IDEA_CHARS {
        return Err(ApiError::bad_request(format!(
            "idea must be at most {MAX_IDEA_CHARS} characters"
        )));
    }
    if let Some(max_videos) = request.max_videos {
        let limit = state.config.max_videos_limit;
        if max_videos == 0 || max_videos > limit {
            return Err(ApiError::bad_request(format!(
                "max_videos must be between 1 and {limit}"
            )));
        }
    }

    info!(idea = %request.idea, "Script requested");
    let outcome = state
        .pipeline
        .run(PipelineRequest {
            idea: request.idea,
            target_minutes: request.target_minutes,
            style: request.style,
            max_videos: request.max_videos,
            translate_to_spanish: request.translate_to_spanish,
            run_id: None,
        })
        .await?;

    Ok(Json(outcome))
}
