//! Offline pattern synthesis over caller-supplied analyses.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vscript_models::{ItemAnalysis, PatternSynthesis};
use vscript_worker::PatternSynthesizer;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_TARGET_MINUTES: f64 = 10.0;
const MAX_ANALYSES: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub topic: String,
    pub analyses: Vec<ItemAnalysis>,
    #[serde(default)]
    pub target_minutes: Option<f64>,
    /// Skip the generative narrative and render the template report
    #[serde(default)]
    pub template_only: bool,
}

/// POST /api/synthesize
pub async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<SynthesizeRequest>,
) -> ApiResult<Json<PatternSynthesis>> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::bad_request("topic must not be empty"));
    }
    if request.analyses.len() > MAX_ANALYSES {
        return Err(ApiError::bad_request(format!(
            "at most {MAX_ANALYSES} analyses per request"
        )));
    }
    let target_minutes = request.target_minutes.unwrap_or(DEFAULT_TARGET_MINUTES);
    if !(target_minutes.is_finite() && target_minutes > 0.0) {
        return Err(ApiError::bad_request("target_minutes must be positive"));
    }

    info!(
        topic = %topic,
        analyses = request.analyses.len(),
        template_only = request.template_only,
        "Synthesis requested"
    );

    let synthesis = if request.template_only {
        PatternSynthesizer::template_only()
            .synthesize(topic, &request.analyses, target_minutes)
            .await?
    } else {
        state
            .synthesizer
            .synthesize(topic, &request.analyses, target_minutes)
            .await?
    };

    Ok(Json(synthesis))
}
