//! Pipeline error types.

use std::time::Duration;

use thiserror::Error;
use vscript_llm::LlmError;
use vscript_media::MediaError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// No usable analyses reached the synthesizer. Fatal for the run and
    /// never retried in place.
    #[error("Insufficient data: {analyzed} usable analyses (requested {})", display_requested(.requested))]
    InsufficientData {
        requested: Option<usize>,
        analyzed: usize,
    },

    #[error("No candidate videos found for query: {0}")]
    NoCandidates(String),

    #[error("Script generation failed: {0}")]
    ScriptFailed(String),

    #[error("Summary generation failed: {0}")]
    SummaryFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Generative service error: {0}")]
    Llm(#[from] LlmError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn insufficient_data(requested: Option<usize>, analyzed: usize) -> Self {
        Self::InsufficientData {
            requested,
            analyzed,
        }
    }

    pub fn script_failed(msg: impl Into<String>) -> Self {
        Self::ScriptFailed(msg.into())
    }

    pub fn summary_failed(msg: impl Into<String>) -> Self {
        Self::SummaryFailed(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, WorkerError::InsufficientData { .. })
    }

    /// Whether the caller supplied bad input (as opposed to a failed run).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WorkerError::InsufficientData { .. } | WorkerError::InvalidInput(_)
        )
    }
}

fn display_requested(requested: &Option<usize>) -> String {
    requested.map_or_else(|| "unknown".to_string(), |r| r.to_string())
}

/// Per-item analysis failure. Recovered locally by dropping the item.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("item {0} has no transcript")]
    MissingTranscript(String),

    #[error("analysis for {item_id} was empty")]
    Empty { item_id: String },

    #[error("analysis for {item_id} was malformed: {message}")]
    Malformed { item_id: String, message: String },

    #[error("analysis for {item_id} timed out after {timeout:?}")]
    Timeout { item_id: String, timeout: Duration },

    #[error("generative service failed for {item_id}: {source}")]
    Service {
        item_id: String,
        #[source]
        source: LlmError,
    },
}

impl AnalysisError {
    /// Map a generative-service failure for `item_id`.
    pub fn from_llm(item_id: &str, err: LlmError) -> Self {
        match err {
            LlmError::MalformedResponse(message) => AnalysisError::Malformed {
                item_id: item_id.to_string(),
                message,
            },
            LlmError::EmptyResponse(_) => AnalysisError::Empty {
                item_id: item_id.to_string(),
            },
            other => AnalysisError::Service {
                item_id: item_id.to_string(),
                source: other,
            },
        }
    }

    /// Label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::MissingTranscript(_) => "missing_transcript",
            AnalysisError::Empty { .. } => "empty",
            AnalysisError::Malformed { .. } => "malformed",
            AnalysisError::Timeout { .. } => "timeout",
            AnalysisError::Service { .. } => "service",
        }
    }
}
