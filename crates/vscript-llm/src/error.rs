//! Generative service error types.

use std::time::Duration;

use thiserror::Error;

pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    pub fn quota_exceeded(msg: impl Into<String>) -> Self {
        Self::QuotaExceeded(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn empty(source: impl Into<String>) -> Self {
        Self::EmptyResponse(source.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Timeouts, network failures and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Timeout(_) | LlmError::Network(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, LlmError::QuotaExceeded(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::QuotaExceeded(_) => "quota_exceeded",
            LlmError::MalformedResponse(_) => "malformed_response",
            LlmError::EmptyResponse(_) => "empty_response",
            LlmError::Timeout(_) => "timeout",
            LlmError::Network(_) => "network",
            LlmError::Api { .. } => "api",
            LlmError::Config(_) => "config",
        }
    }
}
