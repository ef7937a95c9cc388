//! Deterministic generator for tests and offline runs.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{GenerationRequest, TextGenerator};
use crate::error::{LlmError, LlmResult};

/// What the canned generator answers with.
#[derive(Debug, Clone)]
pub enum CannedReply {
    Text(String),
    QuotaExceeded,
    Timeout,
    Network,
}

impl CannedReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    fn resolve(&self) -> LlmResult<String> {
        match self {
            CannedReply::Text(t) => Ok(t.clone()),
            CannedReply::QuotaExceeded => Err(LlmError::quota_exceeded("canned quota")),
            CannedReply::Timeout => Err(LlmError::Timeout(Duration::from_secs(1))),
            CannedReply::Network => Err(LlmError::network("canned network failure")),
        }
    }
}

/// Answers by matching prompt substrings against registered rules, in
/// registration order, and records every request it receives.
pub struct CannedGenerator {
    rules: Vec<(String, CannedReply)>,
    fallback: CannedReply,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl CannedGenerator {
    /// Answer every unmatched prompt with `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_fallback(CannedReply::Text(text.into()))
    }

    /// A generator whose every call fails with a network error.
    pub fn unavailable() -> Self {
        Self::with_fallback(CannedReply::Network)
    }

    pub fn with_fallback(fallback: CannedReply) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `reply` whenever the prompt contains `needle`.
    pub fn when(mut self, needle: impl Into<String>, reply: CannedReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.iter().map(|r| r.prompt.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, request: GenerationRequest) -> LlmResult<String> {
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback)
            .resolve();

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
        reply
    }

    fn name(&self) -> &str {
        "canned"
    }
}
