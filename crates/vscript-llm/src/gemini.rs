//! Gemini REST client.
//!
//! Calls `models/{model}:generateContent`, walking the configured model
//! chain until one model returns usable text. A client-side rate limiter
//! keeps the process under the configured request budget.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::{GenerationRequest, TextGenerator};
use crate::config::GeminiConfig;
use crate::error::{LlmError, LlmResult};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Gemini API client.
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
    limiter: Option<Arc<DirectRateLimiter>>,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client. Fails when no API key is configured.
    pub fn new(config: GeminiConfig) -> LlmResult<Self> {
        if !config.has_api_key() {
            return Err(LlmError::config("GEMINI_API_KEY not set"));
        }
        if config.models.is_empty() {
            return Err(LlmError::config("no Gemini models configured"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::config(format!("failed to build HTTP client: {}", e)))?;

        let limiter = NonZeroU32::new(config.requests_per_minute)
            .map(|rpm| Arc::new(RateLimiter::direct(Quota::per_minute(rpm))));

        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> LlmResult<Self> {
        Self::new(GeminiConfig::from_env())
    }

    pub fn models(&self) -> &[String] {
        &self.config.models
    }

    fn build_body(&self, request: &GenerationRequest) -> GeminiRequest {
        let mut prompt = request.prompt.clone();
        if let Some(schema) = &request.response_schema {
            prompt.push_str(
                "\n\nRespond with a single JSON object that conforms to this JSON schema. \
                 Omit fields you cannot determine.\n",
            );
            prompt.push_str(&schema.to_string());
        }

        GeminiRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: request.system.as_ref().map(|s| Content {
                role: None,
                parts: vec![Part { text: s.clone() }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: request.expects_json().then_some("application/json"),
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }

    /// Call a single model.
    async fn call_model(&self, model: &str, body: &GeminiRequest) -> LlmResult<String> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout)
                } else {
                    LlmError::network(format!("Gemini API request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS || error_text.contains("RESOURCE_EXHAUSTED")
            {
                return Err(LlmError::quota_exceeded(format!("{}: {}", model, status)));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: truncate(&error_text, 500),
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::malformed(format!("Failed to parse Gemini response: {}", e)))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::malformed(format!("prompt blocked: {}", reason)));
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::empty(model.to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> LlmResult<String> {
        let body = self.build_body(&request);
        let mut last_error = None;

        for model in &self.config.models {
            debug!(model = %model, "Attempting Gemini API");
            match self.call_model(model, &body).await {
                Ok(text) => {
                    info!(model = %model, chars = text.len(), "Gemini returned content");
                    return Ok(text);
                }
                Err(e @ LlmError::Config(_)) => return Err(e),
                Err(e) => {
                    warn!(model = %model, kind = e.kind(), "Gemini model failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::config("no Gemini models configured")))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig::default().with_api_key("test-key")).unwrap()
    }

    #[test]
    fn test_missing_key_is_config_error() {
        assert!(matches!(
            GeminiClient::new(GeminiConfig::default()),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn test_body_for_json_request() {
        let req = GenerationRequest::new("analyze")
            .with_system("be terse")
            .with_schema(json!({"type": "object"}));
        let body = serde_json::to_value(client().build_body(&req)).unwrap();

        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.starts_with("analyze"));
        assert!(prompt.contains("{\"type\":\"object\"}"));
    }

    #[test]
    fn test_body_for_text_request() {
        let body = serde_json::to_value(client().build_body(&GenerationRequest::new("write"))).unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ab", 3), "ab");
    }
}
