//! The generative text service boundary.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LlmResult;
use crate::json::parse_json_response;

/// One completion request.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: Option<String>,
    /// JSON schema the response must satisfy; also switches the service to
    /// JSON output.
    pub response_schema: Option<Value>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn expects_json(&self) -> bool {
        self.response_schema.is_some()
    }
}

/// Opaque text-completion service: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> LlmResult<String>;

    /// Identifier for logs.
    fn name(&self) -> &str;
}

/// JSON schema for `T`, used as the response-schema hint.
pub fn schema_hint<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or(Value::Null)
}

/// Request structured output matching `T` and deserialize it.
pub async fn generate_json<T>(generator: &dyn TextGenerator, request: GenerationRequest) -> LlmResult<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let request = if request.expects_json() {
        request
    } else {
        request.with_schema(schema_hint::<T>())
    };
    let text = generator.generate(request).await?;
    parse_json_response(&text)
}
