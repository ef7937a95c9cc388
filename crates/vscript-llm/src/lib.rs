//! Generative text service boundary.
//!
//! Components depend on the [`TextGenerator`] trait and receive a concrete
//! implementation at construction time: [`GeminiClient`] in production,
//! [`CannedGenerator`] in tests and offline runs.

pub mod client;
pub mod config;
pub mod error;
pub mod gemini;
pub mod json;
pub mod stub;

pub use client::{generate_json, schema_hint, GenerationRequest, TextGenerator};
pub use config::GeminiConfig;
pub use error::{LlmError, LlmResult};
pub use gemini::GeminiClient;
pub use json::{parse_json_response, strip_code_fences};
pub use stub::{CannedGenerator, CannedReply};
