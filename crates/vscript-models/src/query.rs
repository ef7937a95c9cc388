//! Refined search queries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a query was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RefinementSource {
    /// Rewritten by the generative service
    Generated,
    /// Stopword-stripped original idea (service unavailable or unusable)
    Fallback,
}

/// A free-text idea turned into a focused search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RefinedQuery {
    pub search_query: String,
    pub audience: String,
    pub content_type: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Duration preference stated in the idea, in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<f64>,
    pub source: RefinementSource,
}

impl RefinedQuery {
    pub fn is_fallback(&self) -> bool {
        self.source == RefinementSource::Fallback
    }
}
