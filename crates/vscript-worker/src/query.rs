//! Query refiner: free-text idea in, focused search query out.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use vscript_llm::{generate_json, GenerationRequest, TextGenerator};
use vscript_models::{RefinedQuery, RefinementSource};

const DEFAULT_AUDIENCE: &str = "general";
const DEFAULT_CONTENT_TYPE: &str = "tutorial";
const MAX_KEYWORDS: usize = 10;

/// "10 minutes", "8-min", "15 minutos".
static DURATION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:[.,]\d+)?)\s*-?\s*(?:min|mins|minute|minutes|minuto|minutos)\b")
        .ok()
});

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // English
        "a", "an", "the", "and", "or", "but", "of", "to", "in", "on", "for", "with", "about",
        "at", "by", "from", "into", "is", "are", "be", "it", "its", "this", "that", "these",
        "those", "i", "me", "my", "we", "our", "you", "your", "want", "wanna", "would", "like",
        "make", "create", "video", "videos", "youtube", "some", "how", "do", "does", "can",
        "should", "please",
        // Spanish
        "un", "una", "unos", "unas", "el", "la", "los", "las", "y", "o", "de", "del", "al", "a",
        "en", "con", "sobre", "para", "por", "que", "es", "son", "mi", "mis", "tu", "tus", "su",
        "sus", "quiero", "hacer", "crear", "como", "cómo", "lo", "le", "se",
    ]
    .into_iter()
    .collect()
});

/// Structured reply requested from the generative service.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
struct QueryPayload {
    /// Short YouTube search query in the idea's language
    search_query: String,
    /// Intended audience, e.g. "beginners"
    audience: String,
    /// Content format, e.g. "tutorial", "review"
    content_type: String,
    /// SEO keywords, most important first
    keywords: Vec<String>,
    /// Video length the idea asks for, in minutes
    estimated_minutes: Option<f64>,
}

/// Turns a user's idea into a search query.
pub struct QueryRefiner {
    generator: Arc<dyn TextGenerator>,
}

impl QueryRefiner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Refine `idea`. Never fails: any service problem yields the
    /// stopword-stripped idea.
    pub async fn optimize(&self, idea: &str) -> RefinedQuery {
        let idea = idea.trim();
        let request = GenerationRequest::new(build_prompt(idea)).with_temperature(0.2);

        match generate_json::<QueryPayload>(self.generator.as_ref(), request).await {
            Ok(payload) if !payload.search_query.trim().is_empty() => {
                let refined = from_payload(idea, payload);
                info!(query = %refined.search_query, "Refined search query");
                refined
            }
            Ok(_) => {
                warn!("Query refinement returned no query, using fallback");
                fallback_query(idea)
            }
            Err(e) => {
                warn!(error = %e, "Query refinement failed, using fallback");
                fallback_query(idea)
            }
        }
    }
}

fn build_prompt(idea: &str) -> String {
    format!(
        r#"You are a YouTube SEO assistant. Turn the video idea below into a focused YouTube search query.

VIDEO IDEA:
{idea}

Return JSON with:
- search_query: 3-8 words, same language as the idea, no filler words
- audience: who the video is for
- content_type: the format (tutorial, review, explainer, ...)
- keywords: up to {MAX_KEYWORDS} SEO keywords
- estimated_minutes: the video length the idea asks for, or null"#
    )
}

fn from_payload(idea: &str, payload: QueryPayload) -> RefinedQuery {
    let mut keywords = clean_keywords(payload.keywords);
    if keywords.is_empty() {
        keywords = strip_stopwords(idea);
    }
    keywords.truncate(MAX_KEYWORDS);

    RefinedQuery {
        search_query: collapse_whitespace(&payload.search_query),
        audience: non_blank_or(&payload.audience, DEFAULT_AUDIENCE),
        content_type: non_blank_or(&payload.content_type, DEFAULT_CONTENT_TYPE),
        keywords,
        estimated_minutes: payload
            .estimated_minutes
            .filter(|m| m.is_finite() && *m > 0.0)
            .or_else(|| extract_minutes(idea)),
        source: RefinementSource::Generated,
    }
}

/// Query built without the generative service.
pub fn fallback_query(idea: &str) -> RefinedQuery {
    let mut keywords = strip_stopwords(idea);
    let search_query = if keywords.is_empty() {
        collapse_whitespace(idea)
    } else {
        keywords.join(" ")
    };
    keywords.truncate(MAX_KEYWORDS);

    RefinedQuery {
        search_query,
        audience: DEFAULT_AUDIENCE.to_string(),
        content_type: DEFAULT_CONTENT_TYPE.to_string(),
        keywords,
        estimated_minutes: extract_minutes(idea),
        source: RefinementSource::Fallback,
    }
}

/// Words of `text` minus English and Spanish stopwords and bare numbers,
/// lowercased, first occurrence kept.
pub fn strip_stopwords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '+' || c == '#'))
        .map(|w| w.trim_matches('-').to_lowercase())
        .filter(|w| !w.is_empty())
        .filter(|w| !STOPWORDS.contains(w.as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !matches!(w.as_str(), "min" | "mins" | "minute" | "minutes" | "minuto" | "minutos"))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Duration preference stated in free text, in minutes.
pub fn extract_minutes(text: &str) -> Option<f64> {
    let re = DURATION_RE.as_ref()?;
    let caps = re.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    (value > 0.0).then_some(value)
}

fn clean_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .into_iter()
        .map(|k| collapse_whitespace(&k).to_lowercase())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_blank_or(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
