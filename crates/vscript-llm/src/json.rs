//! Extraction of JSON bodies from model output.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LlmError, LlmResult};

/// Strip a surrounding markdown code fence (```` ```json ```` or ```` ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string (`json`, `JSON`, ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Locate the outermost JSON object or array in `text`.
///
/// Models occasionally wrap the payload in a sentence of prose; this takes
/// the span from the first opening brace/bracket to the last matching
/// closing one.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let text = strip_code_fences(text);
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Remove `null` members from objects, recursively.
///
/// Lets wire types rely on `#[serde(default)]` for fields the model chose
/// to emit as `null`.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        other => other,
    }
}

/// Parse model output into `T`.
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> LlmResult<T> {
    if text.trim().is_empty() {
        return Err(LlmError::empty("model output"));
    }
    let span = extract_json_span(text)
        .ok_or_else(|| LlmError::malformed("no JSON object found in model output"))?;
    let value: Value = serde_json::from_str(span)
        .map_err(|e| LlmError::malformed(format!("invalid JSON: {}", e)))?;
    serde_json::from_value(strip_nulls(value))
        .map_err(|e| LlmError::malformed(format!("unexpected JSON shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_extract_span_skips_prose() {
        let text = "Here is the analysis:\n{\"name\": \"x\"}\nHope this helps.";
        assert_eq!(extract_json_span(text), Some("{\"name\": \"x\"}"));
        assert_eq!(extract_json_span("no json here"), None);
    }

    #[test]
    fn test_parse_handles_nulls() {
        let parsed: Sample = parse_json_response("```json\n{\"name\": null, \"tags\": null}\n```").unwrap();
        assert_eq!(parsed, Sample::default());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_json_response::<Sample>("   "),
            Err(LlmError::EmptyResponse(_))
        ));
        assert!(matches!(
            parse_json_response::<Sample>("{\"name\": "),
            Err(LlmError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_json_response::<Sample>("{\"tags\": 5}"),
            Err(LlmError::MalformedResponse(_))
        ));
    }
}
