//! Timestamp parsing utilities.
//!
//! Offsets coming back from the generative service are sometimes plain
//! seconds and sometimes clock strings (`HH:MM:SS`, `MM:SS`), so both are
//! accepted here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum reasonable video offset (24 hours in seconds).
pub const MAX_VIDEO_DURATION_SECS: f64 = 86400.0;

/// Errors from timestamp parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,

    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("timestamp is negative")]
    Negative,

    #[error("invalid timestamp format: {0}")]
    InvalidFormat(String),
}

/// Parse a timestamp string to total seconds.
///
/// Supports `HH:MM:SS(.mmm)`, `MM:SS(.mmm)` and `SS(.mmm)`.
///
/// # Examples
/// ```
/// use vscript_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim().trim_start_matches('[').trim_end_matches(']');
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    let units: &[(&'static str, f64)] = match parts.len() {
        1 => &[("seconds", 1.0)],
        2 => &[("minutes", 60.0), ("seconds", 1.0)],
        3 => &[("hours", 3600.0), ("minutes", 60.0), ("seconds", 1.0)],
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    let mut total = 0.0;
    for (part, &(name, factor)) in parts.iter().zip(units) {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| TimestampError::InvalidValue(name, part.to_string()))?;
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        total += value * factor;
    }
    Ok(total)
}

/// Format seconds as `MM:SS`, or `H:MM:SS` past the hour.
pub fn format_clock(total_secs: f64) -> String {
    let total = total_secs.max(0.0).round() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// An offset as emitted by the generative service: either a number of
/// seconds or a clock string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OffsetValue {
    Seconds(f64),
    Clock(String),
}

impl OffsetValue {
    /// Resolve to seconds, rejecting negative, non-finite and absurd values.
    pub fn to_seconds(&self) -> Option<f64> {
        let secs = match self {
            OffsetValue::Seconds(s) => *s,
            OffsetValue::Clock(s) => parse_timestamp(s).ok()?,
        };
        (secs.is_finite() && (0.0..=MAX_VIDEO_DURATION_SECS).contains(&secs)).then_some(secs)
    }
}
