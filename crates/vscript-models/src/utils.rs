//! URL and file-name helpers shared across crates.

use thiserror::Error;

/// Errors that can occur during YouTube ID extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YoutubeIdError {
    #[error("URL is not a valid YouTube URL")]
    InvalidYoutubeUrl,
    #[error("Video ID has invalid format")]
    InvalidVideoId,
    #[error("Video ID not found in URL")]
    VideoIdNotFound,
}

/// Markers preceding the video ID, tried in order.
const ID_MARKERS: &[&str] = &["?v=", "&v=", "youtu.be/", "/embed/", "/v/", "/shorts/"];

/// Extract the 11-character YouTube video ID from any common URL shape
/// (`watch?v=`, `youtu.be/`, `/embed/`, `/v/`, `/shorts/`).
pub fn extract_youtube_id(url: &str) -> Result<String, YoutubeIdError> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if !lower.contains("youtube.com") && !lower.contains("youtu.be") {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    }

    for marker in ID_MARKERS {
        let Some(pos) = url.find(marker) else {
            continue;
        };
        let segment = &url[pos + marker.len()..];
        if segment.is_empty() && *marker != "?v=" && *marker != "&v=" {
            continue;
        }
        let end = segment
            .find(['&', '#', '?', '/'])
            .unwrap_or(segment.len());
        return validate_youtube_id(segment[..end].trim());
    }

    Err(YoutubeIdError::VideoIdNotFound)
}

fn validate_youtube_id(id: &str) -> Result<String, YoutubeIdError> {
    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if id.len() != 11 || !valid_chars {
        return Err(YoutubeIdError::InvalidVideoId);
    }
    Ok(id.to_string())
}

/// Canonical watch URL for a video ID.
pub fn canonical_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Turn a title into a safe file stem.
///
/// Keeps word characters, whitespace and hyphens, collapses runs of
/// whitespace/hyphens into `_`, and falls back to `untitled`.
pub fn normalize_title_for_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_sep = false;

    for c in title.chars() {
        if c.is_whitespace() || c == '-' {
            pending_sep = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
