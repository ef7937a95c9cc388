//! Platform subtitles via yt-dlp.
//!
//! Downloads manual or automatic captions as WebVTT and flattens them into
//! timed lines, dropping the rolling-caption repeats YouTube emits.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use vscript_models::timestamp::parse_timestamp;
use vscript_models::{TimedLine, Transcript, TranscriptSource};

use crate::command::{check_ytdlp, run_with_timeout, ytdlp_base_args};
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

/// Fetch subtitles for `url` into `workdir`.
///
/// Returns [`MediaError::NoSubtitles`] when the video has no captions in
/// any configured language.
pub async fn fetch_subtitles(
    config: &MediaConfig,
    url: &str,
    workdir: &Path,
) -> MediaResult<Transcript> {
    let ytdlp = check_ytdlp(config)?;
    tokio::fs::create_dir_all(workdir).await?;
    info!(url = %url, "Fetching subtitles");

    let output_template = workdir.join("subs.%(id)s");
    let mut args = ytdlp_base_args(config);
    args.extend([
        "--write-auto-sub".to_string(),
        "--write-sub".to_string(),
        "--sub-lang".to_string(),
        config.subtitle_languages.join(","),
        "--skip-download".to_string(),
        "--sub-format".to_string(),
        "vtt".to_string(),
        "--output".to_string(),
        output_template.to_string_lossy().into_owned(),
        url.to_string(),
    ]);

    let output = run_with_timeout(&ytdlp, &args, config.download_timeout).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::from_ytdlp_stderr(&stderr));
    }

    let vtt_files = find_vtt_files(workdir, &config.subtitle_languages).await?;
    let Some((path, language)) = vtt_files.first().cloned() else {
        return Err(MediaError::NoSubtitles);
    };

    let content = tokio::fs::read_to_string(&path).await?;
    let segments = parse_vtt(&content);

    for (file, _) in &vtt_files {
        tokio::fs::remove_file(file).await.ok();
    }

    if segments.is_empty() {
        return Err(MediaError::NoSubtitles);
    }
    debug!(lines = segments.len(), language = %language, "Parsed subtitles");

    let mut transcript = Transcript::from_segments(segments, TranscriptSource::Subtitles);
    if !language.is_empty() {
        transcript = transcript.with_language(language);
    }
    Ok(transcript)
}

/// `.vtt` files in `dir`, ordered by language preference.
async fn find_vtt_files(dir: &Path, languages: &[String]) -> MediaResult<Vec<(PathBuf, String)>> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("vtt") {
            continue;
        }
        // subs.<id>.<lang>.vtt
        let language = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.rsplit('.').next())
            .unwrap_or_default()
            .to_string();
        found.push((path, language));
    }

    found.sort_by(|(pa, la), (pb, lb)| {
        let rank = |l: &String| languages.iter().position(|p| p == l).unwrap_or(usize::MAX);
        rank(la).cmp(&rank(lb)).then_with(|| pa.cmp(pb))
    });
    Ok(found)
}

/// Parse WebVTT into timed lines.
///
/// Cue headers set the current start offset; inline tags are removed and a
/// line identical to the previous one is skipped.
pub fn parse_vtt(content: &str) -> Vec<TimedLine> {
    let mut lines = Vec::new();
    let mut current_start = 0.0;
    let mut previous = String::new();
    let mut in_header_block = false;

    for raw in content.lines() {
        let raw = raw.trim();

        if raw.starts_with("WEBVTT") || raw.starts_with("NOTE") || raw.starts_with("STYLE") {
            in_header_block = true;
            continue;
        }
        if raw.is_empty() {
            in_header_block = false;
            continue;
        }
        if in_header_block {
            continue;
        }

        if let Some((start, _)) = raw.split_once("-->") {
            if let Ok(secs) = parse_timestamp(start) {
                current_start = secs;
            }
            continue;
        }

        let text = strip_tags(raw);
        let text = text.trim();
        if text.is_empty() || text.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        if text != previous {
            lines.push(TimedLine {
                start_seconds: current_start.floor(),
                text: text.to_string(),
            });
            previous = text.to_string();
        }
    }

    lines
}

/// Remove `<...>` tags and decode the handful of entities captions use.
fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT
Kind: captions
Language: en

00:00:00.000 --> 00:00:02.500 align:start position:0%
Hello<00:00:00.500><c> everyone</c>

00:00:02.500 --> 00:00:05.000
Hello everyone

00:00:05.000 --> 00:00:07.000
1

01:05.200 --> 01:08.000
today we install <b>n8n</b> &amp; Docker
";

    #[test]
    fn test_parse_vtt_dedupes_rolling_captions() {
        let lines = parse_vtt(SAMPLE);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello everyone");
        assert_eq!(lines[0].start_seconds, 0.0);
        assert_eq!(lines[1].text, "today we install n8n & Docker");
        assert_eq!(lines[1].start_seconds, 65.0);
    }

    #[test]
    fn test_parse_vtt_empty() {
        assert!(parse_vtt("WEBVTT\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_find_vtt_files_prefers_language_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["subs.abc.es.vtt", "subs.abc.en.vtt", "subs.abc.de.vtt", "other.txt"] {
            std::fs::write(dir.path().join(name), "WEBVTT").unwrap();
        }
        let langs = vec!["en".to_string(), "es".to_string()];
        let found = find_vtt_files(dir.path(), &langs).await.unwrap();
        let order: Vec<&str> = found.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(order, vec!["en", "es", "de"]);
    }
}
