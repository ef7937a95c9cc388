//! External tool invocation with timeouts.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

/// Resolve yt-dlp on PATH (or as given).
pub fn check_ytdlp(config: &MediaConfig) -> MediaResult<PathBuf> {
    which::which(&config.ytdlp_bin).map_err(|_| MediaError::YtDlpNotFound(config.ytdlp_bin.clone()))
}

/// Resolve the speech-to-text binary.
pub fn check_whisper(config: &MediaConfig) -> MediaResult<PathBuf> {
    which::which(&config.whisper_bin)
        .map_err(|_| MediaError::SpeechToTextNotFound(config.whisper_bin.clone()))
}

/// Run `program` to completion, killing it when `timeout` elapses.
///
/// Returns the raw output regardless of exit status; callers decide how a
/// non-zero exit maps to an error.
pub async fn run_with_timeout(
    program: &Path,
    args: &[String],
    timeout: Duration,
) -> MediaResult<Output> {
    debug!(program = %program.display(), ?args, "Running external tool");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => Err(MediaError::Timeout(timeout.as_secs())),
    }
}

/// yt-dlp arguments shared by every invocation.
pub(crate) fn ytdlp_base_args(config: &MediaConfig) -> Vec<String> {
    let mut args = vec![
        "--no-warnings".to_string(),
        "--no-playlist".to_string(),
        "--no-progress".to_string(),
    ];
    if let Some(cookies) = usable_cookies(config) {
        args.push("--cookies".to_string());
        args.push(cookies.to_string_lossy().into_owned());
    }
    args
}

/// Netscape cookies file, when configured and plausible.
fn usable_cookies(config: &MediaConfig) -> Option<&Path> {
    let path = config.cookies_path.as_deref()?;
    let content = std::fs::read_to_string(path).ok()?;
    is_valid_netscape_cookies(&content).then_some(path)
}

/// Netscape cookies files start with a known header or contain
/// tab-separated lines with at least six fields.
fn is_valid_netscape_cookies(content: &str) -> bool {
    if content.starts_with("# Netscape HTTP Cookie File") || content.starts_with("# HTTP Cookie File")
    {
        return true;
    }
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .any(|l| l.split('\t').count() >= 6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netscape_cookie_detection() {
        assert!(is_valid_netscape_cookies("# Netscape HTTP Cookie File\n"));
        assert!(is_valid_netscape_cookies(
            ".youtube.com\tTRUE\t/\tTRUE\t0\tPREF\tf1=1"
        ));
        assert!(!is_valid_netscape_cookies("not cookies"));
    }

    #[test]
    fn test_base_args_skip_invalid_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "garbage").unwrap();
        let config = MediaConfig {
            cookies_path: Some(path.clone()),
            ..Default::default()
        };
        assert!(!ytdlp_base_args(&config).contains(&"--cookies".to_string()));

        std::fs::write(&path, "# Netscape HTTP Cookie File\n").unwrap();
        let args = ytdlp_base_args(&config);
        assert!(args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn test_missing_binary() {
        let config = MediaConfig {
            ytdlp_bin: "definitely-not-a-real-binary-xyz".into(),
            ..Default::default()
        };
        assert!(matches!(check_ytdlp(&config), Err(MediaError::YtDlpNotFound(_))));
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let Ok(sleep) = which::which("sleep") else {
            return;
        };
        let result = run_with_timeout(&sleep, &["5".to_string()], Duration::from_millis(50)).await;
        assert!(matches!(result, Err(MediaError::Timeout(_))));
    }
}
