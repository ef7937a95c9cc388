//! Audio download for speech-to-text.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{check_ytdlp, run_with_timeout, ytdlp_base_args};
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

/// Sample rate expected by the speech-to-text model.
pub const AUDIO_SAMPLE_RATE: u32 = 16_000;

/// Download the audio track of `url` as 16 kHz mono WAV into `workdir`.
pub async fn download_audio(config: &MediaConfig, url: &str, workdir: &Path) -> MediaResult<PathBuf> {
    let ytdlp = check_ytdlp(config)?;
    tokio::fs::create_dir_all(workdir).await?;

    let output_path = workdir.join("audio.wav");
    if output_path.exists() {
        tokio::fs::remove_file(&output_path).await?;
    }

    info!(url = %url, output = %output_path.display(), "Downloading audio");

    let args = audio_args(config, url, workdir);
    let output = run_with_timeout(&ytdlp, &args, config.download_timeout).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::from_ytdlp_stderr(&stderr));
    }

    if !output_path.exists() {
        return Err(MediaError::download_failed(format!(
            "yt-dlp finished but {} is missing",
            output_path.display()
        )));
    }
    Ok(output_path)
}

fn audio_args(config: &MediaConfig, url: &str, workdir: &Path) -> Vec<String> {
    let mut args = ytdlp_base_args(config);
    args.extend([
        "--format".to_string(),
        "bestaudio/best".to_string(),
        "--extract-audio".to_string(),
        "--audio-format".to_string(),
        "wav".to_string(),
        "--postprocessor-args".to_string(),
        format!("ffmpeg:-ar {} -ac 1", AUDIO_SAMPLE_RATE),
        "--output".to_string(),
        workdir.join("audio.%(ext)s").to_string_lossy().into_owned(),
        url.to_string(),
    ]);
    args
}
