//! Video index and audio pipeline boundary.
//!
//! This crate provides:
//! - [`VideoIndex`]: keyword search with engagement metadata (yt-dlp)
//! - [`AudioPipeline`]: subtitles-first transcripts with a download +
//!   speech-to-text fallback
//! - WebVTT and whisper output parsing

pub mod command;
pub mod config;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod search;
pub mod subtitles;
pub mod transcribe;

pub use command::{check_whisper, check_ytdlp};
pub use config::MediaConfig;
pub use download::download_audio;
pub use error::{MediaError, MediaResult};
pub use pipeline::{AudioPipeline, YtDlpAudioPipeline};
pub use search::{parse_search_output, SearchRequest, VideoIndex, YtDlpSearcher};
pub use subtitles::{fetch_subtitles, parse_vtt};
pub use transcribe::{parse_whisper_json, transcribe_audio};
