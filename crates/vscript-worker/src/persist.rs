//! Run artifact persistence.
//!
//! Layout under the output root:
//!
//! ```text
//! <output_dir>/<run_id>/
//!   transcripts/<normalized_title>.txt
//!   synthesis.json
//!   synthesis_report.md
//!   script.md / script.json
//!   script_es.md / script_es.json
//!   summary.md / summary.json          (single-video summaries)
//! ```
//!
//! Persistence is best effort: every failure is logged and swallowed.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use vscript_models::{
    normalize_title_for_filename, CandidateItem, GeneratedScript, PatternSynthesis, RunId,
    Transcript, VideoSummary,
};

/// Writes one run's artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    run_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl AsRef<Path>, run_id: &RunId) -> Self {
        Self {
            run_dir: output_dir.as_ref().join(run_id.as_str()),
        }
    }

    /// Store writing directly into `dir`, without a run subdirectory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { run_dir: dir.into() }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write each item's transcript. Returns the paths written.
    pub async fn save_transcripts(&self, items: &[CandidateItem]) -> Vec<PathBuf> {
        let dir = self.run_dir.join("transcripts");
        let mut written = Vec::new();
        let mut used = std::collections::HashSet::new();

        for item in items {
            let Some(transcript) = item.transcript.as_ref() else {
                continue;
            };
            let mut stem = normalize_title_for_filename(&item.title);
            if !used.insert(stem.clone()) {
                stem = format!("{}_{}", stem, normalize_title_for_filename(&item.id));
                used.insert(stem.clone());
            }
            let path = dir.join(format!("{stem}.txt"));
            if self.write(&path, transcript.to_file_text().as_bytes()).await {
                written.push(path);
            }
        }
        written
    }

    /// Write one transcript as `transcripts/<normalized_title>.txt`.
    pub async fn save_transcript(&self, title: &str, transcript: &Transcript) -> Option<PathBuf> {
        let path = self
            .run_dir
            .join("transcripts")
            .join(format!("{}.txt", normalize_title_for_filename(title)));
        self.write(&path, transcript.to_file_text().as_bytes())
            .await
            .then_some(path)
    }

    /// Write `summary.md` and `summary.json`.
    pub async fn save_summary(&self, summary: &VideoSummary) -> bool {
        let md = self
            .write(&self.run_dir.join("summary.md"), summary.to_markdown().as_bytes())
            .await;
        let json = self.write_json("summary.json", summary).await;
        md && json
    }

    /// Write `synthesis.json` and `synthesis_report.md`.
    pub async fn save_synthesis(&self, synthesis: &PatternSynthesis) -> bool {
        let json = self.write_json("synthesis.json", synthesis).await;
        let report = self
            .write(
                &self.run_dir.join("synthesis_report.md"),
                synthesis.report.markdown.as_bytes(),
            )
            .await;
        json && report
    }

    /// Write `script{suffix}.md` and `script{suffix}.json`; the suffix is
    /// empty for English and `_<lang>` otherwise.
    pub async fn save_script(&self, script: &GeneratedScript) -> bool {
        let suffix = if script.language == "en" {
            String::new()
        } else {
            format!("_{}", normalize_title_for_filename(&script.language))
        };
        let md = self
            .write(
                &self.run_dir.join(format!("script{suffix}.md")),
                render_script_markdown(script).as_bytes(),
            )
            .await;
        let json = self.write_json(&format!("script{suffix}.json"), script).await;
        md && json
    }

    async fn write_json<T: Serialize>(&self, name: &str, value: &T) -> bool {
        match serde_json::to_vec_pretty(value) {
            Ok(bytes) => self.write(&self.run_dir.join(name), &bytes).await,
            Err(e) => {
                warn!(file = name, error = %e, "Failed to serialize artifact");
                false
            }
        }
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> bool {
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(path = %parent.display(), error = %e, "Failed to create artifact dir");
                return false;
            }
        }
        match tokio::fs::write(path, bytes).await {
            Ok(()) => {
                debug!(path = %path.display(), "Artifact written");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write artifact");
                false
            }
        }
    }
}

/// Script body followed by its SEO metadata block.
pub fn render_script_markdown(script: &GeneratedScript) -> String {
    let mut out = String::new();
    out.push_str(script.script_markdown.trim_end());
    out.push_str("\n\n---\n\n## SEO\n\n");
    out.push_str(&format!("**Title:** {}\n\n", script.seo.title));
    out.push_str(&format!("**Description:**\n\n{}\n\n", script.seo.description));
    out.push_str(&format!("**Tags:** {}\n", script.seo.tags.join(", ")));
    if !script.seo_validation.is_valid() {
        out.push_str("\n**SEO warnings:**\n");
        for issue in &script.seo_validation.issues {
            out.push_str(&format!("- {issue}\n"));
        }
    }
    out.push_str(&format!(
        "\n_{} words, ~{} min (target {} min), {} reference videos, quality {}/100_\n",
        script.word_count,
        script.estimated_duration_minutes,
        script.target_duration_minutes,
        script.reference_count,
        script.estimated_quality_score
    ));
    out
}
