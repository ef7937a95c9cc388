//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus exporter. Without an installed recorder these are no-ops.

use metrics::{counter, gauge, histogram};

/// Metric names.
pub mod names {
    pub const RUNS_TOTAL: &str = "vscript_runs_total";
    pub const RUN_DURATION_SECONDS: &str = "vscript_run_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "vscript_stage_duration_seconds";

    pub const CANDIDATES_FOUND: &str = "vscript_candidates_found";
    pub const TRANSCRIPTS_TOTAL: &str = "vscript_transcripts_total";
    pub const ANALYSES_TOTAL: &str = "vscript_analyses_total";
    pub const ANALYSIS_FAILURES_TOTAL: &str = "vscript_analysis_failures_total";

    pub const SYNTHESIS_TOTAL: &str = "vscript_synthesis_total";
    pub const SCRIPTS_GENERATED_TOTAL: &str = "vscript_scripts_generated_total";
    pub const SEO_VALIDATION_ISSUES_TOTAL: &str = "vscript_seo_validation_issues_total";

    pub const SUMMARIES_TOTAL: &str = "vscript_summaries_total";
}

/// Record a finished run. `outcome` is `success` or `failure`.
pub fn record_run(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
    histogram!(names::RUN_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn set_candidates_found(count: usize) {
    gauge!(names::CANDIDATES_FOUND).set(count as f64);
}

/// Record a transcript attempt. `outcome` is `ok` or `failed`.
pub fn record_transcript(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::TRANSCRIPTS_TOTAL, &labels).increment(1);
}

pub fn record_analysis_success() {
    counter!(names::ANALYSES_TOTAL).increment(1);
}

pub fn record_analysis_failure(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::ANALYSIS_FAILURES_TOTAL, &labels).increment(1);
}

/// Record a synthesis. `quality` is `narrative` or `template`.
pub fn record_synthesis(quality: &str) {
    let labels = [("quality", quality.to_string())];
    counter!(names::SYNTHESIS_TOTAL, &labels).increment(1);
}

pub fn record_script_generated(language: &str) {
    let labels = [("language", language.to_string())];
    counter!(names::SCRIPTS_GENERATED_TOTAL, &labels).increment(1);
}

pub fn record_seo_issues(count: usize) {
    if count > 0 {
        counter!(names::SEO_VALIDATION_ISSUES_TOTAL).increment(count as u64);
    }
}

pub fn record_summary(language: &str) {
    let labels = [("language", language.to_string())];
    counter!(names::SUMMARIES_TOTAL, &labels).increment(1);
}
