//! Structured run logging.
//!
//! Provides consistent, structured logging for pipeline runs with tracing
//! spans and the run/stage context attached to every line.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vscript_models::RunId;

/// Initialise the global subscriber.
///
/// `LOG_FORMAT=json` selects JSON lines; otherwise a human formatter with
/// ANSI colours. `RUST_LOG` refines the default `vscript=info` directive.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["vscript=info", "vscript_worker=info", "vscript_llm=info", "vscript_media=info"] {
        if let Ok(d) = directive.parse() {
            env_filter = env_filter.add_directive(d);
        }
    }

    let result = if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()
    };
    // A subscriber may already be installed (tests, embedding binaries).
    let _ = result;
}

/// Run logger carrying the run ID and the current stage.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    stage: &'static str,
}

impl RunLogger {
    pub fn new(run_id: &RunId, stage: &'static str) -> Self {
        Self {
            run_id: run_id.to_string(),
            stage,
        }
    }

    /// Same run, different stage.
    pub fn stage(&self, stage: &'static str) -> Self {
        Self {
            run_id: self.run_id.clone(),
            stage,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, stage = self.stage, "Stage started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, stage = self.stage, "Stage progress: {}", message);
    }

    /// Degraded but recoverable conditions.
    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, stage = self.stage, "Stage warning: {}", message);
    }

    /// Reserved for a failed run.
    pub fn log_error(&self, message: &str) {
        error!(run_id = %self.run_id, stage = self.stage, "Run failed: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, stage = self.stage, "Stage completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage
    }

    /// Span for the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id)
    }
}
