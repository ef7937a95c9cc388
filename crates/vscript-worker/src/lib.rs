//! Script generation pipeline.
//!
//! This crate provides:
//! - Query refinement and candidate discovery
//! - Bounded-parallel transcript acquisition and per-item analysis
//! - Deterministic pattern synthesis with a narrative report
//! - Script generation, Spanish translation and artifact persistence
//! - Single-video transcription and executive summaries
//! - The end-to-end [`ScriptPipeline`]

pub mod acquire;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod finder;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod persist;
pub mod pool;
pub mod query;
pub mod retry;
pub mod script;
pub mod summarize;
pub mod synthesis;
pub mod translate;

pub use acquire::TranscriptAcquirer;
pub use analyzer::ItemAnalyzer;
pub use config::PipelineConfig;
pub use error::{AnalysisError, WorkerError, WorkerResult};
pub use finder::CandidateFinder;
pub use logging::{init_tracing, RunLogger};
pub use orchestrator::{
    PipelineOutcome, PipelineRequest, PipelineServices, ScriptPipeline, SummaryOutcome,
    TranscriptOutcome,
};
pub use persist::ArtifactStore;
pub use query::QueryRefiner;
pub use retry::{retry_async, RetryConfig};
pub use script::ScriptGenerator;
pub use summarize::{detect_language, VideoSummarizer};
pub use synthesis::PatternSynthesizer;
pub use translate::ScriptTranslator;
