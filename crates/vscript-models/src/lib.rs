//! Shared data models for the ViralScript pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Discovered candidate videos and their quality score
//! - Transcripts produced by the audio pipeline
//! - Per-video pattern analyses (and the wire payload they are parsed from)
//! - The cohort-wide pattern synthesis
//! - Generated scripts and their SEO metadata
//! - Single-video executive summaries

pub mod analysis;
pub mod candidate;
pub mod query;
pub mod run;
pub mod scoring;
pub mod script;
pub mod summary;
pub mod synthesis;
pub mod timestamp;
pub mod transcript;
pub mod utils;

// Re-export common types
pub use analysis::{
    AnalysisPayload, CallToAction, CtaType, EffectivenessTag, HookType, ItemAnalysis,
    OpeningHook, Section, SeoSignals, Technique, VideoStructure, Vocabulary,
};
pub use candidate::{CandidateItem, DurationRange, VideoMetadata};
pub use query::{RefinedQuery, RefinementSource};
pub use run::RunId;
pub use scoring::{effectiveness_from_quality, QualityModel, QualityWeights};
pub use script::{GeneratedScript, SeoIssue, SeoMetadata, SeoValidation};
pub use summary::{TimestampedSection, VideoSummary};
pub use synthesis::{
    HookGroup, KeyVocabulary, NarrativeReport, OptimalStructure, PatternSynthesis, RankedCta,
    RankedHook, RankedTechnique, ReportQuality, SecondsRange, SeoPatterns, SeoSource, SeoTerm,
    SynthesisPatterns, TermCount,
};
pub use transcript::{TimedLine, Transcript, TranscriptSource};
pub use utils::{canonical_watch_url, extract_youtube_id, normalize_title_for_filename, YoutubeIdError};
