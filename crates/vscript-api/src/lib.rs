//! Axum HTTP API over the script generation pipeline.
//!
//! This crate provides:
//! - `POST /api/synthesize`: pattern synthesis over caller-supplied analyses
//! - `POST /api/scripts`: a full pipeline run
//! - Health/readiness probes and Prometheus metrics
//! - Per-IP rate limiting, CORS, request IDs and request logging

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
