//! HTTP handlers.

pub mod health;
pub mod scripts;
pub mod synthesis;
pub mod videos;

pub use health::{health, ready};
