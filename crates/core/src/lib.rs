//! Docent Core Library
//!
//! This crate provides the foundational utilities shared by every Docent crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (providers, vector store, bots)
//! - Retry policy for upstream calls

pub mod config;
pub mod error;
pub mod logging;
pub mod retry;

// Re-export commonly used types
pub use config::{AppConfig, BotConfig, DistanceMetric};
pub use error::{AppError, AppResult};
pub use retry::RetryPolicy;
