//! # Symdex Utilities
//!
//! Shared utilities, logging, and config for symdex.
//!
//! This crate provides common functionality used across the symdex workspace,
//! including logging infrastructure built on `tracing`.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
