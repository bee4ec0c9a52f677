//! # RevFlow Config
//!
//! SDK configuration, file system paths, and logging initialization.

mod config;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_FLUSH_INTERVAL_SECS, DEFAULT_FLUSH_QUEUE_SIZE, DEFAULT_SERVER_URL};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;

use thiserror::Error;

/// Configuration error type.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
