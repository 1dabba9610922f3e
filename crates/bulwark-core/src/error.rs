//! Error types for the fallible edges of the wave core.
//!
//! The tick loop itself never fails; these cover configuration loading and
//! stats persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration could not be loaded or is out of range.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Persistent stats could not be read or written.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to access stats file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed stats data: {0}")]
    Format(#[from] serde_json::Error),
}
