// error.rs: Error types for the goals subsystem.
//
// Store operations themselves never fail; these errors come from the edges:
// configuration files, notification sinks, and parsing user input.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur around goal tracking.
#[derive(Debug, Error)]
pub enum GoalError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize an event.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The configuration file exists but is not valid TOML for `GoalsConfig`.
    #[error("invalid config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A `[[goals]]` seed whose frequency is outside the accepted range.
    #[error("invalid config at {path}: goal '{title}' has frequency {frequency} (expected 1 to 9)")]
    InvalidSeed {
        path: PathBuf,
        title: String,
        frequency: u32,
    },

    /// An interval name other than daily/weekly/monthly.
    #[error("unknown interval '{0}' (expected daily, weekly or monthly)")]
    InvalidInterval(String),

    /// A notification dispatch failed (non-fatal).
    #[error("notification error: {0}")]
    NotificationError(String),
}
