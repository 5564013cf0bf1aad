use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the worklog crates.
#[derive(Error, Debug)]
pub enum WorklogError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An aggregate could not be serialised to JSON.
    #[error("Failed to serialize JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// An encoding label is not one of the supported encodings.
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Filter thresholds are negative or not finite.
    #[error("Invalid filter options: {0}")]
    InvalidFilter(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the worklog crates.
pub type Result<T> = std::result::Result<T, WorklogError>;
