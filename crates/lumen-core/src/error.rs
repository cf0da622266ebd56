//! Error types for the Lumen conversion pipeline.
//!
//! Per-job conversion failures are carried as `ConvertError` and never
//! propagate past the job that caused them; lifecycle violations surface
//! immediately to the caller as `RunError`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Lumen operations.
#[derive(Error, Debug)]
pub enum LumenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-job conversion errors
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// Run lifecycle errors
    #[error("Run error: {0}")]
    Run(#[from] RunError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// A single job's conversion failure.
///
/// The converter does not distinguish failure causes to its caller beyond
/// an advisory message for logging; every variant means "this job failed".
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Source unreadable, unsupported, or corrupt
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Destination unwritable, encoder failure, or disk error
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Source exceeds the configured size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Decoded dimensions exceed the configured limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },
}

/// Run lifecycle errors, surfaced immediately to the violating caller.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RunError {
    /// A second run was requested while one is active
    #[error("a conversion run is already active")]
    AlreadyRunning,

    /// A run was requested with zero registered jobs
    #[error("nothing to do: no jobs registered")]
    NothingToDo,

    /// An operation was attempted in the wrong lifecycle state
    #[error("{0} is not permitted while a run is active")]
    InvalidState(&'static str),
}

/// Convenience type alias for Lumen results.
pub type Result<T> = std::result::Result<T, LumenError>;

/// Convenience type alias for converter results.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
