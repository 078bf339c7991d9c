//! Error types for dsqi-core

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the dsqi-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Artifact registry file is missing
    #[error("artifact registry not found: {}", .0.display())]
    RegistryNotFound(PathBuf),

    /// Artifact id is not present in the registry
    #[error("artifact {0} not found in registry")]
    ArtifactNotFound(u32),

    /// Session log for an artifact slug does not exist
    #[error("session log not found for artifact '{0}'")]
    SessionLogNotFound(String),

    /// Session log exists but holds no sessions
    #[error("no sessions recorded for artifact '{0}'")]
    NoSessions(String),

    /// Artifact source directory is missing
    #[error("source directory not found: {}", .0.display())]
    SourceDirNotFound(PathBuf),

    /// Caller supplied a value outside its domain
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Time-tracking API error
    #[error("time tracking error: {0}")]
    TimeTracking(String),

    /// Line-count tool error
    #[error("line count error: {0}")]
    LineCount(String),
}

/// Result type alias for dsqi-core
pub type Result<T> = std::result::Result<T, Error>;
