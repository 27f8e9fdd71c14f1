//! Error types for coursier-cache
//!
//! All modules use `CacheResult<T>` as their return type.

use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for coursier-cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur while building keys, restoring or saving
#[derive(Error, Debug)]
pub enum CacheError {
    // Input errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob pattern {pattern}: {reason}")]
    GlobPattern { pattern: String, reason: String },

    #[error("Invalid file list {value}: {reason}")]
    FileList { value: String, reason: String },

    // Store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    // Host errors
    #[error("State error: {0}")]
    State(String),

    #[error("Host environment variable {0} is not set")]
    HostEnvMissing(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error came from the blob store rejecting a malformed request
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_validation())
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::HostEnvMissing(_) => Some("Run inside GitHub Actions or pass: --host file"),
            Self::GlobPattern { .. } => Some("Use `**` as a whole path component, e.g. project/**/*.sbt"),
            Self::Store(e) if e.is_validation() => {
                Some("Cache keys must be at most 512 characters and contain no commas")
            }
            _ => None,
        }
    }
}
