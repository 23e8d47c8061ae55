//! Error types shared across Inkframe crates.

use std::path::PathBuf;

/// Top-level error type for Inkframe operations.
///
/// Missing or ambiguous per-frame signals are never errors; they are
/// absorbed by the segment logic. Only misuse and collaborator failures
/// surface here.
#[derive(Debug, thiserror::Error)]
pub enum InkframeError {
    /// An event creator was started before its upstream inputs were supplied.
    #[error("Misuse: {message}")]
    Misuse { message: String },

    /// An external collaborator (OCR, re-inspection, frame access) failed.
    #[error("Collaborator error: {message}")]
    Collaborator { message: String },

    /// A worker task panicked or was aborted before producing a result.
    #[error("Worker '{name}' failed: {message}")]
    Worker { name: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using InkframeError.
pub type InkframeResult<T> = Result<T, InkframeError>;

impl InkframeError {
    pub fn misuse(msg: impl Into<String>) -> Self {
        Self::Misuse {
            message: msg.into(),
        }
    }

    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator {
            message: msg.into(),
        }
    }

    pub fn worker(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Worker {
            name: name.into(),
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether the error is a programming error that must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Misuse { .. } | Self::Worker { .. })
    }
}
