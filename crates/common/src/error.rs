//! Error types shared across Reelsync crates.

use std::path::PathBuf;

/// Top-level error type for Reelsync operations.
///
/// Every variant is recoverable: the engine rejects the offending input and
/// leaves its state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ReelsyncError {
    #[error("Invalid range: {message}")]
    InvalidRange { message: String },

    #[error("Failed to load {source_ref}: {message}")]
    Load { source_ref: String, message: String },

    #[error("Unknown effect: {name}")]
    UnknownEffect { name: String },

    #[error("Unknown overlay: {id}")]
    UnknownOverlay { id: u64 },

    #[error("Transform execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Transform job was cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelsyncError.
pub type ReelsyncResult<T> = Result<T, ReelsyncError>;

impl ReelsyncError {
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: msg.into(),
        }
    }

    pub fn load(source_ref: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Load {
            source_ref: source_ref.into(),
            message: msg.into(),
        }
    }

    pub fn unknown_effect(name: impl Into<String>) -> Self {
        Self::UnknownEffect { name: name.into() }
    }

    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the error was caused by rejected caller input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange { .. } | Self::UnknownEffect { .. } | Self::UnknownOverlay { .. }
        )
    }
}

/// Outcome reason for a transform job that did not produce media.
///
/// Kept separate from [`ReelsyncError`] because job state stores it and
/// completions carry it across channels, so it must be `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobFailure {
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("cancelled")]
    Cancelled,
}

impl From<JobFailure> for ReelsyncError {
    fn from(failure: JobFailure) -> Self {
        match failure {
            JobFailure::ExecutionFailed(message) => Self::ExecutionFailed { message },
            JobFailure::Cancelled => Self::Cancelled,
        }
    }
}
