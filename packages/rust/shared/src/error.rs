//! Error types for LeadScout.
//!
//! Library crates use [`LeadScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all LeadScout operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to a search or model backend.
    #[error("network error: {0}")]
    Network(String),

    /// Search provider returned an unusable response.
    #[error("search error: {0}")]
    Search(String),

    /// Model call or response handling error.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Data validation error (missing fields, invalid status transition, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadScoutError>;

impl LeadScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LeadScoutError::config("missing API key env var");
        assert_eq!(err.to_string(), "config error: missing API key env var");

        let err = LeadScoutError::validation("contact has no email");
        assert!(err.to_string().contains("no email"));
    }
}
