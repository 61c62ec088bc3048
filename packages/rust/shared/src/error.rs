//! Error types for ArticleSmith.
//!
//! Library crates use [`ArticleSmithError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ArticleSmith operations.
#[derive(Debug, thiserror::Error)]
pub enum ArticleSmithError {
    /// Missing endpoint, token, catalog entry, or an unreadable config file.
    /// Fatal to the whole run.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network, timeout, or non-2xx response from a remote service.
    #[error("transport error: {0}")]
    Transport(String),

    /// Model reply could not be extracted or parsed as structured data.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Structured data parsed but a required field is missing or malformed.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Update targeted an article id that is not in the store.
    #[error("article {id} not found")]
    NotFound { id: u64 },

    /// Persona category label is not in the static category table.
    #[error("unknown category '{label}' (valid labels: {})", .valid.join(", "))]
    UnknownCategory { label: String, valid: Vec<String> },

    /// Flat-file store error that is not a plain I/O failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ArticleSmithError>;

impl ArticleSmithError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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

    /// Whether this error means the run is misconfigured and should stop.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
