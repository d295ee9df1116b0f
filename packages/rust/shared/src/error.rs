//! Error types for nbshelf.
//!
//! Library crates use [`NbshelfError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all nbshelf operations.
#[derive(Debug, thiserror::Error)]
pub enum NbshelfError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The browser automation session could not be launched or closed.
    #[error("session error: {0}")]
    Session(String),

    /// A page-driver primitive (evaluate, query, click, ...) failed.
    #[error("driver error: {0}")]
    Driver(String),

    /// Navigation to a page failed or timed out.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// Library file could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Question-answering call failed.
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NbshelfError>;

impl NbshelfError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a driver error from any displayable message.
    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts a whole batch rather than a single record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Session(_)
                | Self::Navigation(_)
                | Self::Storage(_)
                | Self::Io { .. }
                | Self::Config { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NbshelfError::config("missing webdriver url");
        assert_eq!(err.to_string(), "config error: missing webdriver url");

        let err = NbshelfError::driver("stale element");
        assert!(err.to_string().contains("stale element"));
    }

    #[test]
    fn fatal_classification() {
        assert!(NbshelfError::Session("no chromedriver".into()).is_fatal());
        assert!(NbshelfError::Storage("corrupt library".into()).is_fatal());
        assert!(!NbshelfError::driver("click intercepted").is_fatal());
        assert!(!NbshelfError::Enrichment("empty".into()).is_fatal());
    }
}
