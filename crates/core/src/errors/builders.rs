//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

impl Error {
    /// Create a path-not-found error from a failed stat or enumeration
    #[must_use]
    pub fn path_not_found_with_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::PathNotFound {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn already_in_progress(path: impl Into<PathBuf>) -> Self {
        Error::AlreadyInProgress { path: path.into() }
    }

    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound { path: path.into() }
    }

    /// Create an I/O error for the given operation on a path
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a partial enumeration error
    #[must_use]
    pub fn partial_enumeration(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::PartialEnumeration {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid request path error
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn worker(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Worker {
            path: path.into(),
            message: message.into(),
        }
    }
}
