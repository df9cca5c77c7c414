//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for prewarm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for prewarm operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested resource could not be stat'ed or enumerated
    #[error("path not found: '{path}'")]
    PathNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A live job already exists for the resolved root
    #[error("precache already in progress for '{path}'")]
    AlreadyInProgress { path: PathBuf },

    /// No active job is tracked for the path
    #[error("no active cache operation found for '{path}'")]
    NotFound { path: PathBuf },

    /// Read failure while warming a file
    #[error("{operation} failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// An individual directory entry could not be stat'ed during sizing or traversal
    #[error("partial enumeration failure under '{path}': {message}")]
    PartialEnumeration { path: PathBuf, message: String },

    /// A request path that cannot be mapped beneath the mount
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A segment worker task panicked or was cancelled by the runtime
    #[error("worker for '{path}' failed: {message}")]
    Worker { path: PathBuf, message: String },
}
