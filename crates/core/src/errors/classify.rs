//! Classification helpers used when mapping errors onto transport responses

use super::types::Error;

impl Error {
    /// True when the error means the requested resource or job does not exist
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::PathNotFound { .. } | Error::NotFound { .. })
    }

    /// True when the request conflicts with a live job
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Error::AlreadyInProgress { .. })
    }

    /// True when the caller supplied something unusable
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Error::InvalidPath { .. })
    }
}
