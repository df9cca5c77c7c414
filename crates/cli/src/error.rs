//! Mapping of service errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prewarm_core::Error;

/// Wrapper that renders a service error as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.0.is_conflict() {
            StatusCode::CONFLICT
        } else if self.0.is_invalid_request() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                Error::path_not_found_with_source("/a", std::io::ErrorKind::NotFound.into()),
                StatusCode::NOT_FOUND,
            ),
            (Error::not_found("/a"), StatusCode::NOT_FOUND),
            (Error::already_in_progress("/a"), StatusCode::CONFLICT),
            (Error::invalid_path("../a", "nope"), StatusCode::BAD_REQUEST),
            (Error::worker("/a", "panicked"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status_code(), expected);
        }
    }
}
