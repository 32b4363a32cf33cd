//! Error taxonomy for the reading endpoint.
//!
//! Every failure surfaces as an HTTP error with a stable machine-readable
//! code and a human-readable message; nothing is retried and nothing is
//! folded into a 200.

use crate::services::providers::ProviderError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadingError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Upstream call failed: {0}")]
    Upstream(ProviderError),

    #[error("Upstream call timed out")]
    UpstreamTimeout,

    #[error("Upstream response carried no text content")]
    UpstreamFormat,

    #[error("Upstream reply is not valid JSON")]
    Parse,

    #[error("Upstream reply does not match the reading schema: {0}")]
    Schema(String),
}

impl ReadingError {
    /// Stable machine-readable code, used in response bodies and as the
    /// outcome label on the request counter.
    pub fn code(&self) -> &'static str {
        match self {
            ReadingError::BadRequest(_) | ReadingError::Validation(_) => "bad_request",
            ReadingError::Upstream(_) => "upstream_error",
            ReadingError::UpstreamTimeout => "upstream_timeout",
            ReadingError::UpstreamFormat => "upstream_format",
            ReadingError::Parse => "parse_error",
            ReadingError::Schema(_) => "schema_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ReadingError::BadRequest(_) | ReadingError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProviderError> for ReadingError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout => ReadingError::UpstreamTimeout,
            other => ReadingError::Upstream(other),
        }
    }
}

impl IntoResponse for ReadingError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
            message: String,
        }

        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_timeout_maps_to_upstream_timeout() {
        let err = ReadingError::from(ProviderError::Timeout);
        assert_eq!(err.code(), "upstream_timeout");
    }

    #[test]
    fn provider_failures_map_to_upstream_error() {
        let err = ReadingError::from(ProviderError::RateLimited);
        assert_eq!(err.code(), "upstream_error");

        let err = ReadingError::from(ProviderError::ApiError("boom".to_string()));
        assert_eq!(err.code(), "upstream_error");
    }
}
