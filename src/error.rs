//! Error types for the backend
//!
//! Provides unified error handling using thiserror. A rate-limit denial is not
//! an error and never appears here; see [`crate::admission::Rejection`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// == Cache Error Enum ==
/// Failures raised by a [`crate::cache::CacheStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Store constructed with a capacity of zero
    #[error("Invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// Increment/decrement on a value that is not an integer
    #[error("Value is not an integer: {0}")]
    NotNumeric(String),

    /// Integer arithmetic or timestamp arithmetic overflowed
    #[error("Numeric overflow: {0}")]
    Overflow(String),

    /// Unexpected backend failure
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Admission Error Enum ==
/// Failures raised by an admission check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// A check ran while the admission config was not initialized
    #[error("Admission config is not initialized; call AdmissionConfig::init at startup")]
    NotInitialized,

    /// The backing store failed
    #[error("Cache backend error: {0}")]
    Cache(#[from] CacheError),
}

// == API Error Enum ==
/// Error type returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Admission check could not be performed
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// Cache operation failed
    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Cache(CacheError::NotNumeric(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Admission(_) | ApiError::Cache(_) => {
                // Details stay in the log; clients only see a generic failure.
                error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type for admission checks.
pub type AdmissionResult<T> = std::result::Result<T, AdmissionError>;

/// Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_error_wraps_cache_error() {
        let err: AdmissionError = CacheError::Internal("boom".to_string()).into();
        assert_eq!(err, AdmissionError::Cache(CacheError::Internal("boom".into())));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (ApiError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Cache(CacheError::NotNumeric("k".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Admission(AdmissionError::NotInitialized),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Cache(CacheError::Internal("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
