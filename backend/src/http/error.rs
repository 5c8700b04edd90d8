//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::scheduling::SchedulingError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Whether a single retry after re-reading may succeed
    #[serde(default)]
    pub retryable: bool,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl From<&SchedulingError> for ApiError {
    fn from(err: &SchedulingError) -> Self {
        let api = ApiError::new(err.code(), err.to_string()).retryable(err.is_retryable());
        match err {
            SchedulingError::Repository(inner) => api.with_details(inner.context().to_string()),
            _ => api,
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed path, query or body
    BadRequest(String),
    /// A scheduling operation was rejected
    Scheduling(SchedulingError),
}

pub fn status_for(err: &SchedulingError) -> StatusCode {
    match err {
        SchedulingError::Validation(_) => StatusCode::BAD_REQUEST,
        SchedulingError::OutOfWindow(_) | SchedulingError::PastDate { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SchedulingError::NoCapacity(_)
        | SchedulingError::InsufficientCapacity { .. }
        | SchedulingError::SessionClosed(_)
        | SchedulingError::Conflict(_) => StatusCode::CONFLICT,
        SchedulingError::NotFound(_) => StatusCode::NOT_FOUND,
        SchedulingError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        SchedulingError::Repository(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        SchedulingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Scheduling(e) => (status_for(&e), ApiError::from(&e)),
        };

        (status, Json(error)).into_response()
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        AppError::Scheduling(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RepositoryError;

    #[test]
    fn test_capacity_errors_map_to_conflict() {
        assert_eq!(
            status_for(&SchedulingError::NoCapacity("full".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&SchedulingError::Timeout("slow".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_api_error_carries_code_and_retry_hint() {
        let api = ApiError::from(&SchedulingError::conflict("stale"));
        assert_eq!(api.code, "CONFLICT");
        assert!(api.retryable);

        let api = ApiError::from(&SchedulingError::from(RepositoryError::connection("boom")));
        assert_eq!(api.code, "REPOSITORY_ERROR");
        assert!(api.details.is_some());
    }
}
