//! Maps domain `AppError` to HTTP responses.
//!
//! Handlers return [`ApiError`]; `?` on any fallible call converts the
//! domain error automatically. Internal details never reach the body —
//! infrastructure failures all collapse to a generic payload.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use mediagate_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Wrapper carrying an [`AppError`] out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code, expose_message) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", true),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", true),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT", true),
            ErrorKind::ServiceUnavailable | ErrorKind::Configuration => {
                tracing::error!(error = %err, "Service unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", false)
            }
            ErrorKind::Database
            | ErrorKind::Cache
            | ErrorKind::Storage
            | ErrorKind::Serialization
            | ErrorKind::ExternalService
            | ErrorKind::Internal => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", false)
            }
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message: if expose_message {
                err.message
            } else {
                "The request could not be processed".to_string()
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_conditions_keep_their_message() {
        let response = ApiError(AppError::validation("limit too low")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn infrastructure_failures_are_opaque() {
        let response =
            ApiError(AppError::new(ErrorKind::Database, "connection reset")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn configuration_failures_are_unavailable() {
        let response = ApiError(AppError::configuration("missing secret")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
