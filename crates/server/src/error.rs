//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side failures to
//! Sentry before responding to the client. Client-facing messages are
//! deliberately low-detail; the request ID recorded by the request-id
//! middleware is the correlation handle for operators.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::MailError;
use crate::validation::ValidationErrors;

/// Application-level error type for the checkout and analytics API.
#[derive(Debug, Error)]
pub enum AppError {
    /// The checkout payload failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The client exceeded the checkout rate limit.
    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited {
        /// Whole seconds until the client's window resets.
        retry_after_secs: u64,
    },

    /// Database operation failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// The confirmation email could not be dispatched.
    #[error("notification error: {0}")]
    Notification(#[from] MailError),

    /// Missing or invalid operator credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry; expected rejections
        // (validation, rate limiting, auth) are not anomalies.
        if matches!(
            self,
            Self::Repository(_) | Self::Notification(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "success": false,
                    "errors": errors,
                })),
            )
                .into_response(),

            Self::RateLimited { retry_after_secs } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(serde_json::json!({
                        "success": false,
                        "message": "Too many requests. Please try again shortly.",
                    })),
                )
                    .into_response();

                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                response
            }

            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "success": false,
                    "message": "Unauthorized",
                })),
            )
                .into_response(),

            // Never expose internal detail to clients
            Self::Repository(_) | Self::Notification(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": "Unable to process your request",
                })),
            )
                .into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation(ValidationErrors::default())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited {
                retry_after_secs: 30
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(get_status(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after_secs: 42,
        }
        .into_response();

        assert_eq!(
            response.headers().get(RETRY_AFTER),
            Some(&HeaderValue::from_static("42"))
        );
    }

    #[test]
    fn test_internal_error_message_is_generic() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        let response = err.into_response();
        // Body shaping is tested indirectly: the status is 500 and the
        // Display impl (logged server-side) keeps the detail.
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
