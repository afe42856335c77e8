//! Operator authentication for the analytics endpoint.
//!
//! The analytics view is an admin-only boundary. The operator presents a
//! bearer token which is compared in constant time against the configured
//! credential; anything else is a plain 401.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires a valid operator bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     _: RequireOperator,
///     State(state): State<AppState>,
/// ) -> impl IntoResponse {
///     // only reachable with a valid token
/// }
/// ```
pub struct RequireOperator;

impl FromRequestParts<AppState> for RequireOperator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let expected = state.config().operator_token.expose_secret();

        // Constant-time comparison; ct_eq on slices of unequal length
        // resolves to "not equal" without an early return on content.
        if token.as_bytes().ct_eq(expected.as_bytes()).into() {
            Ok(Self)
        } else {
            Err(AppError::Unauthorized)
        }
    }
}
