//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health            - Liveness check
//! GET  /health/ready      - Readiness check (DB connectivity)
//!
//! # Under /api
//! GET  /api/catalog       - Purchasable document bundles
//! POST /api/checkout      - Order fulfillment pipeline (rate limited)
//! GET  /api/analytics     - Operator summary (bearer token)
//! ```

pub mod analytics;
pub mod catalog;
pub mod checkout;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// Create all API routes.
///
/// The rate limiter gates only the checkout route; catalog reads and the
/// operator view are not abuse targets worth throttling.
pub fn routes(state: &AppState) -> Router<AppState> {
    let checkout = Router::new()
        .route("/checkout", post(checkout::submit))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/catalog", get(catalog::list))
        .route("/analytics", get(analytics::summary))
        .merge(checkout)
}
