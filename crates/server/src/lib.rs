//! Meridian server library.
//!
//! This crate provides the checkout and analytics API as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod links;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE};
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router.
///
/// Layer order (outermost first): Sentry, trace, request ID, security
/// headers, CORS. The rate limiter is applied per-route inside
/// [`routes::routes`] so it only gates the checkout endpoint.
///
/// # Panics
///
/// Panics if the configured allowed origin is not a valid header value;
/// `ServerConfig::from_env` has already validated it, so this only fires on
/// a hand-built config.
#[must_use]
pub fn app(state: AppState) -> Router {
    let allowed_origin = HeaderValue::try_from(state.config().allowed_origin.as_str())
        .expect("allowed origin was validated at config load");

    // Single configured origin, never a wildcard
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", routes::routes(&state))
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
