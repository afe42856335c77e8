//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (nosniff, frame-deny, no-store)
//! 5. CORS (single configured origin)
//! 6. Rate limiting (checkout route only)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::RequireOperator;
pub use rate_limit::{
    InMemoryRateLimitStore, RateLimitDecision, RateLimitStore, rate_limit_middleware,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
