//! Checkout rate limiting.
//!
//! Fixed-window counter keyed by client IP: cheap, process-local, and good
//! enough for a best-effort abuse control. A burst straddling a window
//! boundary can admit up to twice the limit; that imprecision is accepted.
//! State is lost on restart, also accepted.
//!
//! The window state lives behind [`RateLimitStore`] so a multi-instance
//! deployment can swap in a shared counter service without touching the
//! middleware.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Requests admitted per window per client.
pub const MAX_ATTEMPTS: u32 = 20;

/// Window length.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Attempts left in the current window.
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_in: Duration,
}

/// Pluggable store for per-client window state.
///
/// Checking never errors: an unknown key simply starts a fresh window.
pub trait RateLimitStore: Send + Sync {
    /// Record an attempt for `key` at `now` and decide whether it passes.
    fn check(&self, key: IpAddr, now: Instant) -> RateLimitDecision;
}

/// One client's window.
#[derive(Debug, Clone, Copy)]
struct Window {
    attempts: u32,
    started: Instant,
}

/// Process-local fixed-window store.
#[derive(Debug)]
pub struct InMemoryRateLimitStore {
    max_attempts: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl InMemoryRateLimitStore {
    /// Create a store admitting `max_attempts` requests per `window`.
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Drop windows idle longer than `max_idle`, bounding memory.
    pub fn purge_stale(&self, now: Instant, max_idle: Duration) {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.retain(|_, w| now.duration_since(w.started) < max_idle);
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, WINDOW)
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn check(&self, key: IpAddr, now: Instant) -> RateLimitDecision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        let window = windows.entry(key).or_insert(Window {
            attempts: 0,
            started: now,
        });

        // A stale window resets unconditionally: the new window starts at
        // the first request after expiry, it does not slide.
        if now.duration_since(window.started) > self.window {
            window.attempts = 0;
            window.started = now;
        }

        window.attempts += 1;

        let elapsed = now.duration_since(window.started);
        let reset_in = self.window.saturating_sub(elapsed);

        if window.attempts > self.max_attempts {
            RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            }
        } else {
            RateLimitDecision {
                allowed: true,
                remaining: self.max_attempts - window.attempts,
                reset_in,
            }
        }
    }
}

/// Gate a route on the per-client rate limit.
///
/// Denials become `429` with a `Retry-After` hint via [`AppError`]. Requests
/// whose client IP cannot be determined are admitted with a warning; the
/// limiter is an abuse control, not a security boundary.
///
/// # Errors
///
/// Returns [`AppError::RateLimited`] when the client's window is exhausted.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = client_ip(&req) else {
        warn!("Could not determine client IP, admitting request unlimited");
        return Ok(next.run(req).await);
    };

    let decision = state.limiter().check(ip, Instant::now());

    if !decision.allowed {
        warn!(ip = %ip, "Rate limit exceeded");
        return Err(AppError::RateLimited {
            retry_after_secs: retry_after_secs(decision.reset_in),
        });
    }

    Ok(next.run(req).await)
}

/// Whole seconds until reset, rounded up, never zero.
fn retry_after_secs(reset_in: Duration) -> u64 {
    u64::try_from(reset_in.as_millis().div_ceil(1000)).unwrap_or(u64::MAX).max(1)
}

/// Extract the real client IP.
///
/// Tries `CF-Connecting-IP` first (the CDN's real client IP), then standard
/// proxy headers, then the socket address.
fn client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    let headers = req.headers();

    for header in ["cf-connecting-ip", "x-real-ip", "fly-client-ip"] {
        if let Some(ip) = headers
            .get(header)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Some(ip);
        }
    }

    // X-Forwarded-For: first IP in the chain
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    req.extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|connect_info| connect_info.0.ip())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_admits_up_to_max_attempts() {
        let store = InMemoryRateLimitStore::new(20, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..20 {
            assert!(store.check(ip("10.0.0.1"), now).allowed);
        }

        // The 21st call in the window is denied.
        let denied = store.check(ip("10.0.0.1"), now);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let store = InMemoryRateLimitStore::new(3, Duration::from_secs(60));
        let now = Instant::now();
        let key = ip("10.0.0.2");

        assert_eq!(store.check(key, now).remaining, 2);
        assert_eq!(store.check(key, now).remaining, 1);
        assert_eq!(store.check(key, now).remaining, 0);
        assert!(!store.check(key, now).allowed);
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let store = InMemoryRateLimitStore::new(2, Duration::from_secs(60));
        let start = Instant::now();
        let key = ip("10.0.0.3");

        assert!(store.check(key, start).allowed);
        assert!(store.check(key, start).allowed);
        assert!(!store.check(key, start).allowed);

        // After the window elapses, the next call gets a fresh counter.
        let later = start + Duration::from_secs(61);
        let decision = store.check(key, later);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[test]
    fn test_boundary_request_stays_in_window() {
        // Exactly WINDOW after the start is not yet stale (> not >=).
        let store = InMemoryRateLimitStore::new(1, Duration::from_secs(60));
        let start = Instant::now();
        let key = ip("10.0.0.4");

        assert!(store.check(key, start).allowed);
        assert!(!store.check(key, start + Duration::from_secs(60)).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let store = InMemoryRateLimitStore::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(store.check(ip("10.0.0.5"), now).allowed);
        assert!(!store.check(ip("10.0.0.5"), now).allowed);
        assert!(store.check(ip("10.0.0.6"), now).allowed);
    }

    #[test]
    fn test_reset_in_reports_time_left() {
        let store = InMemoryRateLimitStore::new(1, Duration::from_secs(60));
        let start = Instant::now();
        let key = ip("10.0.0.7");

        store.check(key, start);
        let denied = store.check(key, start + Duration::from_secs(45));
        assert!(!denied.allowed);
        assert_eq!(denied.reset_in, Duration::from_secs(15));
    }

    #[test]
    fn test_purge_stale_drops_idle_windows() {
        let store = InMemoryRateLimitStore::new(5, Duration::from_secs(60));
        let start = Instant::now();

        store.check(ip("10.0.0.8"), start);
        store.purge_stale(start + Duration::from_secs(120), Duration::from_secs(90));

        // A fresh window after the purge has a full budget again.
        let decision = store.check(ip("10.0.0.8"), start + Duration::from_secs(121));
        assert_eq!(decision.remaining, 4);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(1001)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(60)), 60);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }
}
