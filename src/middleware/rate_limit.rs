//! Fixed-window request throttling. Each router group carries its own
//! limiter so a burst against the public application form cannot starve
//! the authenticated API.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
struct Window {
    limit: u32,
    started: Instant,
    second: AtomicU64,
    used: AtomicU32,
}

#[derive(Clone, Debug)]
pub struct RateLimiter(Arc<Window>);

impl RateLimiter {
    fn new(rps: u32) -> Self {
        Self(Arc::new(Window {
            limit: rps.max(1),
            started: Instant::now(),
            second: AtomicU64::new(0),
            used: AtomicU32::new(0),
        }))
    }

    fn allow(&self) -> bool {
        let w = &self.0;
        let current = w.started.elapsed().as_secs();
        let seen = w.second.load(Ordering::Acquire);
        // First request of a new second resets the counter; losers of the
        // race just count against the fresh window.
        if current != seen
            && w.second
                .compare_exchange(seen, current, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            w.used.store(0, Ordering::Release);
        }
        w.used.fetch_add(1, Ordering::AcqRel) < w.limit
    }
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.allow() {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(json!({ "error": "too many requests" })),
        )
            .into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_past_the_per_second_limit() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[test]
    fn zero_rps_still_admits_one_request() {
        let limiter = RateLimiter::new(0);
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }
}
