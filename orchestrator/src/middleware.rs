use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::ApiError;

pub type SessionRateLimiter = DefaultKeyedRateLimiter<String>;

pub fn cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_headers(vec![
            "User-Agent",
            "Sec-Fetch-Mode",
            "Referer",
            "Origin",
            "Access-Control-Request-Method",
            "Access-Control-Request-Headers",
            "Content-Type",
            "Authorization",
            "Accept",
            "Content-Length",
            "Cache-Control",
            "Last-Event-ID",
        ])
        .allow_methods(vec!["POST", "GET", "OPTIONS"])
}

/// Per-session request limiter shared by every route.
pub fn rate_limiter(per_minute: u32) -> Arc<SessionRateLimiter> {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute)))
}

pub fn check_rate(limiter: &SessionRateLimiter, session_id: &str) -> Result<(), ApiError> {
    limiter
        .check_key(&session_id.to_string())
        .map_err(|_| ApiError::RateLimitExceeded)
}
