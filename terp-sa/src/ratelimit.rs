//! Per-client rate limiting for analysis endpoints
//!
//! Analysis requests can fan out to upstream strain APIs, so each
//! client gets a fixed per-minute budget. Health and version probes are
//! exempt. Clients are keyed by the first `X-Forwarded-For` hop when
//! present, falling back to a shared local bucket.

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Keyed token-bucket limiter with header-friendly state reporting
pub struct ApiRateLimiter {
    limiter: governor::RateLimiter<
        String,
        governor::state::keyed::DefaultKeyedStateStore<String>,
        governor::clock::DefaultClock,
        governor::middleware::StateInformationMiddleware,
    >,
    limit_per_minute: u32,
}

impl ApiRateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        // Safe: max(1) is always non-zero
        let per_minute = std::num::NonZeroU32::new(limit_per_minute.max(1)).unwrap();
        let quota = governor::Quota::per_minute(per_minute);
        let limiter = governor::RateLimiter::keyed(quota)
            .with_middleware::<governor::middleware::StateInformationMiddleware>();

        Self {
            limiter,
            limit_per_minute: per_minute.get(),
        }
    }

    /// Requests allowed per minute for any one client
    pub fn limit_per_minute(&self) -> u32 {
        self.limit_per_minute
    }

    /// Spend one request from a client's budget
    ///
    /// Returns the remaining budget, or `None` when the client is over
    /// its limit.
    pub fn check(&self, client: &str) -> Option<u32> {
        match self.limiter.check_key(&client.to_string()) {
            Ok(snapshot) => Some(snapshot.remaining_burst_capacity()),
            Err(_) => None,
        }
    }
}

/// Paths that stay reachable for probes regardless of budget
fn is_exempt(path: &str) -> bool {
    path == "/health" || path == "/api/version"
}

/// Identify the requesting client for budget accounting
fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

/// Axum middleware enforcing the per-client budget
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    let client = client_key(&request);
    let limit = state.rate_limiter.limit_per_minute();

    let Some(remaining) = state.rate_limiter.check(&client) else {
        warn!(client = client.as_str(), "Rate limit exceeded");
        return ApiError::RateLimited { limit }.into_response();
    };

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
    response
}
