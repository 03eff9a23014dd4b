//! Rate limiting for the credential endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing and signup spam.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

use crate::auth::extract_client_ip;
use crate::cli::IpExtractor;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Default attempts per minute per client for `POST /login` and `POST /register`.
pub const DEFAULT_ATTEMPTS_PER_MINUTE: u32 = 10;

/// Interval between sweeps of idle client buckets.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Rate limiting configuration for the credential endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    pub login: Arc<IpLimiter>,
    pub register: Arc<IpLimiter>,
    /// Header to read the client IP from when behind a proxy
    pub ip_extractor: Option<IpExtractor>,
}

impl RateLimitConfig {
    /// Allow `attempts_per_minute` requests per client and endpoint, with the
    /// whole minute's allowance available as a burst. Zero is treated as one.
    pub fn new(attempts_per_minute: u32, ip_extractor: Option<IpExtractor>) -> Self {
        let per_minute = NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            register: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            ip_extractor,
        }
    }

    /// Forget clients whose buckets have fully refilled.
    pub fn prune(&self) {
        for limiter in [&self.login, &self.register] {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }
}

/// Spawn a background task that prunes idle buckets periodically.
pub fn spawn_pruner(config: RateLimitConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);

        loop {
            interval.tick().await;
            config.prune();
        }
    })
}

async fn limit(
    limiter: &IpLimiter,
    ip_extractor: Option<IpExtractor>,
    what: &'static str,
    request: Request,
    next: Next,
) -> Response {
    let ip = match extract_client_ip(&request, ip_extractor) {
        Ok(ip) => ip,
        Err(reason) => {
            tracing::warn!(reason, "Unable to determine client IP for {}", what);
            return (StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response();
        }
    };

    if limiter.check_key(&ip).is_ok() {
        return next.run(request).await;
    }
    tracing::warn!(client = %ip, "{} rate limit exceeded", what);
    (
        StatusCode::TOO_MANY_REQUESTS,
        "Too many attempts. Please wait before trying again.",
    )
        .into_response()
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<RateLimitConfig>,
    request: Request,
    next: Next,
) -> Response {
    limit(&config.login, config.ip_extractor, "Login", request, next).await
}

/// Middleware for rate limiting registrations.
pub async fn rate_limit_register(
    State(config): State<RateLimitConfig>,
    request: Request,
    next: Next,
) -> Response {
    limit(&config.register, config.ip_extractor, "Registration", request, next).await
}
