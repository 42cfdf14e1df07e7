/*!
 * Rate Limiting Middleware
 *
 * Token-bucket, keyed by caller IP, `{rate_per_second, burst}` from config.
 * Over-limit responses carry `Retry-After` plus the usual
 * `X-RateLimit-*` headers.
 */

use std::{net::IpAddr, num::NonZeroU32, sync::Arc};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::net::SocketAddr;

use crate::config::RateLimitConfig;
use crate::state::AppState;

type KeyedLimiter = GovernorRateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Shared, keyed token-bucket limiter. One bucket per distinct client IP;
/// buckets are created lazily and never explicitly evicted — governor
/// periodically sweeps stale entries internally.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<KeyedLimiter>,
    rate_per_second: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(config.rate_per_second.max(1)).unwrap())
            .allow_burst(NonZeroU32::new(config.burst.max(1)).unwrap());

        Self {
            limiter: Arc::new(GovernorRateLimiter::keyed(quota)),
            rate_per_second: config.rate_per_second,
        }
    }
}

fn client_ip(req: &Request<Body>) -> IpAddr {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::from([0, 0, 0, 0]))
}

/// Per-IP token-bucket check.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> std::result::Result<Response, impl IntoResponse> {
    let ip = client_ip(&request);

    match state.rate_limiter.limiter.check_key(&ip) {
        Ok(_) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), state.rate_limiter.rate_per_second, true);
            Ok(response)
        }
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let mut headers = HeaderMap::new();
            add_rate_limit_headers(&mut headers, state.rate_limiter.rate_per_second, false);
            headers.insert("Retry-After", wait.as_secs().to_string().parse().unwrap());
            Err((StatusCode::TOO_MANY_REQUESTS, headers))
        }
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, limit: u32, has_quota: bool) {
    headers.insert("X-RateLimit-Limit", limit.to_string().parse().unwrap());
    let remaining = if has_quota { limit.saturating_sub(1) } else { 0 };
    headers.insert("X-RateLimit-Remaining", remaining.to_string().parse().unwrap());
}
