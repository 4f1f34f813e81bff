//! Per-client IP rate limiting for `/api` using the GCRA algorithm.
//!
//! Each client IP gets its own limiter, created lazily on its first request.
//! The quota allows a burst of `max_requests` and replenishes one request
//! every `window / max_requests`. Entries idle for a whole window are removed
//! by a background task.
//!
//! Clients are keyed on the socket peer. `X-Forwarded-For` is only consulted
//! when the service is configured to sit behind a trusted proxy.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorLimiter};
use serde_json::json;

use crate::config::RateLimitConfig;

type IpLimiter = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

struct RateLimitEntry {
    limiter: IpLimiter,
    last_seen: Instant,
}

/// Request quota per client IP.
pub struct ApiRateLimiter {
    limiters: DashMap<IpAddr, RateLimitEntry>,
    quota: Quota,
    window: Duration,
    trust_proxy: bool,
}

impl ApiRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let burst = NonZeroU32::new(config.max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(config.window / burst.get())
            .map(|q| q.allow_burst(burst))
            .unwrap_or_else(|| Quota::per_second(burst));

        tracing::info!(
            max_requests = config.max_requests,
            window_secs = config.window.as_secs(),
            trust_proxy = config.trust_proxy,
            "API rate limiter configured"
        );

        Self {
            limiters: DashMap::new(),
            quota,
            window: config.window,
            trust_proxy: config.trust_proxy,
        }
    }

    /// Returns `true` if a request from `ip` is allowed.
    pub fn check(&self, ip: IpAddr) -> bool {
        let mut entry = self.limiters.entry(ip).or_insert_with(|| RateLimitEntry {
            limiter: GovernorLimiter::direct(self.quota),
            last_seen: Instant::now(),
        });
        entry.last_seen = Instant::now();
        entry.limiter.check().is_ok()
    }

    /// Seconds a rejected client is told to wait.
    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Removes entries not seen for a whole window. Returns how many were removed.
    pub fn cleanup_stale(&self) -> usize {
        let Some(cutoff) = Instant::now().checked_sub(self.window) else {
            return 0;
        };
        let before = self.limiters.len();
        self.limiters.retain(|_, entry| entry.last_seen > cutoff);
        let removed = before - self.limiters.len();
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = self.limiters.len(),
                "Cleaned up stale rate limiter entries"
            );
        }
        removed
    }

    #[allow(dead_code)]
    pub fn tracked_ips(&self) -> usize {
        self.limiters.len()
    }

    /// Spawns a task that calls [`cleanup_stale`](Self::cleanup_stale) once per window.
    pub fn spawn_cleanup_task(self: &Arc<Self>) {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(limiter.window);
            tick.tick().await;
            loop {
                tick.tick().await;
                limiter.cleanup_stale();
            }
        });
    }
}

/// Client address: the socket peer, or the first `X-Forwarded-For` hop when
/// `trust_proxy` is set and the header parses.
fn client_ip(request: &Request, trust_proxy: bool) -> IpAddr {
    let forwarded = trust_proxy
        .then(|| request.headers().get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|hop| hop.trim().parse().ok());

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware rejecting requests over quota with 429.
pub async fn rate_limit(
    State(limiter): State<Arc<ApiRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request, limiter.trust_proxy);
    if limiter.check(ip) {
        return next.run(request).await;
    }

    let retry_after = limiter.retry_after_secs();
    tracing::warn!(%ip, path = %request.uri().path(), "Rate limit exceeded");

    (
        StatusCode::TOO_MANY_REQUESTS,
        [(RETRY_AFTER, retry_after.to_string())],
        Json(json!({
            "error": "Too many requests",
            "message": "Rate limit exceeded, try again later",
            "retryAfter": retry_after,
        })),
    )
        .into_response()
}
