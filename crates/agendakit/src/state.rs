//! Shared application state.
//!
//! Built once in `main` and cloned into every handler; all services live
//! behind `Arc`.

use std::sync::Arc;

use crate::cache::TieredCache;
use crate::config::Config;
use crate::rate_limit::ApiRateLimiter;
use crate::upstream::{TokenManager, UpstreamClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<TieredCache>,
    pub upstream: Arc<UpstreamClient>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}

impl AppState {
    /// Wires the token manager, upstream client and rate limiter around `cache`.
    pub fn new(config: Config, cache: Arc<TieredCache>) -> Self {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenManager::new(http.clone(), &config.upstream));
        let upstream = Arc::new(UpstreamClient::new(
            http,
            config.upstream.api_base_url.clone(),
            tokens,
            cache.clone(),
        ));
        let rate_limiter = Arc::new(ApiRateLimiter::new(config.rate_limit));

        Self {
            config: Arc::new(config),
            cache,
            upstream,
            rate_limiter,
        }
    }
}
