//! HTTP client for the upstream events API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{header::CONTENT_TYPE, Method};
use serde_json::Value;

use agendakit_core::cache::resource_key;
use agendakit_core::resources::{
    error_message, event_path, extract_list, sessions_path, speakers_path, UPSTREAM_NAMESPACE,
};

use super::error::{Result, UpstreamError};
use super::token::TokenManager;
use crate::cache::{CacheStats, TieredCache};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Authenticated, cache-aside client for the upstream API.
///
/// GET responses are cached under the request path; other methods always go
/// to the network.
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenManager>,
    cache: Arc<TieredCache>,
}

impl UpstreamClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<TokenManager>,
        cache: Arc<TieredCache>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
            cache,
        }
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Calls `path` on the upstream API.
    ///
    /// A cached GET response is returned without obtaining a token or touching
    /// the network.
    pub async fn request(&self, path: &str, method: Method, body: Option<&Value>) -> Result<Value> {
        let cacheable = method == Method::GET;
        let cache_key = resource_key(path);

        if cacheable {
            match self.cache.get::<Value>(UPSTREAM_NAMESPACE, &cache_key).await {
                Some(Value::Null) => {
                    tracing::debug!(endpoint = path, "Dropping empty cached upstream response");
                    self.cache.delete(UPSTREAM_NAMESPACE, &cache_key).await;
                }
                Some(cached) => {
                    tracing::debug!(endpoint = path, "Serving upstream response from cache");
                    return Ok(cached);
                }
                None => {}
            }
        }

        let started = Instant::now();
        let result = self.send(path, method.clone(), body).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(
                endpoint = path,
                method = %method,
                duration_ms,
                success = true,
                "Upstream API request"
            ),
            Err(err) => tracing::error!(
                endpoint = path,
                method = %method,
                duration_ms,
                success = false,
                status = err.status_code(),
                error = %err,
                "Upstream API request failed"
            ),
        }

        let value = result?;
        // Empty bodies are not worth a cache entry.
        if cacheable && !value.is_null() {
            self.cache
                .set(UPSTREAM_NAMESPACE, &cache_key, &value, None)
                .await;
        }
        Ok(value)
    }

    async fn send(&self, path: &str, method: Method, body: Option<&Value>) -> Result<Value> {
        let credential = self.tokens.get_token().await?;

        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(&credential.access_token)
            .header(CONTENT_TYPE, "application/json")
            .timeout(REQUEST_TIMEOUT);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
    }

    /// Sessions of an event; `[]` when the upstream envelope has none.
    pub async fn get_event_sessions(&self, event_id: &str) -> Result<Vec<Value>> {
        let envelope = self
            .request(&sessions_path(event_id), Method::GET, None)
            .await?;
        Ok(extract_list(envelope, "sessions"))
    }

    /// Event detail object, passed through unchanged.
    pub async fn get_event_details(&self, event_id: &str) -> Result<Value> {
        self.request(&event_path(event_id), Method::GET, None).await
    }

    /// Speakers of an event; `[]` when the upstream envelope has none.
    pub async fn get_event_speakers(&self, event_id: &str) -> Result<Vec<Value>> {
        let envelope = self
            .request(&speakers_path(event_id), Method::GET, None)
            .await?;
        Ok(extract_list(envelope, "speakers"))
    }

    /// Drops every cached upstream response.
    #[allow(dead_code)]
    pub async fn clear_cache(&self) {
        self.cache.clear(Some(UPSTREAM_NAMESPACE)).await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
