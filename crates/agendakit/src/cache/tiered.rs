//! Two-tier cache: Redis first, bounded in-process store as fallback.
//!
//! The store is in one of two states. While `Connected`, every operation goes
//! to the external backend first. The first external error moves it to
//! `Degraded`, and from then on only the in-process store is used until
//! [`TieredCache::mark_reconnected`] is called. Callers never see a cache
//! error: a failed read is a miss and a failed write is logged and dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use agendakit_core::cache::{namespace_prefix, namespaced_key, product_prefix, Cache, CacheError};

use super::MemoryCache;
use crate::config::CacheConfig;

/// Whether the external backend is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Connected,
    Degraded,
}

/// External backend status as reported by [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedisStatus {
    Connected,
    Disconnected,
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedisStats {
    pub enabled: bool,
    pub status: RedisStatus,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub size: usize,
    pub max_size: usize,
    pub keys: Vec<String>,
}

/// TTLs in seconds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtlStats {
    pub memory_ttl: u64,
    pub redis_ttl: u64,
}

/// Snapshot of both tiers.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub redis: RedisStats,
    pub memory: MemoryStats,
    pub config: TtlStats,
}

/// Cache store shared by every request handler.
pub struct TieredCache {
    external: Option<Arc<dyn Cache>>,
    memory: MemoryCache,
    connected: AtomicBool,
    config: CacheConfig,
}

impl TieredCache {
    /// Creates the store. Starts `Connected` when `external` is present,
    /// `Degraded` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::OperationFailed` if `config.max_entries` is 0.
    pub fn new(external: Option<Arc<dyn Cache>>, config: CacheConfig) -> Result<Self, CacheError> {
        let memory = MemoryCache::new(config.max_entries)?;
        let connected = AtomicBool::new(external.is_some());
        Ok(Self {
            external,
            memory,
            connected,
            config,
        })
    }

    pub fn backend_state(&self) -> BackendState {
        if self.connected.load(Ordering::Acquire) {
            BackendState::Connected
        } else {
            BackendState::Degraded
        }
    }

    /// Resumes using the external backend after it has come back.
    ///
    /// Has no effect when no external backend was configured.
    pub fn mark_reconnected(&self) {
        if self.external.is_some() && !self.connected.swap(true, Ordering::AcqRel) {
            tracing::info!("External cache reconnected");
        }
    }

    /// Stops using the external backend after a failure seen outside a cache
    /// operation, such as the startup liveness check.
    pub fn mark_degraded(&self, err: &CacheError) {
        self.degrade("connect", err);
    }

    /// Spawns a task that pings the external backend every `interval` while
    /// `Degraded` and calls [`mark_reconnected`](Self::mark_reconnected) once
    /// it answers.
    pub fn spawn_reconnect_monitor(self: &Arc<Self>, interval: Duration) {
        let Some(external) = self.external.clone() else {
            return;
        };
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.tick().await;
            loop {
                tick.tick().await;
                if cache.backend_state() == BackendState::Connected {
                    continue;
                }
                match external.ping().await {
                    Ok(()) => cache.mark_reconnected(),
                    Err(err) => tracing::debug!(error = %err, "External cache still unavailable"),
                }
            }
        });
    }

    /// External backend, only while `Connected`.
    fn active_external(&self) -> Option<&Arc<dyn Cache>> {
        self.external
            .as_ref()
            .filter(|_| self.connected.load(Ordering::Acquire))
    }

    fn degrade(&self, operation: &str, err: &CacheError) {
        if self.connected.swap(false, Ordering::AcqRel) {
            tracing::warn!(
                operation,
                error = %err,
                "External cache failed, falling back to memory cache"
            );
        }
    }

    /// Reads and decodes a value. Any failure is reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let full_key = namespaced_key(namespace, key);

        if let Some(external) = self.active_external() {
            match external.get(&full_key).await {
                Ok(Some(bytes)) => {
                    if let Some(value) = decode(&full_key, &bytes) {
                        tracing::debug!(key = %full_key, "Cache hit (redis)");
                        return Some(value);
                    }
                }
                Ok(None) => {}
                Err(err) => self.degrade("get", &err),
            }
        }

        match self.memory.get(&full_key).await {
            Ok(Some(bytes)) => {
                let value = decode(&full_key, &bytes);
                if value.is_some() {
                    tracing::debug!(key = %full_key, "Cache hit (memory)");
                }
                value
            }
            Ok(None) => {
                tracing::debug!(key = %full_key, "Cache miss");
                None
            }
            Err(err) => {
                tracing::warn!(key = %full_key, error = %err, "Memory cache read failed");
                None
            }
        }
    }

    /// Encodes and stores a value. `ttl` overrides the tier's default TTL.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) {
        let full_key = namespaced_key(namespace, key);
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(key = %full_key, error = %err, "Failed to serialize cache value");
                return;
            }
        };

        if let Some(external) = self.active_external() {
            let redis_ttl = ttl.unwrap_or(self.config.redis_ttl);
            match external.set(&full_key, &bytes, Some(redis_ttl)).await {
                Ok(()) => {
                    tracing::debug!(key = %full_key, ttl_secs = redis_ttl.as_secs(), "Cached in redis");
                    return;
                }
                Err(err) => self.degrade("set", &err),
            }
        }

        let memory_ttl = ttl.unwrap_or(self.config.memory_ttl);
        match self.memory.set(&full_key, &bytes, Some(memory_ttl)).await {
            Ok(()) => {
                tracing::debug!(key = %full_key, ttl_secs = memory_ttl.as_secs(), "Cached in memory")
            }
            Err(err) => tracing::warn!(key = %full_key, error = %err, "Memory cache write failed"),
        }
    }

    /// Removes a key from both tiers.
    pub async fn delete(&self, namespace: &str, key: &str) {
        let full_key = namespaced_key(namespace, key);

        if let Some(external) = self.active_external() {
            if let Err(err) = external.delete(&full_key).await {
                self.degrade("delete", &err);
            }
        }

        if let Err(err) = self.memory.delete(&full_key).await {
            tracing::warn!(key = %full_key, error = %err, "Memory cache delete failed");
        }
    }

    /// Clears one namespace, or every key this service owns when `namespace` is `None`.
    pub async fn clear(&self, namespace: Option<&str>) {
        let prefix = match namespace {
            Some(namespace) => namespace_prefix(namespace),
            None => product_prefix(),
        };

        if let Some(external) = self.active_external() {
            if let Err(err) = external.delete_prefix(&prefix).await {
                self.degrade("clear", &err);
            }
        }

        if let Err(err) = self.memory.delete_prefix(&prefix).await {
            tracing::warn!(prefix = %prefix, error = %err, "Memory cache clear failed");
        }

        tracing::info!(prefix = %prefix, "Cache cleared");
    }

    /// Snapshot of both tiers without touching the external backend.
    pub async fn stats(&self) -> CacheStats {
        let status = match self.backend_state() {
            BackendState::Connected => RedisStatus::Connected,
            BackendState::Degraded => RedisStatus::Disconnected,
        };

        CacheStats {
            redis: RedisStats {
                enabled: self.config.redis_enabled,
                status,
                url: self.config.redis_url_redacted(),
                error: None,
            },
            memory: MemoryStats {
                size: self.memory.len().await,
                max_size: self.memory.capacity().await,
                keys: self.memory.keys().await,
            },
            config: TtlStats {
                memory_ttl: self.config.memory_ttl.as_secs(),
                redis_ttl: self.config.redis_ttl.as_secs(),
            },
        }
    }

    /// Like [`stats`](Self::stats), with a live ping of the external backend.
    ///
    /// The result of the ping does not change the backend state.
    pub async fn health_check(&self) -> CacheStats {
        let mut stats = self.stats().await;

        if !self.config.redis_enabled {
            return stats;
        }

        let ping = match self.external.as_ref() {
            Some(external) => external.ping().await,
            None => Err(CacheError::ConnectionFailed(
                "Redis client could not be created".to_string(),
            )),
        };
        match ping {
            Ok(()) => stats.redis.status = RedisStatus::Healthy,
            Err(err) => {
                stats.redis.status = RedisStatus::Unhealthy;
                stats.redis.error = Some(err.to_string());
            }
        }

        stats
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "Discarding undecodable cache entry");
            None
        }
    }
}
