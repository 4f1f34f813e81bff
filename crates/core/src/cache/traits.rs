use std::time::Duration;

use async_trait::async_trait;

use super::Result;

/// A byte-oriented cache backend.
///
/// Implemented by the in-process memory store and the Redis store. Keys are
/// already fully namespaced by the caller (see [`super::namespaced_key`]).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache with an optional TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes a value from the cache by key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes every key that starts with `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<()>;
}
