//! Redis cache implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use agendakit_core::cache::{glob_escape, Cache, CacheError, Result};

use super::error::map_redis_error;

/// Upper bound on a single connection attempt, retries included.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis cache backend using a connection manager.
///
/// The connection is established on first use and retried on every later
/// command until it succeeds. Once up, the manager reconnects on its own after
/// a dropped connection; commands issued while it is down fail with
/// `CacheError::ConnectionFailed`.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    conn: Arc<OnceCell<ConnectionManager>>,
}

impl RedisCache {
    /// Creates a handle without connecting.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `CacheError::OperationFailed` if `url` is not a valid Redis URL.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        Ok(Self {
            client,
            conn: Arc::new(OnceCell::new()),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.conn
            .get_or_try_init(|| connect(self.client.clone()))
            .await
            .cloned()
    }
}

async fn connect(client: redis::Client) -> Result<ConnectionManager> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(CONNECT_TIMEOUT)
        .set_response_timeout(RESPONSE_TIMEOUT);

    match tokio::time::timeout(
        CONNECT_TIMEOUT,
        ConnectionManager::new_with_config(client, config),
    )
    .await
    {
        Ok(result) => result.map_err(|err| CacheError::ConnectionFailed(err.to_string())),
        Err(_) => Err(CacheError::ConnectionFailed(format!(
            "timed out after {}s connecting to Redis",
            CONNECT_TIMEOUT.as_secs()
        ))),
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let result: Option<Vec<u8>> = conn.get(key).await.map_err(map_redis_error)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;

        match ttl {
            Some(duration) => {
                let seconds = duration.as_secs().max(1);
                conn.set_ex::<_, _, ()>(key, value, seconds)
                    .await
                    .map_err(map_redis_error)?;
            }
            None => {
                conn.set::<_, _, ()>(key, value)
                    .await
                    .map_err(map_redis_error)?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", glob_escape(prefix));

        let keys: Vec<String> = conn.keys(&pattern).await.map_err(map_redis_error)?;
        if !keys.is_empty() {
            conn.del::<_, ()>(&keys).await.map_err(map_redis_error)?;
        }

        tracing::debug!(prefix, deleted = keys.len(), "Deleted Redis keys by prefix");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}
