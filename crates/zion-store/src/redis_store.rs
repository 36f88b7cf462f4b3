//! Production `CoordinationStore` backed by Redis.

use crate::config::RedisConfig;
use crate::error::{Result, StoreError};
use crate::store::CoordinationStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

/// `CoordinationStore` implementation talking to a real Redis instance.
///
/// Wraps a `ConnectionManager`, which reconnects and retries transparently
/// under the hood, so callers never see a stale connection error as long as
/// the server eventually comes back.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the coordination store described by `config`.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        debug!(url = %config.url, "connecting to coordination store");
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = tokio::time::timeout(
            std::time::Duration::from_secs(config.connect_timeout_secs),
            client.get_connection_manager(),
        )
        .await
        .map_err(|_| StoreError::Unavailable("timed out connecting to redis".to_string()))??;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CoordinationStore for RedisStore {
    async fn lpop(&self, queue: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.lpop(queue, None).await?;
        Ok(value)
    }

    async fn rpush(&self, queue: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.rpush(queue, value).await?;
        Ok(())
    }

    async fn zadd(&self, set: &str, member: &str, score: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.zadd(set, member, score).await?;
        Ok(())
    }

    async fn zrem(&self, set: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.zrem(set, member).await?;
        Ok(())
    }

    async fn zrange(&self, set: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.zrange(set, 0, -1).await?;
        Ok(members)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }
}
