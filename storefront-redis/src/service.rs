//! Redis service shared by every cache consumer.

use redis::AsyncCommands;
use std::time::Duration;

use crate::{
    RedisConfig, Result,
    pool::{RedisConnection, RedisPool, RedisPoolBuilder},
};

/// Redis service providing the connection pool and the command surface the
/// tenant cache needs (GET, SET EX, multi-key DEL, KEYS, pipelines).
///
/// Constructed once at startup and shared; cloning is cheap.
#[derive(Clone)]
pub struct RedisService {
    config: RedisConfig,
    pool: RedisPool,
}

impl RedisService {
    /// Create a service whose connections are opened on first use.
    pub fn lazy(config: RedisConfig) -> Result<Self> {
        let pool = RedisPoolBuilder::new(config.clone()).build()?;
        Ok(Self { config, pool })
    }

    /// Get the configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Get a connection from the pool.
    pub async fn get(&self) -> Result<RedisConnection<'_>> {
        let conn = self.pool.get().await?;
        Ok(RedisConnection::new(conn))
    }

    /// Check if the connection is healthy.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }

    /// Get a string value.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Set a value with expiration.
    pub async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.get().await?;
        let _: () = conn.set_ex(key, value, expiry_secs(ttl)).await?;
        Ok(())
    }

    /// Delete keys in a single DEL, returning how many existed.
    pub async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get().await?;
        let deleted: u64 = conn.del(keys).await?;
        Ok(deleted)
    }

    /// List keys matching a glob-style pattern.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.get().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    /// Execute a pipeline in one round trip, returning one raw reply per
    /// queued command.
    pub async fn execute_pipeline(&self, pipe: &redis::Pipeline) -> Result<Vec<redis::Value>> {
        let mut conn = self.get().await?;
        let replies: Vec<redis::Value> = pipe.query_async(&mut *conn).await?;
        Ok(replies)
    }
}

/// Seconds for SET EX; Redis rejects a zero expiry.
pub fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
