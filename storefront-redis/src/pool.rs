//! Redis connection pool.

use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::aio::MultiplexedConnection;
use std::ops::{Deref, DerefMut};
use tracing::info;

use crate::{RedisConfig, RedisError, Result};

/// Type alias for the connection pool.
pub type RedisPool = Pool<RedisConnectionManager>;

/// A pooled Redis connection.
pub struct RedisConnection<'a> {
    conn: PooledConnection<'a, RedisConnectionManager>,
}

impl<'a> RedisConnection<'a> {
    /// Create a new connection wrapper.
    pub fn new(conn: PooledConnection<'a, RedisConnectionManager>) -> Self {
        Self { conn }
    }
}

impl<'a> Deref for RedisConnection<'a> {
    type Target = MultiplexedConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<'a> DerefMut for RedisConnection<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

/// Builder for creating Redis connection pools.
pub struct RedisPoolBuilder {
    config: RedisConfig,
}

impl RedisPoolBuilder {
    /// Create a new pool builder.
    pub fn new(config: RedisConfig) -> Self {
        Self { config }
    }

    fn manager(&self) -> Result<RedisConnectionManager> {
        RedisConnectionManager::new(self.config.connection_url())
            .map_err(|e| RedisError::Config(e.to_string()))
    }

    /// Build the pool without opening any connection.
    ///
    /// Connections are established on first use, so an unreachable endpoint
    /// surfaces as per-command errors rather than a startup failure. Only a
    /// malformed endpoint fails here.
    pub fn build(self) -> Result<RedisPool> {
        let manager = self.manager()?;

        let pool = Pool::builder()
            .max_size(self.config.pool_size)
            .min_idle(self.config.min_idle)
            .connection_timeout(self.config.connection_timeout)
            .build_unchecked(manager);

        info!(
            pool_size = self.config.pool_size,
            url = %self.config.redacted_url(),
            "Redis connection pool configured"
        );

        Ok(pool)
    }
}
