//! # Storefront Redis
//!
//! Redis client plumbing for the storefront tenant cache.
//!
//! ## Features
//!
//! - **Endpoint + token configuration**: the backend exists only when both
//!   `REDIS_URL` and `REDIS_TOKEN` are present
//! - **Connection Pooling**: bb8 pool that connects on first use
//! - **Pipelines**: batched command execution in one round trip
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use storefront_redis::{RedisConfig, RedisService};
//! use std::time::Duration;
//!
//! let Some(config) = RedisConfig::from_env() else {
//!     // caching disabled
//!     return Ok(());
//! };
//!
//! let redis = RedisService::lazy(config)?;
//! redis.set_ex("tenant:acme", "{}", Duration::from_secs(300)).await?;
//! ```

mod config;
mod error;
mod pool;
mod service;

pub use config::{ENDPOINT_ENV, RedisConfig, RedisConfigBuilder, TOKEN_ENV};
pub use error::{RedisError, Result};
pub use pool::{RedisConnection, RedisPool, RedisPoolBuilder};
pub use service::{RedisService, expiry_secs};

// Re-export redis crate for convenience
pub use redis;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::config::{RedisConfig, RedisConfigBuilder};
    pub use crate::error::{RedisError, Result};
    pub use crate::service::RedisService;
}
