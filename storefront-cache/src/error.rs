//! Error types for cache operations.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache backend errors.
///
/// These never reach callers of [`CacheClient`](crate::CacheClient); the
/// client logs them and degrades to a miss / no-op.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis-specific error
    #[error("Redis error: {0}")]
    Redis(#[from] storefront_redis::RedisError),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,

    /// Generic error
    #[error("Cache error: {0}")]
    Other(String),
}
