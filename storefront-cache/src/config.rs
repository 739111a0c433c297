//! Cache configuration types.

use std::time::Duration;
use storefront_redis::RedisConfig;

/// Environment variable overriding the per-operation timeout, in milliseconds.
pub const OPERATION_TIMEOUT_ENV: &str = "CACHE_OPERATION_TIMEOUT_MS";

/// Default bound on a single cache call.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Cache configuration.
///
/// `redis` is `None` when the backend credentials are absent, which resolves
/// the client to disabled mode.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis backend settings, if configured
    pub redis: Option<RedisConfig>,

    /// Upper bound on any single cache operation
    pub operation_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl CacheConfig {
    /// Configuration with no backend.
    pub fn disabled() -> Self {
        Self {
            redis: None,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Configuration for a Redis backend.
    pub fn redis(config: RedisConfig) -> Self {
        Self {
            redis: Some(config),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Load from process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let operation_timeout = lookup(OPERATION_TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_OPERATION_TIMEOUT);

        Self {
            redis: RedisConfig::from_lookup(&lookup),
            operation_timeout,
        }
    }

    /// Set the operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Whether a backend is configured.
    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }
}
