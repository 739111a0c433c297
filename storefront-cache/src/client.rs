//! Fail-open cache client.
//!
//! [`CacheClient`] is the only cache handle the tenant layer sees. It is
//! resolved once from [`CacheConfig`] into [`CacheMode::Enabled`] or
//! [`CacheMode::Disabled`]; after that no call ever returns an error. Backend
//! failures and timeouts are logged and degrade to absent / zero / failed
//! values so the caller falls through to the source of truth.

use crate::config::{CacheConfig, DEFAULT_OPERATION_TIMEOUT};
use crate::error::{CacheError, CacheResult};
use crate::redis_cache::RedisCache;
use crate::traits::{CacheOp, CacheOpResult, CacheStore};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// How the client was resolved at startup.
#[derive(Clone)]
pub enum CacheMode {
    /// A backend is configured.
    Enabled(Arc<dyn CacheStore>),
    /// No backend; every operation is a no-op.
    Disabled,
}

impl std::fmt::Debug for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled(_) => f.write_str("Enabled"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// The key was present.
    Hit(T),
    /// The backend answered and the key was absent.
    Miss,
    /// The cache is disabled or the backend failed.
    Unavailable,
}

impl<T> CacheLookup<T> {
    /// Collapse to an option; `Miss` and `Unavailable` both become `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss | Self::Unavailable => None,
        }
    }

    /// Whether this is a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Whether the cache could not be consulted.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Map the hit value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheLookup<U> {
        match self {
            Self::Hit(value) => CacheLookup::Hit(f(value)),
            Self::Miss => CacheLookup::Miss,
            Self::Unavailable => CacheLookup::Unavailable,
        }
    }
}

/// Hit / miss / error counters shared by every clone of a client.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl CacheStats {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counters.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    /// Reads that found a value
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Backend failures and timeouts
    pub errors: u64,
}

impl CacheStatsSnapshot {
    /// Fraction of answered reads that were hits.
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            0.0
        } else {
            self.hits as f64 / reads as f64
        }
    }
}

/// Shared, fail-open cache handle.
#[derive(Clone, Debug)]
pub struct CacheClient {
    mode: CacheMode,
    operation_timeout: Duration,
    stats: Arc<CacheStats>,
}

impl CacheClient {
    /// A client with caching turned off.
    pub fn disabled() -> Self {
        Self {
            mode: CacheMode::Disabled,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            stats: Arc::new(CacheStats::default()),
        }
    }

    /// A client over the given backend.
    pub fn enabled(store: Arc<dyn CacheStore>) -> Self {
        Self {
            mode: CacheMode::Enabled(store),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            stats: Arc::new(CacheStats::default()),
        }
    }

    /// Set the per-operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Resolve the client from configuration.
    ///
    /// Missing credentials and a malformed endpoint both yield a disabled
    /// client; neither aborts startup.
    pub fn from_config(config: &CacheConfig) -> Self {
        let client = match &config.redis {
            None => {
                warn!("REDIS_URL or REDIS_TOKEN not set, tenant caching disabled");
                Self::disabled()
            }
            Some(redis) => match RedisCache::from_config(redis.clone()) {
                Ok(store) => {
                    debug!(endpoint = %redis.redacted_url(), "Tenant cache enabled");
                    Self::enabled(Arc::new(store))
                }
                Err(e) => {
                    warn!(error = %e, "Invalid cache configuration, tenant caching disabled");
                    Self::disabled()
                }
            },
        };
        client.with_operation_timeout(config.operation_timeout)
    }

    /// Resolve the client from process environment.
    pub fn from_env() -> Self {
        Self::from_config(&CacheConfig::from_env())
    }

    /// The resolved mode.
    pub fn mode(&self) -> &CacheMode {
        &self.mode
    }

    /// Whether a backend is configured.
    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, CacheMode::Enabled(_))
    }

    /// The per-operation timeout.
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    async fn call<T, F>(&self, operation: &'static str, key: &str, fut: F) -> Option<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        let outcome = match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout),
        };
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                self.stats.error();
                warn!(operation, key, error = %e, "Cache operation failed");
                None
            }
        }
    }

    /// Tri-state read.
    pub async fn lookup(&self, key: &str) -> CacheLookup<String> {
        let CacheMode::Enabled(store) = &self.mode else {
            return CacheLookup::Unavailable;
        };
        match self.call("get", key, store.get(key)).await {
            Some(Some(value)) => {
                self.stats.hit();
                CacheLookup::Hit(value)
            }
            Some(None) => {
                self.stats.miss();
                CacheLookup::Miss
            }
            None => CacheLookup::Unavailable,
        }
    }

    /// Read a value; any failure reads as absent.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).await.into_option()
    }

    /// Write a value with a TTL. `false` only when an enabled backend failed.
    pub async fn set(&self, key: &str, value: String, ttl: Duration) -> bool {
        match &self.mode {
            CacheMode::Disabled => true,
            CacheMode::Enabled(store) => {
                self.call("set", key, store.set(key, value, ttl)).await.is_some()
            }
        }
    }

    /// Delete keys in one call, returning how many existed.
    pub async fn delete(&self, keys: &[String]) -> u64 {
        let CacheMode::Enabled(store) = &self.mode else {
            return 0;
        };
        if keys.is_empty() {
            return 0;
        }
        self.call("delete", &delete_label(keys), store.delete(keys))
            .await
            .unwrap_or(0)
    }

    /// List keys matching a glob pattern.
    pub async fn keys_matching(&self, pattern: &str) -> Vec<String> {
        let CacheMode::Enabled(store) = &self.mode else {
            return Vec::new();
        };
        self.call("keys", pattern, store.keys_matching(pattern))
            .await
            .unwrap_or_default()
    }

    /// Submit a batch, one result per op in order.
    pub async fn pipeline(&self, ops: Vec<CacheOp>) -> Vec<CacheOpResult> {
        let CacheMode::Enabled(store) = &self.mode else {
            return ops.iter().map(CacheOp::noop_result).collect();
        };
        if ops.is_empty() {
            return Vec::new();
        }
        let count = ops.len();
        let label = format!("{count} ops");
        match self.call("pipeline", &label, store.pipeline(ops)).await {
            Some(results) if results.len() == count => results,
            Some(results) => {
                self.stats.error();
                warn!(
                    expected = count,
                    received = results.len(),
                    "Pipeline reply count mismatch"
                );
                vec![CacheOpResult::Failed; count]
            }
            None => vec![CacheOpResult::Failed; count],
        }
    }

    /// PING the backend. Disabled clients report healthy.
    pub async fn health_check(&self) -> bool {
        match &self.mode {
            CacheMode::Disabled => true,
            CacheMode::Enabled(store) => self.call("ping", "", store.ping()).await.is_some(),
        }
    }
}

/// Log label for a multi-key delete: the first key and how many follow.
fn delete_label(keys: &[String]) -> String {
    match keys {
        [] => String::new(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}
