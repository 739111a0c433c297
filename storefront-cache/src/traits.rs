//! Cache store trait and pipeline operation types.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// One command queued in a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    /// Read a key.
    Get {
        /// The cache key
        key: String,
    },
    /// Write a key with an expiry.
    Set {
        /// The cache key
        key: String,
        /// Serialized value
        value: String,
        /// Time-to-live
        ttl: Duration,
    },
    /// Delete keys in one command.
    Delete {
        /// Keys to delete
        keys: Vec<String>,
    },
}

impl CacheOp {
    /// Queue a read.
    pub fn get(key: impl Into<String>) -> Self {
        Self::Get { key: key.into() }
    }

    /// Queue a write.
    pub fn set(key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl,
        }
    }

    /// Queue a delete.
    pub fn delete(keys: Vec<String>) -> Self {
        Self::Delete { keys }
    }

    /// The result this op reports when caching is disabled.
    pub fn noop_result(&self) -> CacheOpResult {
        match self {
            Self::Get { .. } => CacheOpResult::Value(None),
            Self::Set { .. } => CacheOpResult::Stored,
            Self::Delete { .. } => CacheOpResult::Deleted(0),
        }
    }
}

/// Reply for one pipelined op, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOpResult {
    /// Reply to [`CacheOp::Get`].
    Value(Option<String>),
    /// Reply to [`CacheOp::Set`].
    Stored,
    /// Reply to [`CacheOp::Delete`].
    Deleted(u64),
    /// The op (or the whole batch) failed.
    Failed,
}

impl CacheOpResult {
    /// Whether the op succeeded.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Cache backend contract.
///
/// Backends report failures through [`CacheResult`]; the fail-open policy
/// lives in [`CacheClient`](crate::CacheClient), not here.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value.
    ///
    /// Returns `Ok(Some(value))` if the key exists, `Ok(None)` if not found.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value with a time-to-live.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Delete keys in a single call, returning how many existed.
    async fn delete(&self, keys: &[String]) -> CacheResult<u64>;

    /// List keys matching a Redis glob pattern: `*`, `?`, `[abc]`, `[^abc]`,
    /// `[a-z]` and `\x` to match `x` literally.
    async fn keys_matching(&self, pattern: &str) -> CacheResult<Vec<String>>;

    /// Check backend reachability.
    async fn ping(&self) -> CacheResult<()>;

    /// Execute ops as one batch, one result per op in order.
    ///
    /// The default runs the ops one by one; network backends override this
    /// with a real single-round-trip pipeline.
    async fn pipeline(&self, ops: Vec<CacheOp>) -> CacheResult<Vec<CacheOpResult>> {
        let mut results = Vec::with_capacity(ops.len());
        for op in ops {
            let result = match op {
                CacheOp::Get { key } => CacheOpResult::Value(self.get(&key).await?),
                CacheOp::Set { key, value, ttl } => {
                    self.set(&key, value, ttl).await?;
                    CacheOpResult::Stored
                }
                CacheOp::Delete { keys } => CacheOpResult::Deleted(self.delete(&keys).await?),
            };
            results.push(result);
        }
        Ok(results)
    }
}
