//! Redis cache implementation.

use crate::error::CacheResult;
use crate::traits::{CacheOp, CacheOpResult, CacheStore};
use async_trait::async_trait;
use std::time::Duration;
use storefront_redis::redis::{self, Value};
use storefront_redis::{RedisConfig, RedisService, expiry_secs};

/// Redis cache store.
#[derive(Clone)]
pub struct RedisCache {
    service: RedisService,
}

impl RedisCache {
    /// Wrap an existing Redis service.
    pub fn new(service: RedisService) -> Self {
        Self { service }
    }

    /// Build a lazily-connected store from configuration.
    ///
    /// Fails only for a malformed endpoint; an unreachable server is reported
    /// per operation.
    pub fn from_config(config: RedisConfig) -> CacheResult<Self> {
        Ok(Self::new(RedisService::lazy(config)?))
    }

    /// Get the underlying service.
    pub fn service(&self) -> &RedisService {
        &self.service
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.service.get_value(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        Ok(self.service.set_ex(key, &value, ttl).await?)
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        Ok(self.service.delete(keys).await?)
    }

    async fn keys_matching(&self, pattern: &str) -> CacheResult<Vec<String>> {
        Ok(self.service.keys(pattern).await?)
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(self.service.health_check().await?)
    }

    async fn pipeline(&self, ops: Vec<CacheOp>) -> CacheResult<Vec<CacheOpResult>> {
        let mut pipe = redis::pipe();
        let mut queued = 0usize;

        for op in &ops {
            match op {
                CacheOp::Get { key } => {
                    pipe.get(key);
                    queued += 1;
                }
                CacheOp::Set { key, value, ttl } => {
                    pipe.set_ex(key, value, expiry_secs(*ttl));
                    queued += 1;
                }
                // DEL with no arguments is a protocol error
                CacheOp::Delete { keys } if keys.is_empty() => {}
                CacheOp::Delete { keys } => {
                    pipe.del(keys);
                    queued += 1;
                }
            }
        }

        if queued == 0 {
            return Ok(ops.iter().map(CacheOp::noop_result).collect());
        }

        let mut replies = self.service.execute_pipeline(&pipe).await?.into_iter();

        let results = ops
            .iter()
            .map(|op| match op {
                CacheOp::Delete { keys } if keys.is_empty() => CacheOpResult::Deleted(0),
                _ => match replies.next() {
                    Some(reply) => decode_reply(op, reply),
                    None => CacheOpResult::Failed,
                },
            })
            .collect();

        Ok(results)
    }
}

fn decode_reply(op: &CacheOp, reply: Value) -> CacheOpResult {
    match (op, reply) {
        (CacheOp::Get { .. }, Value::Nil) => CacheOpResult::Value(None),
        (CacheOp::Get { .. }, Value::BulkString(bytes)) => match String::from_utf8(bytes) {
            Ok(s) => CacheOpResult::Value(Some(s)),
            Err(_) => CacheOpResult::Failed,
        },
        (CacheOp::Get { .. }, Value::SimpleString(s)) => CacheOpResult::Value(Some(s)),
        (CacheOp::Set { .. }, Value::Okay) | (CacheOp::Set { .. }, Value::SimpleString(_)) => {
            CacheOpResult::Stored
        }
        (CacheOp::Delete { .. }, Value::Int(n)) => CacheOpResult::Deleted(n.max(0) as u64),
        _ => CacheOpResult::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_get_replies() {
        let op = CacheOp::get("tenant:acme");
        assert_eq!(decode_reply(&op, Value::Nil), CacheOpResult::Value(None));
        assert_eq!(
            decode_reply(&op, Value::BulkString(b"{}".to_vec())),
            CacheOpResult::Value(Some("{}".to_string()))
        );
        assert_eq!(decode_reply(&op, Value::Int(3)), CacheOpResult::Failed);
    }

    #[test]
    fn test_decode_set_and_delete_replies() {
        let set = CacheOp::set("tenant:acme", "{}", Duration::from_secs(300));
        assert_eq!(decode_reply(&set, Value::Okay), CacheOpResult::Stored);

        let del = CacheOp::delete(vec!["tenant:acme".into(), "tenant:shop.acme.com".into()]);
        assert_eq!(decode_reply(&del, Value::Int(2)), CacheOpResult::Deleted(2));
        assert_eq!(decode_reply(&del, Value::Nil), CacheOpResult::Failed);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_pipeline_against_redis() {
        let config = RedisConfig::builder().url("redis://localhost:6379").build();
        let cache = RedisCache::from_config(config).unwrap();

        let results = cache
            .pipeline(vec![
                CacheOp::set("pipeline:a", "1", Duration::from_secs(30)),
                CacheOp::get("pipeline:a"),
                CacheOp::delete(vec![]),
                CacheOp::delete(vec!["pipeline:a".into()]),
            ])
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                CacheOpResult::Stored,
                CacheOpResult::Value(Some("1".to_string())),
                CacheOpResult::Deleted(0),
                CacheOpResult::Deleted(1),
            ]
        );
    }
}
