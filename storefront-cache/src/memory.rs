//! In-process cache store.
//!
//! Mirrors the subset of Redis semantics the tenant cache relies on (string
//! values with expiry, multi-key delete, glob key listing, batched pipelines)
//! so the whole stack can run without a server. Expiry uses
//! [`tokio::time::Instant`], so paused-clock tests can advance past a TTL.

use crate::error::{CacheError, CacheResult};
use crate::traits::{CacheOp, CacheOpResult, CacheStore};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory cache store.
///
/// Cloning shares the underlying map, so a test can keep a handle for
/// inspection while the client owns another.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    data: Arc<RwLock<HashMap<String, CacheEntry>>>,
    pipeline_calls: Arc<AtomicUsize>,
    delete_calls: Arc<parking_lot::Mutex<Vec<Vec<String>>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backend: every operation fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of pipeline batches executed.
    pub fn pipeline_calls(&self) -> usize {
        self.pipeline_calls.load(Ordering::SeqCst)
    }

    /// Key lists passed to each direct delete call, in order.
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls.lock().clone()
    }

    /// Whether a live entry exists for `key`.
    pub async fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.data
            .read()
            .await
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Remaining lifetime of a live entry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.data
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at - now)
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// Whether the cache holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> CacheResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CacheError::Connection("cache backend unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn apply(data: &mut HashMap<String, CacheEntry>, op: CacheOp, now: Instant) -> CacheOpResult {
        match op {
            CacheOp::Get { key } => CacheOpResult::Value(
                data.get(&key)
                    .filter(|entry| entry.is_live(now))
                    .map(|entry| entry.value.clone()),
            ),
            CacheOp::Set { key, value, ttl } => {
                data.insert(
                    key,
                    CacheEntry {
                        value,
                        expires_at: now + ttl,
                    },
                );
                CacheOpResult::Stored
            }
            CacheOp::Delete { keys } => CacheOpResult::Deleted(remove_keys(data, &keys, now)),
        }
    }
}

fn remove_keys(data: &mut HashMap<String, CacheEntry>, keys: &[String], now: Instant) -> u64 {
    keys.iter()
        .filter_map(|key| data.remove(key))
        .filter(|entry| entry.is_live(now))
        .count() as u64
}

/// Translate a Redis-style glob into an anchored regex.
///
/// Supports `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\x` escapes. An unclosed
/// `[` matches itself.
fn glob_to_regex(pattern: &str) -> CacheResult<Regex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                push_literal(&mut source, chars[i]);
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut source, &chars[i + 1..end]);
                    i = end;
                }
                None => push_literal(&mut source, '['),
            },
            other => push_literal(&mut source, other),
        }
        i += 1;
    }
    source.push('$');
    Regex::new(&source).map_err(|e| CacheError::Other(format!("invalid key pattern: {e}")))
}

fn push_literal(source: &mut String, ch: char) {
    source.push_str(&regex::escape(ch.encode_utf8(&mut [0u8; 4])));
}

/// Index of the `]` closing the class opened at `start`.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    let first = i;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ']' if i > first => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn push_class(source: &mut String, body: &[char]) {
    source.push('[');
    let mut rest = body;
    if let [first, tail @ ..] = body
        && *first == '^'
    {
        source.push('^');
        rest = tail;
    }
    let mut i = 0;
    while i < rest.len() {
        let ch = match rest[i] {
            '\\' if i + 1 < rest.len() => {
                i += 1;
                rest[i]
            }
            ch => ch,
        };
        if rest.get(i + 1) == Some(&'-') && i + 2 < rest.len() {
            let hi = rest[i + 2];
            let (lo, hi) = if ch <= hi { (ch, hi) } else { (hi, ch) };
            push_class_char(source, lo);
            source.push('-');
            push_class_char(source, hi);
            i += 3;
        } else {
            push_class_char(source, ch);
            i += 1;
        }
    }
    source.push(']');
}

fn push_class_char(source: &mut String, ch: char) {
    if matches!(ch, '\\' | ']' | '[' | '^' | '-' | '&' | '~') {
        source.push('\\');
    }
    source.push(ch);
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check_available()?;
        let now = Instant::now();
        let data = self.data.read().await;
        Ok(data
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.check_available()?;
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.data.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        self.check_available()?;
        self.delete_calls.lock().push(keys.to_vec());
        let now = Instant::now();
        let mut data = self.data.write().await;
        Ok(remove_keys(&mut data, keys, now))
    }

    async fn keys_matching(&self, pattern: &str) -> CacheResult<Vec<String>> {
        self.check_available()?;
        let matcher = glob_to_regex(pattern)?;
        let now = Instant::now();
        let data = self.data.read().await;
        let mut keys: Vec<String> = data
            .iter()
            .filter(|(key, entry)| entry.is_live(now) && matcher.is_match(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> CacheResult<()> {
        self.check_available()
    }

    async fn pipeline(&self, ops: Vec<CacheOp>) -> CacheResult<Vec<CacheOpResult>> {
        self.check_available()?;
        self.pipeline_calls.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        let mut data = self.data.write().await;
        Ok(ops
            .into_iter()
            .map(|op| Self::apply(&mut data, op, now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new();
        cache.set("tenant:acme", "{}".into(), TTL).await.unwrap();

        assert_eq!(cache.get("tenant:acme").await.unwrap(), Some("{}".into()));

        let deleted = cache
            .delete(&["tenant:acme".into(), "tenant:missing".into()])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(cache.get("tenant:acme").await.unwrap(), None);
        assert_eq!(cache.delete_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = InMemoryCache::new();
        cache.set("tenant:acme", "{}".into(), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.contains_key("tenant:acme").await);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("tenant:acme").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_keys_matching_glob() {
        let cache = InMemoryCache::new();
        for key in ["tenant:acme", "tenant:acme-eu", "tenant:shop.acme.com", "session:1"] {
            cache.set(key, "x".into(), TTL).await.unwrap();
        }

        let all = cache.keys_matching("tenant:*").await.unwrap();
        assert_eq!(all.len(), 3);

        let prefixed = cache.keys_matching("tenant:acme*").await.unwrap();
        assert_eq!(prefixed, vec!["tenant:acme", "tenant:acme-eu"]);

        // regex metacharacters are literal
        let dotted = cache.keys_matching("tenant:shop.acme.com").await.unwrap();
        assert_eq!(dotted, vec!["tenant:shop.acme.com"]);
        assert!(cache.keys_matching("tenant:shopxacme.com").await.unwrap().is_empty());

        let single = cache.keys_matching("session:?").await.unwrap();
        assert_eq!(single, vec!["session:1"]);
    }

    #[tokio::test]
    async fn test_keys_matching_classes_and_escapes() {
        let cache = InMemoryCache::new();
        for key in ["tenant:acme-eu", "tenant:acme-us", "tenant:acme-ap", "tenant:a*", "tenant:ab"] {
            cache.set(key, "x".into(), TTL).await.unwrap();
        }

        let regional = cache.keys_matching("tenant:acme-[eu]*").await.unwrap();
        assert_eq!(regional, vec!["tenant:acme-eu", "tenant:acme-us"]);

        let negated = cache.keys_matching("tenant:acme-[^eu]*").await.unwrap();
        assert_eq!(negated, vec!["tenant:acme-ap"]);

        let ranged = cache.keys_matching("tenant:acme-[a-f]?").await.unwrap();
        assert_eq!(ranged, vec!["tenant:acme-ap", "tenant:acme-eu"]);

        let escaped = cache.keys_matching("tenant:a\\*").await.unwrap();
        assert_eq!(escaped, vec!["tenant:a*"]);

        // unclosed bracket is literal
        assert!(cache.keys_matching("tenant:[acme").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_is_one_batch() {
        let cache = InMemoryCache::new();
        let results = cache
            .pipeline(vec![
                CacheOp::set("a", "1", TTL),
                CacheOp::set("b", "2", TTL),
                CacheOp::get("a"),
                CacheOp::delete(vec!["b".into()]),
            ])
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                CacheOpResult::Stored,
                CacheOpResult::Stored,
                CacheOpResult::Value(Some("1".into())),
                CacheOpResult::Deleted(1),
            ]
        );
        assert_eq!(cache.pipeline_calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_fails_every_operation() {
        let cache = InMemoryCache::new();
        cache.set_unavailable(true);

        assert!(cache.get("k").await.is_err());
        assert!(cache.set("k", "v".into(), TTL).await.is_err());
        assert!(cache.delete(&["k".into()]).await.is_err());
        assert!(cache.keys_matching("*").await.is_err());
        assert!(cache.pipeline(vec![CacheOp::get("k")]).await.is_err());
        assert!(cache.ping().await.is_err());

        cache.set_unavailable(false);
        assert!(cache.ping().await.is_ok());
    }
}
