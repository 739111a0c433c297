//! Fail-open caching for the storefront tenant layer.
//!
//! Provides a backend trait with Redis and in-memory implementations, and the
//! [`CacheClient`] handle that hides backend failures from callers.
//!
//! # Features
//!
//! - **Resolved once** - the client is `Enabled` or `Disabled` from startup
//!   configuration; a missing endpoint or token disables caching silently
//! - **Fail-open** - backend errors and timeouts are logged and read as a miss
//! - **Tri-state reads** - [`CacheLookup`] distinguishes a miss from an
//!   unreachable cache
//! - **Pipelines** - batched writes in one round trip
//!
//! # Examples
//!
//! ```no_run
//! use storefront_cache::*;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let cache = CacheClient::from_env();
//!
//! cache.set("tenant:acme", "{}".to_string(), Duration::from_secs(300)).await;
//!
//! match cache.lookup("tenant:acme").await {
//!     CacheLookup::Hit(json) => println!("cached: {json}"),
//!     CacheLookup::Miss => println!("not cached"),
//!     CacheLookup::Unavailable => println!("cache disabled or unreachable"),
//! }
//! # }
//! ```
//!
//! ## In-memory backend
//!
//! ```
//! use storefront_cache::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cache = CacheClient::enabled(Arc::new(InMemoryCache::new()));
//! assert!(cache.is_enabled());
//!
//! tokio_test::block_on(async {
//!     assert!(cache.set("tenant:acme", "{}".to_string(), Duration::from_secs(300)).await);
//!     assert!(cache.lookup("tenant:acme").await.is_hit());
//!     assert_eq!(cache.lookup("tenant:globex").await, CacheLookup::Miss);
//! });
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod redis_cache;
pub mod traits;

pub use client::{CacheClient, CacheLookup, CacheMode, CacheStats, CacheStatsSnapshot};
pub use config::{CacheConfig, DEFAULT_OPERATION_TIMEOUT, OPERATION_TIMEOUT_ENV};
pub use error::{CacheError, CacheResult};
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;
pub use traits::{CacheOp, CacheOpResult, CacheStore};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::client::{CacheClient, CacheLookup};
    pub use crate::config::CacheConfig;
    pub use crate::error::{CacheError, CacheResult};
    pub use crate::traits::{CacheOp, CacheOpResult, CacheStore};
}
