// Storefront - tenant resolution and cache invalidation for multi-tenant storefronts
//
// This library resolves a request's hostname to a tenant through a fail-open
// cache and keeps that cache coherent across tenant mutations.

// Re-export the tenant layer
pub use storefront_tenancy::*;

// Re-export the cache client
pub use storefront_cache;
pub use storefront_cache::{
    CacheClient, CacheConfig, CacheLookup, CacheMode, CacheStatsSnapshot, CacheStore,
    InMemoryCache, RedisCache,
};

// Re-export optional crates
#[cfg(feature = "redis")]
pub use storefront_redis;

#[cfg(feature = "postgres")]
pub use storefront_db;

/// Prelude for common imports
pub mod prelude {
    pub use storefront_cache::prelude::*;
    pub use storefront_tenancy::prelude::*;
}
