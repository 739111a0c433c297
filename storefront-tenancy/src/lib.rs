//! Tenant Resolution and Cache Invalidation
//!
//! Maps a request's hostname (subdomain or custom domain) to a tenant record,
//! keeps that mapping in a shared cache, and keeps the cache coherent across
//! tenant mutations and administrative flushes.
//!
//! # Features
//!
//! - 🔍 **Tenant Resolution** - Cache-aside lookup by subdomain or custom domain
//! - 💾 **Tenant Cache** - `tenant:<identifier>` snapshots with a 300s TTL
//! - 🧹 **Invalidation** - Per tenant, by id, by pattern, or a full flush
//! - 📝 **Mutations** - Writes that invalidate old and new identifiers
//! - 🚀 **Cache Warming** - Bulk population in a single pipeline
//! - 🐘 **PostgreSQL** - SeaORM repository (`postgres` feature)
//!
//! Cache failures never fail a request: every component falls through to the
//! source of truth and staleness is bounded by the TTL.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use storefront_cache::CacheClient;
//! use storefront_tenancy::*;
//!
//! let cache = TenantCache::new(CacheClient::from_env());
//! let repository: Arc<dyn TenantRepository> = Arc::new(SeaOrmTenantRepository::connect_from_env().await?);
//!
//! let resolver = TenantResolver::new(cache.clone(), repository.clone());
//! let hints = RequestHints::from_host("acme.example.com", "example.com");
//! let tenant = resolver.resolve(&hints).await?;
//!
//! let pipeline = TenantMutationPipeline::new(repository, cache);
//! pipeline.change_subdomain("t1", "acme-new").await?;
//! ```

pub mod cache;
pub mod error;
pub mod invalidation;
pub mod mutation;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repository;
pub mod resolver;
pub mod tenant;
pub mod warmer;

pub use cache::{TENANT_CACHE_TTL, TENANT_KEY_PREFIX, TenantCache, TenantWarmResult, tenant_cache_key};
pub use error::TenantError;
pub use invalidation::{INVALIDATION_CHUNK_SIZE, InvalidationService};
pub use mutation::{BatchFailure, BatchResult, TenantMutationPipeline};
#[cfg(feature = "postgres")]
pub use postgres::SeaOrmTenantRepository;
pub use repository::{InMemoryTenantRepository, TenantRepository};
pub use resolver::TenantResolver;
pub use tenant::{
    RequestHints, Tenant, TenantContext, TenantIdentifier, TenantPatch, TenantSettings,
    TenantStatus,
};
pub use warmer::{CacheWarmer, WarmReport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::TenantCache;
    pub use crate::error::TenantError;
    pub use crate::invalidation::InvalidationService;
    pub use crate::mutation::{BatchResult, TenantMutationPipeline};
    pub use crate::repository::{InMemoryTenantRepository, TenantRepository};
    pub use crate::resolver::TenantResolver;
    pub use crate::tenant::{RequestHints, Tenant, TenantContext, TenantIdentifier, TenantPatch};
    pub use crate::warmer::CacheWarmer;
}
