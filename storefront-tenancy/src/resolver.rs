//! Tenant Resolution
//!
//! Cache-aside lookup of the tenant behind a request's hostname hints.

use std::sync::Arc;

use storefront_cache::CacheLookup;
use tracing::debug;

use crate::cache::TenantCache;
use crate::error::TenantError;
use crate::repository::TenantRepository;
use crate::tenant::{RequestHints, Tenant, TenantContext, TenantIdentifier};

/// Resolves tenants from hostname hints
///
/// Checks the tenant cache first; on a miss (or an unavailable cache) queries
/// the repository by the hint kind and repopulates the cache under the same
/// identifier. Concurrent misses for one identifier each repopulate; the last
/// write wins.
#[derive(Clone)]
pub struct TenantResolver {
    cache: TenantCache,
    repository: Arc<dyn TenantRepository>,
}

impl TenantResolver {
    /// Create a resolver
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use storefront_cache::CacheClient;
    /// use storefront_tenancy::{InMemoryTenantRepository, TenantCache, TenantResolver};
    ///
    /// let repository = Arc::new(InMemoryTenantRepository::new());
    /// let resolver = TenantResolver::new(TenantCache::new(CacheClient::disabled()), repository);
    /// ```
    pub fn new(cache: TenantCache, repository: Arc<dyn TenantRepository>) -> Self {
        Self { cache, repository }
    }

    /// The tenant cache
    pub fn cache(&self) -> &TenantCache {
        &self.cache
    }

    /// Resolve the tenant for a request.
    ///
    /// `Ok(None)` when no hint is present or no tenant matches. Repository
    /// errors propagate; cache errors never do.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use storefront_cache::{CacheClient, InMemoryCache};
    /// use storefront_tenancy::*;
    ///
    /// let repository = Arc::new(
    ///     InMemoryTenantRepository::with_tenants([Tenant::new("t1", "acme", "Acme")]).unwrap(),
    /// );
    /// let cache = TenantCache::new(CacheClient::enabled(Arc::new(InMemoryCache::new())));
    /// let resolver = TenantResolver::new(cache, repository.clone());
    /// let hints = RequestHints::from_host("acme.example.com", "example.com");
    ///
    /// tokio_test::block_on(async {
    ///     let first = resolver.resolve(&hints).await.unwrap();
    ///     let second = resolver.resolve(&hints).await.unwrap();
    ///     assert_eq!(first.map(|t| t.id), Some("t1".to_string()));
    ///     assert!(second.is_some());
    /// });
    /// assert_eq!(repository.query_count(), 1);
    /// ```
    pub async fn resolve(&self, hints: &RequestHints) -> Result<Option<Tenant>, TenantError> {
        if hints.is_ambiguous() {
            debug!(
                subdomain = ?hints.subdomain,
                custom_domain = ?hints.custom_domain,
                "Both hints present, resolving by subdomain"
            );
        }
        match hints.identifier() {
            Some(identifier) => self.resolve_identifier(&identifier).await,
            None => {
                debug!("No tenant hint, skipping resolution");
                Ok(None)
            }
        }
    }

    /// Resolve a single identifier.
    pub async fn resolve_identifier(
        &self,
        identifier: &TenantIdentifier,
    ) -> Result<Option<Tenant>, TenantError> {
        let value = identifier.value();

        if let CacheLookup::Hit(tenant) = self.cache.lookup_tenant(value).await {
            return Ok(Some(tenant));
        }

        let Some(tenant) = self.repository.find_by_identifier(identifier).await? else {
            debug!(%identifier, "No tenant for identifier");
            return Ok(None);
        };

        self.cache.set_tenant_cache(value, &tenant).await;
        debug!(%identifier, tenant_id = %tenant.id, "Resolved tenant from source of truth");
        Ok(Some(tenant))
    }

    /// Resolve into a request-scoped context.
    pub async fn resolve_context(&self, hints: &RequestHints) -> Result<TenantContext, TenantError> {
        Ok(self.resolve(hints).await?.into())
    }

    /// Resolve and reject tenants that are not active.
    pub async fn resolve_active(&self, hints: &RequestHints) -> Result<Option<Tenant>, TenantError> {
        match self.resolve(hints).await? {
            Some(tenant) if !tenant.is_active() => Err(TenantError::Inactive(format!(
                "{} ({})",
                tenant.id, tenant.status
            ))),
            other => Ok(other),
        }
    }
}
