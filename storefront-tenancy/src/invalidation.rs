//! Tenant cache invalidation.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{TENANT_KEY_PREFIX, TenantCache};
use crate::error::TenantError;
use crate::repository::TenantRepository;
use crate::tenant::{Tenant, TenantIdentifier};

/// Keys removed per DEL when flushing by pattern.
pub const INVALIDATION_CHUNK_SIZE: usize = 500;

/// Removes tenant snapshots from the cache.
///
/// Every method returns how many entries were actually removed. Cache
/// failures read as zero and are logged by the client.
#[derive(Clone)]
pub struct InvalidationService {
    cache: TenantCache,
    repository: Arc<dyn TenantRepository>,
}

impl InvalidationService {
    /// Create an invalidation service
    pub fn new(cache: TenantCache, repository: Arc<dyn TenantRepository>) -> Self {
        Self { cache, repository }
    }

    /// The tenant cache
    pub fn cache(&self) -> &TenantCache {
        &self.cache
    }

    /// Drop both of a tenant's entries in a single delete.
    pub async fn invalidate_tenant_cache(&self, subdomain: &str, custom_domain: Option<&str>) -> u64 {
        let mut identifiers = vec![subdomain];
        identifiers.extend(custom_domain);
        let deleted = self.cache.delete_identifiers(&identifiers).await;
        debug!(subdomain, custom_domain = ?custom_domain, deleted, "Invalidated tenant cache");
        deleted
    }

    /// Drop the entries for every identifier `tenant` owns.
    pub async fn invalidate_tenant(&self, tenant: &Tenant) -> u64 {
        self.invalidate_tenant_cache(&tenant.subdomain, tenant.custom_domain.as_deref())
            .await
    }

    /// Drop the entries for an explicit identifier set in a single delete.
    pub async fn invalidate_identifiers(&self, identifiers: &[TenantIdentifier]) -> u64 {
        if identifiers.is_empty() {
            return 0;
        }
        let values: Vec<&str> = identifiers.iter().map(TenantIdentifier::value).collect();
        self.cache.delete_identifiers(&values).await
    }

    /// Look up a tenant's current identifiers and drop its entries.
    ///
    /// Returns `Ok(None)` when no such tenant exists. Only correct while the
    /// stored identifiers are still the ones that were cached; mutations
    /// capture the old identifiers themselves.
    pub async fn invalidate_tenant_by_id(&self, id: &str) -> Result<Option<u64>, TenantError> {
        if !self.cache.is_enabled() {
            return Ok(Some(0));
        }
        match self.repository.find_by_id(id).await? {
            Some(tenant) => Ok(Some(self.invalidate_tenant(&tenant).await)),
            None => {
                debug!(tenant_id = %id, "No tenant to invalidate");
                Ok(None)
            }
        }
    }

    /// Drop every tenant entry.
    pub async fn invalidate_all_tenants(&self) -> u64 {
        let deleted = self.delete_matching(&format!("{TENANT_KEY_PREFIX}*")).await;
        info!(deleted, "Flushed tenant cache");
        deleted
    }

    /// Drop tenant entries whose identifier matches a glob pattern.
    pub async fn invalidate_pattern(&self, pattern: &str) -> u64 {
        let deleted = self
            .delete_matching(&format!("{TENANT_KEY_PREFIX}{pattern}"))
            .await;
        info!(pattern, deleted, "Invalidated tenant cache by pattern");
        deleted
    }

    async fn delete_matching(&self, pattern: &str) -> u64 {
        if !self.cache.is_enabled() {
            return 0;
        }
        let client = self.cache.client();
        let keys = client.keys_matching(pattern).await;

        let mut deleted = 0;
        for (index, chunk) in keys.chunks(INVALIDATION_CHUNK_SIZE).enumerate() {
            let removed = client.delete(chunk).await;
            debug!(pattern, chunk = index, keys = chunk.len(), removed, "Deleted key chunk");
            deleted += removed;
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryTenantRepository;
    use async_trait::async_trait;
    use std::time::Duration;
    use storefront_cache::{CacheClient, CacheError, CacheResult, CacheStore, InMemoryCache};

    fn service_with(store: Arc<dyn CacheStore>) -> (InvalidationService, Arc<InMemoryTenantRepository>) {
        let repo = Arc::new(
            InMemoryTenantRepository::with_tenants([
                Tenant::new("t1", "acme", "Acme").with_custom_domain("shop.acme.com"),
                Tenant::new("t2", "globex", "Globex"),
            ])
            .unwrap(),
        );
        let cache = TenantCache::new(CacheClient::enabled(store));
        (InvalidationService::new(cache, repo.clone()), repo)
    }

    fn service() -> (InvalidationService, InMemoryCache, Arc<InMemoryTenantRepository>) {
        let store = InMemoryCache::new();
        let (service, repo) = service_with(Arc::new(store.clone()));
        (service, store, repo)
    }

    async fn cache_tenant(service: &InvalidationService, tenant: &Tenant) {
        for identifier in tenant.identifiers() {
            service.cache().set_tenant_cache(identifier.value(), tenant).await;
        }
    }

    #[tokio::test]
    async fn test_invalidate_both_keys_in_one_call() {
        let (service, store, _) = service();
        let tenant = Tenant::new("t1", "acme", "Acme").with_custom_domain("shop.acme.com");
        cache_tenant(&service, &tenant).await;

        let deleted = service
            .invalidate_tenant_cache("acme", Some("shop.acme.com"))
            .await;

        assert_eq!(deleted, 2);
        assert_eq!(
            store.delete_calls(),
            vec![vec!["tenant:acme".to_string(), "tenant:shop.acme.com".to_string()]]
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_by_id() {
        let (service, store, repo) = service();
        let tenant = repo.find_by_id("t1").await.unwrap().unwrap();
        cache_tenant(&service, &tenant).await;

        assert_eq!(service.invalidate_tenant_by_id("t1").await.unwrap(), Some(2));
        assert!(!store.contains_key("tenant:acme").await);
        assert!(!store.contains_key("tenant:shop.acme.com").await);

        assert_eq!(service.invalidate_tenant_by_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_by_id_propagates_storage_errors() {
        let (service, _, repo) = service();
        repo.set_failing(true);

        let err = service.invalidate_tenant_by_id("t1").await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_invalidate_all_leaves_other_namespaces() {
        let (service, store, _) = service();
        let ttl = Duration::from_secs(300);
        for key in ["tenant:acme", "tenant:shop.acme.com", "tenant:globex"] {
            store.set(key, "{}".into(), ttl).await.unwrap();
        }
        store.set("product:42", "{}".into(), ttl).await.unwrap();

        assert_eq!(service.invalidate_all_tenants().await, 3);
        assert!(store.contains_key("product:42").await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_chunks_deletes() {
        let (service, store, _) = service();
        let ttl = Duration::from_secs(300);
        for i in 0..1_201 {
            store.set(&format!("tenant:t{i}"), "{}".into(), ttl).await.unwrap();
        }

        assert_eq!(service.invalidate_all_tenants().await, 1_201);

        let sizes: Vec<usize> = store.delete_calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![500, 500, 201]);
    }

    /// Fails the first delete, succeeds afterwards.
    struct FlakyDeleteStore {
        inner: InMemoryCache,
        deletes: parking_lot::Mutex<usize>,
    }

    #[async_trait]
    impl CacheStore for FlakyDeleteStore {
        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
            let attempt = {
                let mut deletes = self.deletes.lock();
                *deletes += 1;
                *deletes
            };
            if attempt == 1 {
                return Err(CacheError::Connection("reset by peer".into()));
            }
            self.inner.delete(keys).await
        }

        async fn keys_matching(&self, pattern: &str) -> CacheResult<Vec<String>> {
            self.inner.keys_matching(pattern).await
        }

        async fn ping(&self) -> CacheResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_stop_flush() {
        let inner = InMemoryCache::new();
        let ttl = Duration::from_secs(300);
        for i in 0..600 {
            inner.set(&format!("tenant:t{i:04}"), "{}".into(), ttl).await.unwrap();
        }
        let store = Arc::new(FlakyDeleteStore {
            inner: inner.clone(),
            deletes: parking_lot::Mutex::new(0),
        });
        let (service, _) = service_with(store);

        assert_eq!(service.invalidate_all_tenants().await, 100);
        assert_eq!(inner.len().await, 500);
    }

    #[tokio::test]
    async fn test_invalidate_pattern() {
        let (service, store, _) = service();
        let ttl = Duration::from_secs(300);
        for key in ["tenant:acme", "tenant:acme-eu", "tenant:globex"] {
            store.set(key, "{}".into(), ttl).await.unwrap();
        }

        assert_eq!(service.invalidate_pattern("acme*").await, 2);
        assert!(store.contains_key("tenant:globex").await);
    }

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let repo = Arc::new(InMemoryTenantRepository::new());
        repo.set_failing(true);
        let service = InvalidationService::new(TenantCache::new(CacheClient::disabled()), repo.clone());

        assert_eq!(service.invalidate_tenant_cache("acme", Some("shop.acme.com")).await, 0);
        assert_eq!(service.invalidate_tenant_by_id("t1").await.unwrap(), Some(0));
        assert_eq!(service.invalidate_all_tenants().await, 0);
        assert_eq!(service.invalidate_pattern("*").await, 0);
        assert_eq!(repo.query_count(), 0);
    }
}
