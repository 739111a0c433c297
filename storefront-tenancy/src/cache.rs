//! Tenant Cache
//!
//! Typed tenant snapshots over the shared [`CacheClient`], keyed
//! `tenant:<identifier>`.

use std::ops::Range;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use storefront_cache::{CacheClient, CacheLookup, CacheOp};
use tracing::{debug, warn};

use crate::tenant::Tenant;

/// Namespace prefix shared by every tenant entry.
pub const TENANT_KEY_PREFIX: &str = "tenant:";

/// Lifetime of a cached tenant snapshot.
pub const TENANT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache key for a subdomain or custom domain
///
/// # Examples
///
/// ```
/// use storefront_tenancy::tenant_cache_key;
///
/// assert_eq!(tenant_cache_key("acme"), "tenant:acme");
/// ```
pub fn tenant_cache_key(identifier: &str) -> String {
    format!("{TENANT_KEY_PREFIX}{identifier}")
}

/// Outcome of warming one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantWarmResult {
    /// The tenant warmed
    pub tenant_id: String,
    /// Whether every key for the tenant was written
    pub stored: bool,
}

/// Tenant-aware cache wrapper
#[derive(Clone, Debug)]
pub struct TenantCache {
    client: CacheClient,
    ttl: Duration,
}

impl TenantCache {
    /// Create a tenant cache with the standard TTL
    pub fn new(client: CacheClient) -> Self {
        Self {
            client,
            ttl: TENANT_CACHE_TTL,
        }
    }

    /// Override the entry TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The underlying client
    pub fn client(&self) -> &CacheClient {
        &self.client
    }

    /// Entry TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a cache backend is configured
    pub fn is_enabled(&self) -> bool {
        self.client.is_enabled()
    }

    /// Tri-state read of a tenant snapshot.
    ///
    /// An undecodable payload is logged and reported as a miss.
    pub async fn lookup_tenant(&self, identifier: &str) -> CacheLookup<Tenant> {
        let key = tenant_cache_key(identifier);
        match self.client.lookup(&key).await {
            CacheLookup::Hit(json) => match serde_json::from_str::<Tenant>(&json) {
                Ok(tenant) => {
                    debug!(key = %key, "Tenant cache hit");
                    CacheLookup::Hit(tenant)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding undecodable tenant cache entry");
                    CacheLookup::Miss
                }
            },
            CacheLookup::Miss => {
                debug!(key = %key, "Tenant cache miss");
                CacheLookup::Miss
            }
            CacheLookup::Unavailable => CacheLookup::Unavailable,
        }
    }

    /// Read a tenant snapshot
    pub async fn get_tenant_from_cache(&self, identifier: &str) -> Option<Tenant> {
        self.lookup_tenant(identifier).await.into_option()
    }

    /// Store a tenant snapshot under one identifier
    pub async fn set_tenant_cache(&self, identifier: &str, tenant: &Tenant) -> bool {
        let key = tenant_cache_key(identifier);
        match serde_json::to_string(tenant) {
            Ok(json) => self.client.set(&key, json, self.ttl).await,
            Err(e) => {
                warn!(key = %key, tenant_id = %tenant.id, error = %e, "Failed to encode tenant");
                false
            }
        }
    }

    /// Remove the snapshot for one identifier
    pub async fn delete_tenant_cache(&self, identifier: &str) -> u64 {
        self.client.delete(&[tenant_cache_key(identifier)]).await
    }

    /// Remove snapshots for several identifiers in a single delete
    pub async fn delete_identifiers(&self, identifiers: &[&str]) -> u64 {
        let keys: Vec<String> = identifiers.iter().map(|i| tenant_cache_key(i)).collect();
        self.client.delete(&keys).await
    }

    /// Store every tenant under all its identifiers in one pipeline.
    pub async fn warm_tenant_cache(&self, tenants: &[Tenant]) -> Vec<TenantWarmResult> {
        let mut ops = Vec::with_capacity(tenants.len() * 2);
        let mut spans: Vec<Range<usize>> = Vec::with_capacity(tenants.len());

        for tenant in tenants {
            let start = ops.len();
            match serde_json::to_string(tenant) {
                Ok(json) => {
                    for identifier in tenant.identifiers() {
                        ops.push(CacheOp::set(
                            tenant_cache_key(identifier.value()),
                            json.clone(),
                            self.ttl,
                        ));
                    }
                }
                Err(e) => {
                    warn!(tenant_id = %tenant.id, error = %e, "Failed to encode tenant");
                }
            }
            spans.push(start..ops.len());
        }

        let results = if ops.is_empty() {
            Vec::new()
        } else {
            self.client.pipeline(ops).await
        };

        tenants
            .iter()
            .zip(spans)
            .map(|(tenant, span)| TenantWarmResult {
                tenant_id: tenant.id.clone(),
                stored: !span.is_empty()
                    && results
                        .get(span)
                        .is_some_and(|r| r.iter().all(|res| res.is_success())),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storefront_cache::{CacheStore, InMemoryCache};

    fn cache() -> (TenantCache, InMemoryCache) {
        let store = InMemoryCache::new();
        let client = CacheClient::enabled(Arc::new(store.clone()));
        (TenantCache::new(client), store)
    }

    fn acme() -> Tenant {
        Tenant::new("t1", "acme", "Acme").with_custom_domain("shop.acme.com")
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (cache, _) = cache();
        let tenant = acme();

        assert!(cache.set_tenant_cache("acme", &tenant).await);
        assert_eq!(cache.get_tenant_from_cache("acme").await, Some(tenant));
        assert_eq!(cache.get_tenant_from_cache("globex").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let (cache, _) = cache();
        let cache = cache.with_ttl(Duration::from_secs(5));
        let tenant = acme();

        cache.set_tenant_cache("acme", &tenant).await;
        cache.set_tenant_cache("shop.acme.com", &tenant).await;

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(cache.get_tenant_from_cache("acme").await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get_tenant_from_cache("acme").await.is_none());
        assert!(cache.get_tenant_from_cache("shop.acme.com").await.is_none());
    }

    #[tokio::test]
    async fn test_standard_ttl() {
        let (cache, store) = cache();
        cache.set_tenant_cache("acme", &acme()).await;

        let ttl = store.ttl("tenant:acme").await.unwrap();
        assert!(ttl <= TENANT_CACHE_TTL);
        assert!(ttl > TENANT_CACHE_TTL - Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_miss() {
        let (cache, store) = cache();
        store
            .set("tenant:acme", "not json".into(), TENANT_CACHE_TTL)
            .await
            .unwrap();

        assert_eq!(cache.lookup_tenant("acme").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_delete() {
        let (cache, _) = cache();
        cache.set_tenant_cache("acme", &acme()).await;

        assert_eq!(cache.delete_tenant_cache("acme").await, 1);
        assert_eq!(cache.delete_tenant_cache("acme").await, 0);
    }

    #[tokio::test]
    async fn test_warm_uses_one_pipeline() {
        let (cache, store) = cache();
        let tenants = vec![
            acme(),
            Tenant::new("t2", "globex", "Globex"),
            Tenant::new("t3", "initech", "Initech").with_custom_domain("initech.io"),
        ];

        let results = cache.warm_tenant_cache(&tenants).await;

        assert_eq!(store.pipeline_calls(), 1);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.stored));
        for key in ["acme", "shop.acme.com", "globex", "initech", "initech.io"] {
            assert!(cache.get_tenant_from_cache(key).await.is_some(), "{key} not warmed");
        }
    }

    #[tokio::test]
    async fn test_warm_empty_makes_no_call() {
        let (cache, store) = cache();
        assert!(cache.warm_tenant_cache(&[]).await.is_empty());
        assert_eq!(store.pipeline_calls(), 0);
    }

    #[tokio::test]
    async fn test_warm_reports_failures() {
        let (cache, store) = cache();
        store.set_unavailable(true);

        let results = cache.warm_tenant_cache(&[acme()]).await;
        assert_eq!(
            results,
            vec![TenantWarmResult {
                tenant_id: "t1".into(),
                stored: false
            }]
        );
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let cache = TenantCache::new(CacheClient::disabled());
        let tenant = acme();

        assert!(cache.set_tenant_cache("acme", &tenant).await);
        assert_eq!(cache.lookup_tenant("acme").await, CacheLookup::Unavailable);
        assert_eq!(cache.delete_tenant_cache("acme").await, 0);
        assert!(cache.warm_tenant_cache(&[tenant]).await[0].stored);
    }
}
