//! Bulk cache population.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{TenantCache, TenantWarmResult};
use crate::error::TenantError;
use crate::repository::TenantRepository;

/// Summary of one warm run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmReport {
    /// Tenants fetched
    pub total: usize,
    /// Tenants fully written to the cache
    pub warmed: usize,
    /// Tenants with at least one failed write
    pub failed: usize,
    /// Per-tenant outcomes, in fetch order
    pub results: Vec<TenantWarmResult>,
}

/// Loads every tenant into the cache ahead of traffic
pub struct CacheWarmer {
    repository: Arc<dyn TenantRepository>,
    cache: TenantCache,
}

impl CacheWarmer {
    /// Create a warmer
    pub fn new(repository: Arc<dyn TenantRepository>, cache: TenantCache) -> Self {
        Self { repository, cache }
    }

    /// Fetch all tenants and write them to the cache.
    ///
    /// A fetch failure aborts the run. Cache write failures are counted in
    /// the report.
    pub async fn run(&self) -> Result<WarmReport, TenantError> {
        let tenants = self.repository.list_all().await?;
        info!(count = tenants.len(), "Warming tenant cache");

        let results = self.cache.warm_tenant_cache(&tenants).await;

        for result in &results {
            if result.stored {
                info!(tenant_id = %result.tenant_id, "Cached tenant");
            } else {
                warn!(tenant_id = %result.tenant_id, "Failed to cache tenant");
            }
        }

        let warmed = results.iter().filter(|r| r.stored).count();
        let report = WarmReport {
            total: tenants.len(),
            warmed,
            failed: results.len() - warmed,
            results,
        };
        info!(
            total = report.total,
            warmed = report.warmed,
            failed = report.failed,
            "Tenant cache warm finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryTenantRepository;
    use crate::tenant::Tenant;
    use storefront_cache::{CacheClient, InMemoryCache};

    fn setup() -> (CacheWarmer, Arc<InMemoryTenantRepository>, InMemoryCache) {
        let repo = Arc::new(
            InMemoryTenantRepository::with_tenants([
                Tenant::new("t1", "acme", "Acme").with_custom_domain("shop.acme.com"),
                Tenant::new("t2", "globex", "Globex"),
            ])
            .unwrap(),
        );
        let store = InMemoryCache::new();
        let cache = TenantCache::new(CacheClient::enabled(Arc::new(store.clone())));
        (CacheWarmer::new(repo.clone(), cache), repo, store)
    }

    #[tokio::test]
    async fn test_run_warms_every_identifier() {
        let (warmer, _, store) = setup();
        let report = warmer.run().await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.warmed, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(store.pipeline_calls(), 1);
        for key in ["tenant:acme", "tenant:shop.acme.com", "tenant:globex"] {
            assert!(store.contains_key(key).await);
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let (warmer, repo, store) = setup();
        repo.set_failing(true);

        assert!(warmer.run().await.is_err());
        assert_eq!(store.pipeline_calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_failures_are_counted() {
        let (warmer, _, store) = setup();
        store.set_unavailable(true);

        let report = warmer.run().await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.warmed, 0);
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let store = InMemoryCache::new();
        let warmer = CacheWarmer::new(
            Arc::new(InMemoryTenantRepository::new()),
            TenantCache::new(CacheClient::enabled(Arc::new(store.clone()))),
        );

        let report = warmer.run().await.unwrap();
        assert_eq!(report, WarmReport::default());
        assert_eq!(store.pipeline_calls(), 0);
    }
}
