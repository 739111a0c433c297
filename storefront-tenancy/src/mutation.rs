//! Tenant Mutations
//!
//! Writes to the source of truth followed by cache invalidation.
//!
//! # Consistency
//!
//! The write and the invalidation are not one transaction. If the process
//! dies between them, or the cache is unreachable, readers may see the old
//! snapshot until its TTL expires. Two concurrent updates of the same tenant
//! can each capture identifiers that the other is about to change; that race
//! is not guarded.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use storefront_tenancy::*;
//!
//! let pipeline = TenantMutationPipeline::new(repository, cache);
//!
//! pipeline.change_subdomain("t1", "acme-new").await?;
//! pipeline.suspend_tenant("t2").await?;
//!
//! let report = pipeline
//!     .bulk_update_tenants(&ids, &TenantPatch::new().with_tier("pro"))
//!     .await;
//! println!("{} ok, {} failed", report.succeeded.len(), report.failed.len());
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::TenantCache;
use crate::error::TenantError;
use crate::invalidation::InvalidationService;
use crate::repository::TenantRepository;
use crate::tenant::{Tenant, TenantIdentifier, TenantPatch, TenantSettings, TenantStatus};

/// One id that a bulk operation could not update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Tenant id
    pub id: String,
    /// Why it failed
    pub reason: String,
}

/// Partial results of a bulk operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Ids updated
    pub succeeded: Vec<String>,
    /// Ids not updated
    pub failed: Vec<BatchFailure>,
}

impl BatchResult {
    /// Number of ids processed
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every id succeeded
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies tenant mutations and keeps the cache coherent
#[derive(Clone)]
pub struct TenantMutationPipeline {
    repository: Arc<dyn TenantRepository>,
    invalidation: InvalidationService,
}

impl TenantMutationPipeline {
    /// Create a mutation pipeline
    pub fn new(repository: Arc<dyn TenantRepository>, cache: TenantCache) -> Self {
        let invalidation = InvalidationService::new(cache, repository.clone());
        Self {
            repository,
            invalidation,
        }
    }

    /// The invalidation service used after writes
    pub fn invalidation(&self) -> &InvalidationService {
        &self.invalidation
    }

    /// Update a tenant and invalidate every affected cache entry.
    ///
    /// The identifiers the tenant held before the write are captured first,
    /// then the write is applied. If it fails the cache is left untouched.
    /// Afterwards the old identifiers are invalidated, followed by any new
    /// identifiers the patch introduced. Cache failures are logged only.
    pub async fn update_tenant(&self, id: &str, patch: &TenantPatch) -> Result<Tenant, TenantError> {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| TenantError::NotFound(id.to_string()))?;
        let old_identifiers = current.identifiers();

        let updated = self.repository.update(id, patch).await?;

        let removed = self.invalidation.invalidate_identifiers(&old_identifiers).await;

        let new_identifiers: Vec<TenantIdentifier> = updated
            .identifiers()
            .into_iter()
            .filter(|identifier| !old_identifiers.contains(identifier))
            .collect();
        let removed_new = self.invalidation.invalidate_identifiers(&new_identifiers).await;

        if patch.changes_identifiers(&current) {
            info!(
                tenant_id = %id,
                old_subdomain = %current.subdomain,
                new_subdomain = %updated.subdomain,
                "Tenant identifiers changed"
            );
        }
        debug!(tenant_id = %id, removed = removed + removed_new, "Tenant updated");

        Ok(updated)
    }

    /// Set status to suspended
    pub async fn suspend_tenant(&self, id: &str) -> Result<Tenant, TenantError> {
        self.update_tenant(id, &TenantPatch::new().with_status(TenantStatus::Suspended))
            .await
    }

    /// Set status to active
    pub async fn activate_tenant(&self, id: &str) -> Result<Tenant, TenantError> {
        self.update_tenant(id, &TenantPatch::new().with_status(TenantStatus::Active))
            .await
    }

    /// Move a tenant to a new subdomain
    pub async fn change_subdomain(&self, id: &str, subdomain: &str) -> Result<Tenant, TenantError> {
        self.update_tenant(id, &TenantPatch::new().with_subdomain(subdomain))
            .await
    }

    /// Set or remove a tenant's custom domain
    pub async fn set_custom_domain(
        &self,
        id: &str,
        domain: Option<String>,
    ) -> Result<Tenant, TenantError> {
        self.update_tenant(id, &TenantPatch::new().with_custom_domain(domain))
            .await
    }

    /// Replace a tenant's settings map
    pub async fn update_settings(
        &self,
        id: &str,
        settings: TenantSettings,
    ) -> Result<Tenant, TenantError> {
        self.update_tenant(id, &TenantPatch::new().with_settings(settings))
            .await
    }

    /// Apply one patch to many tenants, one at a time.
    ///
    /// A failure is recorded and the remaining ids are still processed.
    pub async fn bulk_update_tenants(&self, ids: &[String], patch: &TenantPatch) -> BatchResult {
        let mut result = BatchResult::default();

        for id in ids {
            match self.update_tenant(id, patch).await {
                Ok(_) => result.succeeded.push(id.clone()),
                Err(e) => {
                    warn!(tenant_id = %id, error = %e, "Bulk update failed for tenant");
                    result.failed.push(BatchFailure {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "Bulk tenant update finished"
        );
        result
    }
}
