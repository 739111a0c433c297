//! Tenant source of truth.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::TenantError;
use crate::tenant::{Tenant, TenantIdentifier, TenantPatch};

/// Tenant repository trait (implement with your database)
///
/// Every lookup is authoritative; errors are hard failures that callers
/// propagate.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Find tenant by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, TenantError>;

    /// Find tenant by subdomain
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, TenantError>;

    /// Find tenant by custom domain
    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Tenant>, TenantError>;

    /// Apply a patch, returning the updated record
    async fn update(&self, id: &str, patch: &TenantPatch) -> Result<Tenant, TenantError>;

    /// Every tenant
    async fn list_all(&self) -> Result<Vec<Tenant>, TenantError>;

    /// Find tenant by either identifier kind
    async fn find_by_identifier(
        &self,
        identifier: &TenantIdentifier,
    ) -> Result<Option<Tenant>, TenantError> {
        match identifier {
            TenantIdentifier::Subdomain(s) => self.find_by_subdomain(s).await,
            TenantIdentifier::CustomDomain(d) => self.find_by_custom_domain(d).await,
        }
    }
}

/// In-memory tenant repository
///
/// Enforces identifier uniqueness the way the database's unique indexes do.
#[derive(Default)]
pub struct InMemoryTenantRepository {
    tenants: RwLock<HashMap<String, Tenant>>,
    queries: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryTenantRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `tenants`
    pub fn with_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Result<Self, TenantError> {
        let repository = Self::new();
        for tenant in tenants {
            repository.insert(tenant)?;
        }
        Ok(repository)
    }

    /// Insert a new tenant, rejecting duplicate ids and identifiers
    pub fn insert(&self, tenant: Tenant) -> Result<(), TenantError> {
        let mut tenants = self.tenants.write();
        if tenants.contains_key(&tenant.id) {
            return Err(TenantError::Conflict(format!("id {}", tenant.id)));
        }
        check_unique(&tenants, &tenant)?;
        tenants.insert(tenant.id.clone(), tenant);
        Ok(())
    }

    /// Number of tenants
    pub fn len(&self) -> usize {
        self.tenants.read().len()
    }

    /// Whether the repository is empty
    pub fn is_empty(&self) -> bool {
        self.tenants.read().is_empty()
    }

    /// Number of read queries served
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Simulate an unreachable database: every call fails while set
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn begin_query(&self) -> Result<(), TenantError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TenantError::Storage("database unavailable".into()));
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn find(&self, predicate: impl Fn(&Tenant) -> bool) -> Option<Tenant> {
        self.tenants.read().values().find(|t| predicate(t)).cloned()
    }
}

/// Reject `candidate` if another tenant owns one of its identifiers.
fn check_unique(tenants: &HashMap<String, Tenant>, candidate: &Tenant) -> Result<(), TenantError> {
    for other in tenants.values().filter(|t| t.id != candidate.id) {
        if other.subdomain == candidate.subdomain {
            return Err(TenantError::Conflict(format!("subdomain {}", candidate.subdomain)));
        }
        if let Some(domain) = &candidate.custom_domain
            && other.custom_domain.as_ref() == Some(domain) {
                return Err(TenantError::Conflict(format!("custom domain {domain}")));
            }
    }
    Ok(())
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, TenantError> {
        self.begin_query()?;
        Ok(self.tenants.read().get(id).cloned())
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, TenantError> {
        self.begin_query()?;
        Ok(self.find(|t| t.subdomain == subdomain))
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Tenant>, TenantError> {
        self.begin_query()?;
        Ok(self.find(|t| t.custom_domain.as_deref() == Some(domain)))
    }

    async fn update(&self, id: &str, patch: &TenantPatch) -> Result<Tenant, TenantError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TenantError::Storage("database unavailable".into()));
        }
        patch.validate()?;

        let mut tenants = self.tenants.write();
        let current = tenants
            .get(id)
            .ok_or_else(|| TenantError::NotFound(id.to_string()))?;
        let updated = patch.apply_to(current);
        check_unique(&tenants, &updated)?;
        tenants.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn list_all(&self) -> Result<Vec<Tenant>, TenantError> {
        self.begin_query()?;
        let mut tenants: Vec<Tenant> = self.tenants.read().values().cloned().collect();
        tenants.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tenants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> InMemoryTenantRepository {
        InMemoryTenantRepository::with_tenants([
            Tenant::new("t1", "acme", "Acme").with_custom_domain("shop.acme.com"),
            Tenant::new("t2", "globex", "Globex"),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_lookups() {
        let repo = repository();

        assert_eq!(repo.find_by_id("t1").await.unwrap().unwrap().subdomain, "acme");
        assert_eq!(repo.find_by_subdomain("globex").await.unwrap().unwrap().id, "t2");
        assert_eq!(
            repo.find_by_custom_domain("shop.acme.com").await.unwrap().unwrap().id,
            "t1"
        );
        assert!(repo.find_by_subdomain("initech").await.unwrap().is_none());
        assert_eq!(
            repo.find_by_identifier(&TenantIdentifier::CustomDomain("shop.acme.com".into()))
                .await
                .unwrap()
                .map(|t| t.id),
            Some("t1".to_string())
        );
        assert_eq!(repo.query_count(), 5);
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let repo = repository();
        let updated = repo
            .update("t1", &TenantPatch::new().with_subdomain("acme-new"))
            .await
            .unwrap();

        assert_eq!(updated.subdomain, "acme-new");
        assert!(repo.find_by_subdomain("acme").await.unwrap().is_none());
        assert!(repo.find_by_subdomain("acme-new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_rejects_conflicts() {
        let repo = repository();

        let err = repo
            .update("t2", &TenantPatch::new().with_subdomain("acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, TenantError::Conflict(_)));

        let err = repo
            .update(
                "t2",
                &TenantPatch::new().with_custom_domain(Some("shop.acme.com".into())),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TenantError::Conflict(_)));

        assert!(repo.insert(Tenant::new("t3", "globex", "Dup")).is_err());
        assert!(repo.insert(Tenant::new("t1", "other", "Dup id")).is_err());
    }

    #[tokio::test]
    async fn test_update_missing_and_invalid() {
        let repo = repository();

        let err = repo.update("nope", &TenantPatch::new().with_name("X")).await.unwrap_err();
        assert!(matches!(err, TenantError::NotFound(_)));

        let err = repo.update("t1", &TenantPatch::new().with_subdomain("")).await.unwrap_err();
        assert!(matches!(err, TenantError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_failing_repository() {
        let repo = repository();
        repo.set_failing(true);

        assert!(repo.find_by_id("t1").await.unwrap_err().is_storage());
        assert!(repo.list_all().await.is_err());
        assert!(repo.update("t1", &TenantPatch::new().with_name("X")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_all_sorted() {
        let repo = repository();
        let ids: Vec<String> = repo.list_all().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }
}
