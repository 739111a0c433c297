//! Shared services for commands.

use std::sync::Arc;

use storefront_cache::CacheClient;
use storefront_db::Database;
use storefront_tenancy::{SeaOrmTenantRepository, TenantCache, TenantRepository};

use crate::error::CliResult;

/// Cache handle and tenant repository, built once per invocation.
#[derive(Clone)]
pub struct AppContext {
    pub cache: TenantCache,
    pub repository: Arc<dyn TenantRepository>,
}

impl AppContext {
    /// Assemble a context from parts.
    pub fn new(client: CacheClient, repository: Arc<dyn TenantRepository>) -> Self {
        Self {
            cache: TenantCache::new(client),
            repository,
        }
    }

    /// Build from the environment, connecting to the database.
    pub async fn from_env() -> CliResult<Self> {
        let client = CacheClient::from_env();
        let db = Database::connect_from_env().await?;
        Ok(Self::new(client, Arc::new(SeaOrmTenantRepository::new(db))))
    }
}
