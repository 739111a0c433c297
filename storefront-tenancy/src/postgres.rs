//! PostgreSQL tenant repository backed by SeaORM.
//!
//! Expects a `tenants` table with unique indexes on `subdomain` and
//! `custom_domain`; unique violations surface as
//! [`TenantError::Conflict`].

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use storefront_db::Database;
use tracing::{debug, warn};

use crate::error::TenantError;
use crate::repository::TenantRepository;
use crate::tenant::{Tenant, TenantPatch, TenantSettings, TenantStatus};

/// `tenants` table entity.
pub mod entity {
    use sea_orm::entity::prelude::*;

    /// One row of `tenants`.
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "tenants")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(unique)]
        pub subdomain: String,
        #[sea_orm(unique)]
        pub custom_domain: Option<String>,
        pub name: String,
        pub settings: Json,
        pub status: String,
        pub tier: String,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

use entity::{ActiveModel, Column, Entity, Model};

impl From<Model> for Tenant {
    fn from(row: Model) -> Self {
        let settings = match row.settings {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => TenantSettings::new(),
            other => {
                warn!(tenant_id = %row.id, kind = ?other, "Ignoring non-object tenant settings");
                TenantSettings::new()
            }
        };
        Tenant {
            id: row.id,
            subdomain: row.subdomain,
            custom_domain: row.custom_domain,
            name: row.name,
            settings,
            status: TenantStatus::from(row.status),
            tier: row.tier,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Tenant repository over a SeaORM connection
#[derive(Clone)]
pub struct SeaOrmTenantRepository {
    db: Database,
}

impl SeaOrmTenantRepository {
    /// Wrap a database handle
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connect using `DATABASE_*` environment variables
    pub async fn connect_from_env() -> Result<Self, TenantError> {
        Ok(Self::new(Database::connect_from_env().await?))
    }

    /// The database handle
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl TenantRepository for SeaOrmTenantRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, TenantError> {
        let row = Entity::find_by_id(id.to_string())
            .one(self.db.connection())
            .await?;
        Ok(row.map(Tenant::from))
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, TenantError> {
        let row = Entity::find()
            .filter(Column::Subdomain.eq(subdomain))
            .one(self.db.connection())
            .await?;
        Ok(row.map(Tenant::from))
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Tenant>, TenantError> {
        let row = Entity::find()
            .filter(Column::CustomDomain.eq(domain))
            .one(self.db.connection())
            .await?;
        Ok(row.map(Tenant::from))
    }

    async fn update(&self, id: &str, patch: &TenantPatch) -> Result<Tenant, TenantError> {
        patch.validate()?;

        let txn = self.db.connection().begin().await?;

        let current = Entity::find_by_id(id.to_string())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| TenantError::NotFound(id.to_string()))?;

        let updated = patch.apply_to(&Tenant::from(current.clone()));

        let mut row: ActiveModel = current.into();
        row.subdomain = Set(updated.subdomain);
        row.custom_domain = Set(updated.custom_domain);
        row.name = Set(updated.name);
        row.settings = Set(serde_json::Value::Object(updated.settings));
        row.status = Set(String::from(updated.status));
        row.tier = Set(updated.tier);
        row.updated_at = Set(updated.updated_at);

        let saved = row.update(&txn).await?;
        txn.commit().await?;

        debug!(tenant_id = %id, "Tenant row updated");
        Ok(saved.into())
    }

    async fn list_all(&self) -> Result<Vec<Tenant>, TenantError> {
        let rows = Entity::find()
            .order_by_asc(Column::Id)
            .all(self.db.connection())
            .await?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn row(settings: serde_json::Value, status: &str) -> Model {
        Model {
            id: "t1".into(),
            subdomain: "acme".into(),
            custom_domain: Some("shop.acme.com".into()),
            name: "Acme".into(),
            settings,
            status: status.into(),
            tier: "pro".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_to_tenant() {
        let tenant = Tenant::from(row(json!({"theme": "dark"}), "active"));
        assert_eq!(tenant.subdomain, "acme");
        assert_eq!(tenant.custom_domain.as_deref(), Some("shop.acme.com"));
        assert_eq!(tenant.settings["theme"], "dark");
        assert!(tenant.is_active());
    }

    #[test]
    fn test_row_keeps_unknown_status_and_tolerates_bad_settings() {
        let tenant = Tenant::from(row(json!([1, 2]), "archived"));
        assert_eq!(tenant.status, TenantStatus::Other("archived".into()));
        assert!(tenant.settings.is_empty());

        let tenant = Tenant::from(row(serde_json::Value::Null, "suspended"));
        assert_eq!(tenant.status, TenantStatus::Suspended);
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_round_trip_against_postgres() {
        let repo = SeaOrmTenantRepository::connect_from_env().await.unwrap();
        let tenants = repo.list_all().await.unwrap();
        if let Some(first) = tenants.first() {
            let found = repo.find_by_subdomain(&first.subdomain).await.unwrap();
            assert_eq!(found.map(|t| t.id), Some(first.id.clone()));
        }
    }
}
