//! Tenant layer errors.

/// Tenant errors.
///
/// Cache failures never appear here; only the source of truth and input
/// validation can fail an operation.
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Tenant not found: {0}")]
    NotFound(String),

    #[error("Invalid tenant data: {0}")]
    Invalid(String),

    #[error("Tenant identifier already in use: {0}")]
    Conflict(String),

    #[error("Tenant is inactive: {0}")]
    Inactive(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TenantError {
    /// Whether the error came from the source of truth rather than the input.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[cfg(feature = "postgres")]
impl From<sea_orm::DbErr> for TenantError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::SqlErr;

        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict(detail),
            _ => Self::Storage(err.to_string()),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<storefront_db::DbError> for TenantError {
    fn from(err: storefront_db::DbError) -> Self {
        match err {
            storefront_db::DbError::Database(db) => db.into(),
            other => Self::Storage(other.to_string()),
        }
    }
}
