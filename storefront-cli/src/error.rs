//! Error types for the storefront CLI.

use storefront_db::DbError;
use storefront_tenancy::TenantError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Tenant layer failure (source of truth or validation)
    #[error("{0}")]
    Tenant(#[from] TenantError),

    /// Database connection or configuration failure
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Environment file could not be loaded
    #[error("Failed to load environment file {path}: {reason}")]
    EnvFile { path: String, reason: String },

    /// Invalid argument combination
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The command ran but did not fully succeed
    #[error("{0}")]
    Incomplete(String),
}
