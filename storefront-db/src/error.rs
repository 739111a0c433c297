//! Error types for the database layer.

use thiserror::Error;

/// Errors raised by the source-of-truth connection.
#[derive(Error, Debug)]
pub enum DbError {
    /// Database connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database error from SeaORM.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
