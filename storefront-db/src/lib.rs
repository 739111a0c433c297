//! # Storefront DB
//!
//! SeaORM connection management for the tenant source of truth.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use storefront_db::{Database, DatabaseConfig};
//!
//! let config = DatabaseConfig::from_env()?
//!     .max_connections(10)
//!     .connect_timeout(Duration::from_secs(5));
//!
//! let db = Database::connect(config).await?;
//! db.ping().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod database;
mod error;

pub use config::*;
pub use database::*;
pub use error::*;

// Re-export sea-orm for repository implementations
pub use sea_orm;

/// Prelude module for commonly used types.
pub mod prelude {
    pub use super::{Database, DatabaseConfig, DbError, DbResult};
    pub use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement};
}
