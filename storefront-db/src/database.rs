//! Database connection management.

use crate::{DatabaseConfig, DbError, DbResult};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Database handle shared by repositories.
#[derive(Clone)]
pub struct Database {
    conn: DatabaseConnection,
    config: Arc<DatabaseConfig>,
}

impl Database {
    /// Connect to the database with the given configuration.
    pub async fn connect(config: DatabaseConfig) -> DbResult<Self> {
        info!(url = %config.redacted_url(), "Connecting to database");

        let options = config.to_connect_options();
        let conn = sea_orm::Database::connect(options)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        info!("Database connection established");

        Ok(Self {
            conn,
            config: Arc::new(config),
        })
    }

    /// Connect using environment variables.
    pub async fn connect_from_env() -> DbResult<Self> {
        let config = DatabaseConfig::from_env()?;
        Self::connect(config).await
    }

    /// Wrap an existing connection (e.g. a SeaORM mock connection).
    pub fn from_connection(conn: DatabaseConnection, config: DatabaseConfig) -> Self {
        Self {
            conn,
            config: Arc::new(config),
        }
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Ping the database to check connectivity.
    pub async fn ping(&self) -> DbResult<()> {
        debug!("Pinging database");
        self.conn
            .ping()
            .await
            .map_err(|e| DbError::Connection(e.to_string()))
    }

    /// Close the database connection.
    pub async fn close(self) -> DbResult<()> {
        info!("Closing database connection");
        self.conn
            .close()
            .await
            .map_err(|e| DbError::Connection(e.to_string()))
    }

    /// Perform a health check.
    pub async fn health_check(&self) -> DatabaseHealth {
        let start = Instant::now();
        let result = self.ping().await;
        let elapsed = start.elapsed();

        DatabaseHealth {
            is_healthy: result.is_ok(),
            response_time_ms: elapsed.as_millis() as u64,
            error: result.err().map(|e| e.to_string()),
        }
    }
}

impl std::ops::Deref for Database {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl AsRef<DatabaseConnection> for Database {
    fn as_ref(&self) -> &DatabaseConnection {
        &self.conn
    }
}

/// Result of a database health check.
#[derive(Debug, Clone)]
pub struct DatabaseHealth {
    /// Whether the database is reachable.
    pub is_healthy: bool,
    /// Response time in milliseconds.
    pub response_time_ms: u64,
    /// Error message if unhealthy.
    pub error: Option<String>,
}
