//! Configuration for the source-of-truth database connection.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{DbError, DbResult};

/// Configuration for a SeaORM database connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL.
    pub database_url: String,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout.
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Idle timeout for connections.
    #[serde(default = "default_idle_timeout")]
    #[serde(with = "duration_secs")]
    pub idle_timeout: Duration,

    /// Enable SQLx statement logging.
    #[serde(default)]
    pub sqlx_logging: bool,

    /// Schema search path (PostgreSQL).
    #[serde(default)]
    pub schema: Option<String>,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

impl DatabaseConfig {
    /// Create a new configuration with the given database URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            sqlx_logging: false,
            schema: None,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Uses the following environment variables:
    /// - `DATABASE_URL`: Required database URL
    /// - `DATABASE_MAX_CONNECTIONS`: Max connections (default: 10)
    /// - `DATABASE_MIN_CONNECTIONS`: Min connections (default: 1)
    /// - `DATABASE_CONNECT_TIMEOUT`: Connect timeout in seconds
    /// - `DATABASE_SQLX_LOGGING`: Enable SQLx logging (true/false)
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| DbError::Config("DATABASE_URL not set".into()))?;

        let mut config = Self::new(database_url);

        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = max
                .parse()
                .map_err(|_| DbError::Config("Invalid DATABASE_MAX_CONNECTIONS".into()))?;
        }

        if let Some(min) = lookup("DATABASE_MIN_CONNECTIONS") {
            config.min_connections = min
                .parse()
                .map_err(|_| DbError::Config("Invalid DATABASE_MIN_CONNECTIONS".into()))?;
        }

        if let Some(timeout) = lookup("DATABASE_CONNECT_TIMEOUT") {
            config.connect_timeout = Duration::from_secs(
                timeout
                    .parse()
                    .map_err(|_| DbError::Config("Invalid DATABASE_CONNECT_TIMEOUT".into()))?,
            );
        }

        if let Some(logging) = lookup("DATABASE_SQLX_LOGGING") {
            config.sqlx_logging = logging == "true" || logging == "1";
        }

        Ok(config)
    }

    /// Set the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the schema name (PostgreSQL).
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// URL with any password removed, for logs.
    pub fn redacted_url(&self) -> String {
        match (self.database_url.find("://"), self.database_url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                let scheme = &self.database_url[..scheme_end + 3];
                let userinfo = &self.database_url[scheme_end + 3..at];
                let user = userinfo.split(':').next().unwrap_or_default();
                format!("{scheme}{user}:***{}", &self.database_url[at..])
            }
            _ => self.database_url.clone(),
        }
    }

    /// Convert to SeaORM ConnectOptions.
    pub fn to_connect_options(&self) -> sea_orm::ConnectOptions {
        let mut options = sea_orm::ConnectOptions::new(&self.database_url);

        options
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .sqlx_logging(self.sqlx_logging);

        if let Some(ref schema) = self.schema {
            options.set_schema_search_path(schema.clone());
        }

        options
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_requires_database_url() {
        let err = DatabaseConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_reads_pool_settings() {
        let config = DatabaseConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://app:pw@db/storefront"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("DATABASE_CONNECT_TIMEOUT", "3"),
            ("DATABASE_SQLX_LOGGING", "true"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 25);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert!(config.sqlx_logging);
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        let result = DatabaseConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/storefront"),
            ("DATABASE_MIN_CONNECTIONS", "many"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_redacted_url_hides_password() {
        let config = DatabaseConfig::new("postgres://app:hunter2@db:5432/storefront");
        assert_eq!(config.redacted_url(), "postgres://app:***@db:5432/storefront");

        let config = DatabaseConfig::new("postgres://db/storefront");
        assert_eq!(config.redacted_url(), "postgres://db/storefront");
    }
}
