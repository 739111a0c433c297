//! Redis configuration.
//!
//! The cache backend is addressed by two connection parameters: an endpoint
//! (`REDIS_URL`) and an auth token (`REDIS_TOKEN`). Both must be present for a
//! configuration to exist at all; callers treat a missing configuration as
//! "caching disabled".

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable holding the Redis endpoint.
pub const ENDPOINT_ENV: &str = "REDIS_URL";

/// Environment variable holding the Redis auth token.
pub const TOKEN_ENV: &str = "REDIS_TOKEN";

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis endpoint (redis://host:port or rediss://host:port for TLS).
    pub url: String,
    /// Auth token, sent as the connection password.
    pub token: Option<String>,
    /// Username for Redis 6+ ACL.
    pub username: Option<String>,
    /// Connection pool size.
    pub pool_size: u32,
    /// Minimum idle connections.
    pub min_idle: Option<u32>,
    /// Connection timeout.
    #[serde(with = "duration_secs", default = "default_connection_timeout")]
    pub connection_timeout: Duration,
    /// Database number (0-15).
    pub database: Option<u8>,
    /// Use TLS.
    pub tls: bool,
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            token: None,
            username: None,
            pool_size: 10,
            min_idle: None,
            connection_timeout: default_connection_timeout(),
            database: None,
            tls: false,
        }
    }
}

impl RedisConfig {
    /// Create a new configuration from an endpoint and token.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Create a builder.
    pub fn builder() -> RedisConfigBuilder {
        RedisConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless both `REDIS_URL` and `REDIS_TOKEN` are set to
    /// non-empty values. Optional tuning comes from `REDIS_POOL_SIZE`,
    /// `REDIS_DATABASE`, `REDIS_USERNAME` and `REDIS_TLS`.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = non_empty(ENDPOINT_ENV)?;
        let token = non_empty(TOKEN_ENV)?;

        let mut builder = RedisConfigBuilder::new().url(url).token(token);

        if let Some(pool_size) = non_empty("REDIS_POOL_SIZE")
            && let Ok(size) = pool_size.parse() {
                builder = builder.pool_size(size);
            }

        if let Some(db) = non_empty("REDIS_DATABASE")
            && let Ok(db_num) = db.parse() {
                builder = builder.database(db_num);
            }

        if let Some(username) = non_empty("REDIS_USERNAME") {
            builder = builder.username(username);
        }

        if let Some(tls) = non_empty("REDIS_TLS")
            && matches!(tls.to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
                builder = builder.tls(true);
            }

        Some(builder.build())
    }

    /// Get the full Redis URL with auth and database.
    ///
    /// Username and token are percent-encoded into the userinfo, so tokens
    /// containing reserved characters (`/`, `#`, `@`, `=`) still parse. An
    /// endpoint that is not a URL is returned unchanged and rejected when the
    /// pool is built.
    pub fn connection_url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.url) else {
            return self.url.clone();
        };

        if let Some(token) = &self.token {
            let username = self.username.as_deref().unwrap_or("");
            if url.set_username(username).is_err() || url.set_password(Some(token)).is_err() {
                return self.url.clone();
            }
        }

        if let Some(db) = self.database
            && matches!(url.path(), "" | "/")
        {
            url.set_path(&format!("/{db}"));
        }

        url.to_string()
    }

    /// Endpoint with credentials stripped, safe for logs.
    pub fn redacted_url(&self) -> String {
        match self.url.find('@') {
            Some(at) => {
                let scheme_end = self.url.find("://").map(|i| i + 3).unwrap_or(0);
                format!("{}***{}", &self.url[..scheme_end], &self.url[at..])
            }
            None => self.url.clone(),
        }
    }
}

/// Builder for Redis configuration.
#[derive(Default)]
pub struct RedisConfigBuilder {
    config: RedisConfig,
}

impl RedisConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: RedisConfig::default(),
        }
    }

    /// Set the Redis endpoint.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        if self.config.tls {
            self.config.url = self.config.url.replacen("redis://", "rediss://", 1);
        }
        self
    }

    /// Set the auth token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Set the username (Redis 6+ ACL).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    /// Set the pool size.
    pub fn pool_size(mut self, size: u32) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the minimum idle connections.
    pub fn min_idle(mut self, min_idle: u32) -> Self {
        self.config.min_idle = Some(min_idle);
        self
    }

    /// Set the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    /// Set the database number.
    pub fn database(mut self, db: u8) -> Self {
        self.config.database = Some(db);
        self
    }

    /// Enable TLS.
    pub fn tls(mut self, enabled: bool) -> Self {
        self.config.tls = enabled;
        if enabled && self.config.url.starts_with("redis://") {
            self.config.url = self.config.url.replacen("redis://", "rediss://", 1);
        }
        self
    }

    /// Build the configuration.
    pub fn build(self) -> RedisConfig {
        self.config
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
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
