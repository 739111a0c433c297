//! Status command - report cache and database health.

use colored::Colorize;
use storefront_cache::{CacheClient, CacheConfig};
use storefront_db::{Database, DatabaseConfig, DatabaseHealth};

use crate::commands::spinner;
use crate::error::{CliError, CliResult};

/// Health of each backend
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Redacted cache endpoint, `None` when caching is disabled
    pub cache_endpoint: Option<String>,
    /// Whether the cache answered a ping
    pub cache_healthy: bool,
    /// Database health, or the reason it could not be checked
    pub database: Result<DatabaseHealth, String>,
}

impl StatusReport {
    /// Whether every configured backend is reachable.
    ///
    /// A disabled cache is not a failure.
    pub fn is_healthy(&self) -> bool {
        let cache_ok = self.cache_endpoint.is_none() || self.cache_healthy;
        let db_ok = matches!(&self.database, Ok(health) if health.is_healthy);
        cache_ok && db_ok
    }
}

/// Check the cache through an already-built client and the database from config.
pub async fn check_health(
    cache_config: &CacheConfig,
    client: &CacheClient,
    db_config: Result<DatabaseConfig, String>,
) -> StatusReport {
    let cache_endpoint = cache_config.redis.as_ref().map(|r| r.redacted_url());
    let cache_healthy = client.health_check().await;

    let database = match db_config {
        Ok(config) => match Database::connect(config).await {
            Ok(db) => Ok(db.health_check().await),
            Err(e) => Err(e.to_string()),
        },
        Err(e) => Err(e),
    };

    StatusReport {
        cache_endpoint,
        cache_healthy,
        database,
    }
}

/// Print cache and database health. Fails when a configured backend is down.
pub async fn run(quiet: bool) -> CliResult<()> {
    let pb = spinner("Checking backends...", quiet);
    let cache_config = CacheConfig::from_env();
    let client = CacheClient::from_config(&cache_config);
    let report = check_health(
        &cache_config,
        &client,
        DatabaseConfig::from_env().map_err(|e| e.to_string()),
    )
    .await;
    pb.finish_and_clear();

    if !quiet {
        print_report(&report, &cache_config);
    }

    if report.is_healthy() {
        Ok(())
    } else {
        Err(CliError::Incomplete(
            "one or more backends are unreachable".to_string(),
        ))
    }
}

fn print_report(report: &StatusReport, cache_config: &CacheConfig) {
    println!();
    println!("  {}", "Cache".bright_cyan().bold());
    match &report.cache_endpoint {
        Some(endpoint) => {
            println!("  {} {}", "Endpoint:".bright_white().bold(), endpoint);
            let state = if report.cache_healthy {
                "reachable".green()
            } else {
                "unreachable".red()
            };
            println!("  {} {}", "State:".bright_white().bold(), state);
            println!(
                "  {} {}ms",
                "Timeout:".bright_white().bold(),
                cache_config.operation_timeout.as_millis()
            );
        }
        None => println!(
            "  {} {}",
            "State:".bright_white().bold(),
            "disabled (REDIS_URL / REDIS_TOKEN not set)".yellow()
        ),
    }

    println!();
    println!("  {}", "Database".bright_cyan().bold());
    match &report.database {
        Ok(health) if health.is_healthy => {
            println!("  {} {}", "State:".bright_white().bold(), "reachable".green());
            println!(
                "  {} {}ms",
                "Latency:".bright_white().bold(),
                health.response_time_ms
            );
        }
        Ok(health) => {
            println!("  {} {}", "State:".bright_white().bold(), "unhealthy".red());
            if let Some(error) = &health.error {
                println!("  {} {}", "Error:".bright_white().bold(), error);
            }
        }
        Err(reason) => {
            println!("  {} {}", "State:".bright_white().bold(), "unavailable".red());
            println!("  {} {}", "Error:".bright_white().bold(), reason);
        }
    }
    println!();
}
