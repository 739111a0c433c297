//! Warm command - load every tenant into the cache.

use colored::Colorize;
use storefront_tenancy::CacheWarmer;
use tracing::error;

use crate::commands::spinner;
use crate::context::AppContext;
use crate::error::CliResult;

/// Fetch all tenants and bulk-populate the cache.
///
/// Fails only when the tenant list cannot be fetched, whether or not the cache
/// is configured. Individual cache write failures are reported per tenant.
pub async fn run(ctx: &AppContext, quiet: bool) -> CliResult<()> {
    if !ctx.cache.is_enabled() && !quiet {
        println!();
        println!(
            "  {} Cache is not configured (REDIS_URL / REDIS_TOKEN); tenants will not be cached",
            "⚠".yellow()
        );
    }

    let pb = spinner("Fetching tenants...", quiet);
    let warmer = CacheWarmer::new(ctx.repository.clone(), ctx.cache.clone());
    let report = match warmer.run().await {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            error!(error = %e, "Failed to fetch tenants for cache warm");
            return Err(e.into());
        }
    };
    pb.finish_and_clear();

    if quiet {
        return Ok(());
    }

    println!();
    for result in &report.results {
        if result.stored {
            println!("  {} {}", "✓".green(), result.tenant_id);
        } else {
            println!("  {} {}", "✗".red(), result.tenant_id);
        }
    }

    println!();
    println!("  {} {}", "Tenants:".bright_white().bold(), report.total);
    println!(
        "  {} {}",
        "Cached:".bright_white().bold(),
        report.warmed.to_string().green()
    );
    if report.failed > 0 {
        println!(
            "  {} {}",
            "Failed:".bright_white().bold(),
            report.failed.to_string().red()
        );
    }
    println!();

    Ok(())
}
