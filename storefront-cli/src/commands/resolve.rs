//! Resolve command - look up a tenant the way a request would.

use colored::Colorize;
use storefront_tenancy::{RequestHints, Tenant, TenantResolver};

use crate::context::AppContext;
use crate::error::{CliError, CliResult};

/// Resolve hints to a tenant and print it, with where the answer came from.
pub async fn run(ctx: &AppContext, hints: RequestHints, json: bool) -> CliResult<()> {
    let Some(identifier) = hints.identifier() else {
        return Err(CliError::InvalidArgument(
            "no subdomain or custom domain to resolve".to_string(),
        ));
    };

    let resolver = TenantResolver::new(ctx.cache.clone(), ctx.repository.clone());
    let before = ctx.cache.client().stats();
    let tenant = resolver.resolve(&hints).await?;
    let from_cache = ctx.cache.client().stats().hits > before.hits;

    if json {
        let out = serde_json::to_string_pretty(&tenant)
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    println!();
    println!(
        "  {} {} ({})",
        "Lookup:".bright_white().bold(),
        identifier.value().cyan(),
        identifier.kind()
    );

    match tenant {
        Some(tenant) => {
            print_tenant(&tenant);
            let source = if from_cache { "cache" } else { "database" };
            println!("  {} {}", "Source:".bright_white().bold(), source.dimmed());
        }
        None => println!("  {} {}", "⚠".yellow(), "No tenant found".yellow()),
    }
    println!();

    Ok(())
}

fn print_tenant(tenant: &Tenant) {
    let status = if tenant.is_active() {
        tenant.status.as_str().green()
    } else {
        tenant.status.as_str().red()
    };

    println!("  {} {}", "Tenant:".bright_white().bold(), tenant.id);
    println!("  {} {}", "Name:".bright_white().bold(), tenant.name);
    println!("  {} {}", "Subdomain:".bright_white().bold(), tenant.subdomain);
    if let Some(domain) = &tenant.custom_domain {
        println!("  {} {}", "Domain:".bright_white().bold(), domain);
    }
    println!("  {} {}", "Status:".bright_white().bold(), status);
    println!("  {} {}", "Tier:".bright_white().bold(), tenant.tier);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storefront_cache::{CacheClient, InMemoryCache};
    use storefront_tenancy::InMemoryTenantRepository;

    fn context() -> (AppContext, Arc<InMemoryTenantRepository>) {
        let repo = Arc::new(
            InMemoryTenantRepository::with_tenants([Tenant::new("t1", "acme", "Acme")]).unwrap(),
        );
        let client = CacheClient::enabled(Arc::new(InMemoryCache::new()));
        (AppContext::new(client, repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_resolve_populates_then_hits() {
        let (ctx, repo) = context();
        let hints = RequestHints::new().with_subdomain("acme");

        run(&ctx, hints.clone(), true).await.unwrap();
        run(&ctx, hints, true).await.unwrap();

        assert_eq!(repo.query_count(), 1);
        assert_eq!(ctx.cache.client().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_empty_hints_are_rejected() {
        let (ctx, _) = context();
        let err = run(&ctx, RequestHints::new(), true).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }
}
