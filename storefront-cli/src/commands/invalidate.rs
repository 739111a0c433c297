//! Invalidate command - drop tenant cache entries.

use colored::Colorize;
use storefront_tenancy::InvalidationService;

use crate::context::AppContext;
use crate::error::{CliError, CliResult};

/// What to invalidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Look up the tenant and drop both of its entries
    TenantId(String),
    /// Drop explicit identifiers without a lookup
    Identifiers {
        subdomain: String,
        custom_domain: Option<String>,
    },
    /// Drop identifiers matching a glob
    Pattern(String),
    /// Drop every tenant entry
    All,
}

/// Run an invalidation and print how many entries were removed.
pub async fn run(ctx: &AppContext, target: Target, quiet: bool) -> CliResult<()> {
    if !ctx.cache.is_enabled() && !quiet {
        println!();
        println!("  {} Cache is not configured; nothing to invalidate", "⚠".yellow());
    }

    let service = InvalidationService::new(ctx.cache.clone(), ctx.repository.clone());

    let deleted = match &target {
        Target::TenantId(id) => service
            .invalidate_tenant_by_id(id)
            .await?
            .ok_or_else(|| CliError::InvalidArgument(format!("no tenant with id '{id}'")))?,
        Target::Identifiers {
            subdomain,
            custom_domain,
        } => {
            service
                .invalidate_tenant_cache(subdomain, custom_domain.as_deref())
                .await
        }
        Target::Pattern(pattern) => service.invalidate_pattern(pattern).await,
        Target::All => service.invalidate_all_tenants().await,
    };

    if !quiet {
        println!();
        println!("  {} {}", "Target:".bright_white().bold(), describe(&target));
        println!(
            "  {} {}",
            "Deleted:".bright_white().bold(),
            deleted.to_string().cyan()
        );
        println!();
    }

    Ok(())
}

fn describe(target: &Target) -> String {
    match target {
        Target::TenantId(id) => format!("tenant {id}"),
        Target::Identifiers {
            subdomain,
            custom_domain: Some(domain),
        } => format!("{subdomain}, {domain}"),
        Target::Identifiers { subdomain, .. } => subdomain.clone(),
        Target::Pattern(pattern) => format!("pattern {pattern}"),
        Target::All => "all tenants".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use storefront_cache::{CacheClient, CacheStore, InMemoryCache};
    use storefront_tenancy::{InMemoryTenantRepository, Tenant};

    async fn setup() -> (AppContext, InMemoryCache) {
        let repo = Arc::new(
            InMemoryTenantRepository::with_tenants([
                Tenant::new("t1", "acme", "Acme").with_custom_domain("shop.acme.com"),
                Tenant::new("t2", "globex", "Globex"),
            ])
            .unwrap(),
        );
        let store = InMemoryCache::new();
        let ttl = Duration::from_secs(300);
        for key in ["tenant:acme", "tenant:shop.acme.com", "tenant:globex", "product:1"] {
            store.set(key, "{}".to_string(), ttl).await.unwrap();
        }
        let ctx = AppContext::new(CacheClient::enabled(Arc::new(store.clone())), repo);
        (ctx, store)
    }

    #[tokio::test]
    async fn test_invalidate_by_tenant_id() {
        let (ctx, store) = setup().await;
        run(&ctx, Target::TenantId("t1".into()), true).await.unwrap();

        assert!(!store.contains_key("tenant:acme").await);
        assert!(!store.contains_key("tenant:shop.acme.com").await);
        assert!(store.contains_key("tenant:globex").await);
    }

    #[tokio::test]
    async fn test_unknown_tenant_id_is_an_error() {
        let (ctx, _) = setup().await;
        let err = run(&ctx, Target::TenantId("nope".into()), true)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_invalidate_all_keeps_other_namespaces() {
        let (ctx, store) = setup().await;
        run(&ctx, Target::All, true).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert!(store.contains_key("product:1").await);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&Target::Identifiers {
                subdomain: "acme".into(),
                custom_domain: Some("shop.acme.com".into()),
            }),
            "acme, shop.acme.com"
        );
        assert_eq!(describe(&Target::All), "all tenants");
    }
}
