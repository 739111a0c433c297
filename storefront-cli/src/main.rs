//! Storefront CLI - operational tools for the tenant cache.
//!
//! # Commands
//!
//! - `storefront warm-cache` - Load every tenant into the cache
//! - `storefront invalidate` - Drop tenant cache entries
//! - `storefront resolve` - Resolve a host or identifier to a tenant
//! - `storefront status` - Check cache and database health

use clap::{ArgGroup, Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use storefront_tenancy::RequestHints;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod error;

use commands::{invalidate, resolve, status, warm};
use context::AppContext;
use error::{CliError, CliResult};

/// Storefront CLI - tenant cache operations
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "🏪 Operational CLI for storefront tenant resolution and cache invalidation")]
#[command(long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = format!(
    "{}\n  {} storefront warm-cache\n  {} storefront invalidate --tenant-id t1\n  {} storefront resolve --host acme.example.com --base-domain example.com\n  {} storefront status",
    "Examples:".bright_cyan().bold(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
    "$".dimmed(),
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all tenants and populate the cache
    #[command(visible_alias = "warm")]
    WarmCache,

    /// Drop tenant cache entries
    Invalidate(InvalidateArgs),

    /// Resolve a tenant the way an inbound request would
    Resolve(ResolveArgs),

    /// Check cache and database health
    Status,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["tenant_id", "subdomain", "pattern", "all"]),
))]
struct InvalidateArgs {
    /// Tenant id; its current identifiers are looked up
    #[arg(long)]
    tenant_id: Option<String>,

    /// Subdomain to drop
    #[arg(long)]
    subdomain: Option<String>,

    /// Custom domain to drop alongside the subdomain
    #[arg(long, requires = "subdomain")]
    custom_domain: Option<String>,

    /// Glob over identifiers, e.g. "acme-*"
    #[arg(long)]
    pattern: Option<String>,

    /// Drop every tenant entry
    #[arg(long)]
    all: bool,
}

impl InvalidateArgs {
    fn into_target(self) -> invalidate::Target {
        if let Some(id) = self.tenant_id {
            invalidate::Target::TenantId(id)
        } else if let Some(subdomain) = self.subdomain {
            invalidate::Target::Identifiers {
                subdomain,
                custom_domain: self.custom_domain,
            }
        } else if let Some(pattern) = self.pattern {
            invalidate::Target::Pattern(pattern)
        } else {
            invalidate::Target::All
        }
    }
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("hint")
        .required(true)
        .args(["subdomain", "custom_domain", "host"]),
))]
struct ResolveArgs {
    /// Subdomain hint
    #[arg(long)]
    subdomain: Option<String>,

    /// Custom domain hint
    #[arg(long)]
    custom_domain: Option<String>,

    /// Full request host, split against --base-domain
    #[arg(long, requires = "base_domain")]
    host: Option<String>,

    /// Platform base domain used with --host
    #[arg(long, env = "STOREFRONT_BASE_DOMAIN")]
    base_domain: Option<String>,

    /// Print the tenant as JSON
    #[arg(long)]
    json: bool,
}

impl ResolveArgs {
    fn hints(&self) -> RequestHints {
        match (&self.host, &self.base_domain) {
            (Some(host), Some(base)) => RequestHints::from_host(host, base),
            _ => {
                let mut hints = RequestHints::new();
                if let Some(subdomain) = &self.subdomain {
                    hints = hints.with_subdomain(subdomain.as_str());
                }
                if let Some(domain) = &self.custom_domain {
                    hints = hints.with_custom_domain(domain.as_str());
                }
                hints
            }
        }
    }
}

fn load_env(path: Option<&PathBuf>) -> CliResult<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| CliError::EnvFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool, color: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(color)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(command: Commands, quiet: bool) -> CliResult<()> {
    match command {
        Commands::WarmCache => {
            let ctx = AppContext::from_env().await?;
            warm::run(&ctx, quiet).await
        }

        Commands::Invalidate(args) => {
            let ctx = AppContext::from_env().await?;
            invalidate::run(&ctx, args.into_target(), quiet).await
        }

        Commands::Resolve(args) => {
            let ctx = AppContext::from_env().await?;
            resolve::run(&ctx, args.hints(), args.json).await
        }

        Commands::Status => status::run(quiet).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Handle color preferences
    if cli.no_color {
        colored::control::set_override(false);
    }

    let result: CliResult<()> = match load_env(cli.env_file.as_ref()) {
        Ok(()) => {
            init_tracing(cli.verbose, cli.quiet, !cli.no_color);
            dispatch(cli.command, cli.quiet).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use storefront_tenancy::TenantIdentifier;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    fn invalidate_target(args: &[&str]) -> invalidate::Target {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Invalidate(args) => args.into_target(),
            _ => panic!("expected invalidate"),
        }
    }

    #[test]
    fn test_invalidate_targets() {
        assert_eq!(
            invalidate_target(&["storefront", "invalidate", "--tenant-id", "t1"]),
            invalidate::Target::TenantId("t1".into())
        );
        assert_eq!(
            invalidate_target(&[
                "storefront",
                "invalidate",
                "--subdomain",
                "acme",
                "--custom-domain",
                "shop.acme.com"
            ]),
            invalidate::Target::Identifiers {
                subdomain: "acme".into(),
                custom_domain: Some("shop.acme.com".into()),
            }
        );
        assert_eq!(
            invalidate_target(&["storefront", "invalidate", "--all"]),
            invalidate::Target::All
        );
    }

    #[test]
    fn test_invalidate_requires_exactly_one_target() {
        assert!(Cli::try_parse_from(["storefront", "invalidate"]).is_err());
        assert!(Cli::try_parse_from(["storefront", "invalidate", "--all", "--tenant-id", "t1"]).is_err());
        assert!(
            Cli::try_parse_from(["storefront", "invalidate", "--custom-domain", "shop.acme.com"])
                .is_err()
        );
    }

    #[test]
    fn test_resolve_host_hints() {
        let cli = Cli::try_parse_from([
            "storefront",
            "resolve",
            "--host",
            "acme.example.com",
            "--base-domain",
            "example.com",
        ])
        .unwrap();
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(
            args.hints().identifier(),
            Some(TenantIdentifier::Subdomain("acme".into()))
        );
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["storefront", "-v", "-q", "status"]).is_err());
    }
}
