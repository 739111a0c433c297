//! Tenant Model
//!
//! The tenant record, partial updates, hostname identifiers and the
//! request-scoped tenant context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::error::TenantError;

/// Opaque per-tenant settings.
pub type TenantSettings = serde_json::Map<String, serde_json::Value>;

/// Tenant lifecycle status.
///
/// Unknown values from the source of truth are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TenantStatus {
    /// Serving traffic
    #[default]
    Active,
    /// Temporarily disabled
    Suspended,
    /// Any other stored value
    Other(String),
}

impl TenantStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Other(s) => s,
        }
    }

    /// Whether the tenant may serve requests.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<String> for TenantStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => Self::Active,
            "suspended" => Self::Suspended,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for TenantStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<TenantStatus> for String {
    fn from(status: TenantStatus) -> Self {
        match status {
            TenantStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenant {
    /// Stable identifier, never changes
    pub id: String,

    /// Unique subdomain label
    pub subdomain: String,

    /// Unique custom domain, if the tenant has one
    pub custom_domain: Option<String>,

    /// Display name
    pub name: String,

    /// Opaque settings map
    #[serde(default)]
    pub settings: TenantSettings,

    /// Lifecycle status
    #[serde(default)]
    pub status: TenantStatus,

    /// Plan tier, e.g. `free`
    pub tier: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new active tenant on the free tier
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_tenancy::Tenant;
    ///
    /// let tenant = Tenant::new("t1", "acme", "Acme Corp");
    /// assert!(tenant.is_active());
    /// ```
    pub fn new(id: impl Into<String>, subdomain: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            subdomain: subdomain.into(),
            custom_domain: None,
            name: name.into(),
            settings: TenantSettings::new(),
            status: TenantStatus::Active,
            tier: "free".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set custom domain
    pub fn with_custom_domain(mut self, domain: impl Into<String>) -> Self {
        self.custom_domain = Some(domain.into());
        self
    }

    /// Set status
    pub fn with_status(mut self, status: TenantStatus) -> Self {
        self.status = status;
        self
    }

    /// Set tier
    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = tier.into();
        self
    }

    /// Add a setting
    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Whether the tenant may serve requests
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Every hostname identifier this tenant currently owns
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_tenancy::{Tenant, TenantIdentifier};
    ///
    /// let tenant = Tenant::new("t1", "acme", "Acme").with_custom_domain("shop.acme.com");
    /// assert_eq!(
    ///     tenant.identifiers(),
    ///     vec![
    ///         TenantIdentifier::Subdomain("acme".into()),
    ///         TenantIdentifier::CustomDomain("shop.acme.com".into()),
    ///     ]
    /// );
    /// ```
    pub fn identifiers(&self) -> Vec<TenantIdentifier> {
        let mut identifiers = vec![TenantIdentifier::Subdomain(self.subdomain.clone())];
        if let Some(domain) = &self.custom_domain {
            identifiers.push(TenantIdentifier::CustomDomain(domain.clone()));
        }
        identifiers
    }
}

/// A hostname-derived key that maps to at most one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TenantIdentifier {
    /// Subdomain label under the platform domain
    Subdomain(String),
    /// Tenant-owned domain
    CustomDomain(String),
}

impl TenantIdentifier {
    /// The raw identifier string.
    pub fn value(&self) -> &str {
        match self {
            Self::Subdomain(v) | Self::CustomDomain(v) => v,
        }
    }

    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Subdomain(_) => "subdomain",
            Self::CustomDomain(_) => "custom_domain",
        }
    }
}

impl fmt::Display for TenantIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind(), self.value())
    }
}

/// Hostname hints supplied by the edge for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHints {
    /// Subdomain label, if the request came in under the platform domain
    pub subdomain: Option<String>,
    /// Full host, if the request came in on a tenant-owned domain
    pub custom_domain: Option<String>,
}

impl RequestHints {
    /// Empty hints
    pub fn new() -> Self {
        Self::default()
    }

    /// Hint a subdomain
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    /// Hint a custom domain
    pub fn with_custom_domain(mut self, domain: impl Into<String>) -> Self {
        self.custom_domain = Some(domain.into());
        self
    }

    /// Derive hints from a `Host` header value.
    ///
    /// The port is dropped and the host lower-cased. `<label>.<base>` yields a
    /// subdomain hint; the bare base domain, `www.<base>` and deeper names
    /// under the base yield nothing; anything else is a custom domain. IP
    /// literals, including bracketed IPv6 such as `[::1]:8080`, yield nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_tenancy::RequestHints;
    ///
    /// let hints = RequestHints::from_host("Acme.Example.com:443", "example.com");
    /// assert_eq!(hints.subdomain.as_deref(), Some("acme"));
    ///
    /// let hints = RequestHints::from_host("shop.acme.com", "example.com");
    /// assert_eq!(hints.custom_domain.as_deref(), Some("shop.acme.com"));
    /// ```
    pub fn from_host(host: &str, base_domain: &str) -> Self {
        let host = host.trim();
        // IPv6 literal, bracketed or bare
        if host.starts_with('[') || host.matches(':').count() > 1 {
            return Self::new();
        }
        let host = host.split(':').next().unwrap_or(host);
        if host.parse::<IpAddr>().is_ok() {
            return Self::new();
        }
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let base = base_domain.trim().trim_end_matches('.').to_ascii_lowercase();

        if host.is_empty() || host == base {
            return Self::new();
        }

        match host.strip_suffix(&format!(".{base}")) {
            Some(label) if label == "www" || label.is_empty() || label.contains('.') => Self::new(),
            Some(label) => Self::new().with_subdomain(label),
            None => Self::new().with_custom_domain(host),
        }
    }

    /// The identifier to resolve; the subdomain wins when both are present.
    pub fn identifier(&self) -> Option<TenantIdentifier> {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        non_empty(&self.subdomain)
            .map(TenantIdentifier::Subdomain)
            .or_else(|| non_empty(&self.custom_domain).map(TenantIdentifier::CustomDomain))
    }

    /// Whether both hints are present.
    pub fn is_ambiguous(&self) -> bool {
        self.subdomain.as_deref().is_some_and(|s| !s.trim().is_empty())
            && self.custom_domain.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Whether no hint is present.
    pub fn is_empty(&self) -> bool {
        self.identifier().is_none()
    }
}

/// Partial tenant update.
///
/// `custom_domain` is tri-state: `None` leaves it untouched, `Some(None)`
/// clears it, `Some(Some(d))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantPatch {
    /// New subdomain
    pub subdomain: Option<String>,
    /// New custom domain, or removal
    pub custom_domain: Option<Option<String>>,
    /// New display name
    pub name: Option<String>,
    /// Replacement settings map
    pub settings: Option<TenantSettings>,
    /// New status
    pub status: Option<TenantStatus>,
    /// New tier
    pub tier: Option<String>,
}

impl TenantPatch {
    /// Empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Set subdomain
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    /// Set or clear the custom domain
    pub fn with_custom_domain(mut self, domain: Option<String>) -> Self {
        self.custom_domain = Some(domain);
        self
    }

    /// Set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace settings
    pub fn with_settings(mut self, settings: TenantSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set status
    pub fn with_status(mut self, status: TenantStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set tier
    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = Some(tier.into());
        self
    }

    /// Whether the patch touches nothing
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether applying this patch changes the subdomain or custom domain of
    /// `tenant`.
    pub fn changes_identifiers(&self, tenant: &Tenant) -> bool {
        let subdomain_changed = self
            .subdomain
            .as_ref()
            .is_some_and(|s| s != &tenant.subdomain);
        let domain_changed = self
            .custom_domain
            .as_ref()
            .is_some_and(|d| d != &tenant.custom_domain);
        subdomain_changed || domain_changed
    }

    /// Reject values no tenant may hold.
    pub fn validate(&self) -> Result<(), TenantError> {
        if let Some(subdomain) = &self.subdomain
            && subdomain.trim().is_empty() {
                return Err(TenantError::Invalid("subdomain must not be empty".into()));
            }
        if let Some(Some(domain)) = &self.custom_domain
            && domain.trim().is_empty() {
                return Err(TenantError::Invalid("custom domain must not be empty".into()));
            }
        if let Some(name) = &self.name
            && name.trim().is_empty() {
                return Err(TenantError::Invalid("name must not be empty".into()));
            }
        Ok(())
    }

    /// The tenant as it looks after this patch, with `updated_at` bumped.
    pub fn apply_to(&self, tenant: &Tenant) -> Tenant {
        let mut updated = tenant.clone();
        if let Some(subdomain) = &self.subdomain {
            updated.subdomain = subdomain.clone();
        }
        if let Some(domain) = &self.custom_domain {
            updated.custom_domain = domain.clone();
        }
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(settings) = &self.settings {
            updated.settings = settings.clone();
        }
        if let Some(status) = &self.status {
            updated.status = status.clone();
        }
        if let Some(tier) = &self.tier {
            updated.tier = tier.clone();
        }
        updated.updated_at = Utc::now();
        updated
    }
}

/// Tenant context stored in request
#[derive(Debug, Clone, Default)]
pub struct TenantContext {
    tenant: Option<Tenant>,
}

impl TenantContext {
    /// Create empty tenant context
    pub fn new() -> Self {
        Self { tenant: None }
    }

    /// Create with tenant
    pub fn with_tenant(tenant: Tenant) -> Self {
        Self {
            tenant: Some(tenant),
        }
    }

    /// Get tenant
    pub fn tenant(&self) -> Option<&Tenant> {
        self.tenant.as_ref()
    }

    /// Get tenant ID
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().map(|t| t.id.as_str())
    }

    /// Check if tenant is set
    pub fn has_tenant(&self) -> bool {
        self.tenant.is_some()
    }
}

impl From<Option<Tenant>> for TenantContext {
    fn from(tenant: Option<Tenant>) -> Self {
        Self { tenant }
    }
}
