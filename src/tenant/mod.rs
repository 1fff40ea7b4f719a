//! Tenant and organization lookup.
//!
//! Requests identify tenants either by id or by domain. The directory maps a
//! domain to its tenant id and a tenant to the organization whose templates act
//! as defaults for it. Identity management is not part of this crate; hosts
//! plug in their own [`TenantDirectory`] or populate [`StaticTenantDirectory`].

use async_trait::async_trait;
use dashmap::DashMap;

use crate::config::TenantConfig;
use crate::error::Result;

/// Resolves tenant domains and parent organizations
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Tenant id registered for `tenant_domain`
    async fn tenant_id(&self, tenant_domain: &str) -> Result<Option<String>>;

    /// Organization whose templates are the defaults for `tenant_id`
    async fn organization_of(&self, tenant_id: &str) -> Result<Option<String>>;
}

/// In-memory tenant directory
pub struct StaticTenantDirectory {
    /// tenant domain -> tenant id
    domains: DashMap<String, String>,
    /// tenant id -> organization id
    organizations: DashMap<String, String>,
    /// Map unregistered domains to a tenant id equal to the domain
    passthrough: bool,
}

impl Default for StaticTenantDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticTenantDirectory {
    /// Create a directory that only knows registered tenants
    pub fn new() -> Self {
        Self {
            domains: DashMap::new(),
            organizations: DashMap::new(),
            passthrough: false,
        }
    }

    /// Create a directory where every domain is its own tenant id
    pub fn passthrough() -> Self {
        Self {
            passthrough: true,
            ..Self::new()
        }
    }

    /// Build a directory from the `tenant` settings section
    pub fn from_config(config: &TenantConfig) -> Self {
        let directory = if config.passthrough {
            Self::passthrough()
        } else {
            Self::new()
        };
        for (domain, tenant_id) in &config.domains {
            directory.register_tenant(domain.as_str(), tenant_id.as_str());
        }
        for (tenant_id, organization_id) in &config.organizations {
            directory.set_organization(tenant_id.as_str(), organization_id.as_str());
        }
        directory
    }

    /// Register a tenant domain
    pub fn register_tenant(&self, tenant_domain: impl Into<String>, tenant_id: impl Into<String>) {
        self.domains.insert(tenant_domain.into(), tenant_id.into());
    }

    /// Attach a tenant to its parent organization
    pub fn set_organization(&self, tenant_id: impl Into<String>, organization_id: impl Into<String>) {
        self.organizations
            .insert(tenant_id.into(), organization_id.into());
    }

    /// Builder-style registration of a tenant under an organization
    pub fn with_tenant(
        self,
        tenant_domain: &str,
        tenant_id: &str,
        organization_id: Option<&str>,
    ) -> Self {
        self.register_tenant(tenant_domain, tenant_id);
        if let Some(org) = organization_id {
            self.set_organization(tenant_id, org);
        }
        self
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn tenant_id(&self, tenant_domain: &str) -> Result<Option<String>> {
        if let Some(id) = self.domains.get(tenant_domain) {
            return Ok(Some(id.clone()));
        }
        if self.passthrough && !tenant_domain.is_empty() {
            return Ok(Some(tenant_domain.to_string()));
        }
        Ok(None)
    }

    async fn organization_of(&self, tenant_id: &str) -> Result<Option<String>> {
        Ok(self.organizations.get(tenant_id).map(|org| org.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_tenant() {
        let directory =
            StaticTenantDirectory::new().with_tenant("acme.com", "t-acme", Some("org-root"));

        assert_eq!(
            directory.tenant_id("acme.com").await.unwrap().as_deref(),
            Some("t-acme")
        );
        assert_eq!(
            directory.organization_of("t-acme").await.unwrap().as_deref(),
            Some("org-root")
        );
    }

    #[tokio::test]
    async fn test_unknown_domain_strict() {
        let directory = StaticTenantDirectory::new();
        assert!(directory.tenant_id("globex.com").await.unwrap().is_none());
        assert!(directory.organization_of("globex.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_config() {
        let mut config = TenantConfig::default();
        config
            .domains
            .insert("acme.com".to_string(), "t-acme".to_string());
        config
            .organizations
            .insert("globex.com".to_string(), "org-root".to_string());
        let directory = StaticTenantDirectory::from_config(&config);

        assert_eq!(
            directory.tenant_id("acme.com").await.unwrap().as_deref(),
            Some("t-acme")
        );
        // Passthrough tenants can still have an organization
        assert_eq!(
            directory.tenant_id("globex.com").await.unwrap().as_deref(),
            Some("globex.com")
        );
        assert_eq!(
            directory.organization_of("globex.com").await.unwrap().as_deref(),
            Some("org-root")
        );
    }

    #[tokio::test]
    async fn test_unknown_domain_passthrough() {
        let directory = StaticTenantDirectory::passthrough();
        assert_eq!(
            directory.tenant_id("globex.com").await.unwrap().as_deref(),
            Some("globex.com")
        );
        assert!(directory.tenant_id("").await.unwrap().is_none());
    }
}
