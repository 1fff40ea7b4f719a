//! Resolution cache tiers.
//!
//! Four independent tiers back the resolver:
//!
//! | Tier | Key | Value |
//! |------|-----|-------|
//! | `template_types` | (tenant, channel) | template types of the tenant |
//! | `app_templates` | (tenant, application, channel) | application-level templates |
//! | `resolved` | [`TemplateKey`] | the template a lookup resolved to |
//! | `org_templates` | (organization, application?, channel) | organization-level templates |
//!
//! Every key embeds the tenant or organization it belongs to, so an entry can
//! never be served to another tenant. Entries are invalidated by the template
//! write path through [`TemplateCaches::apply_change`]; the resolver itself
//! only reads and populates.

mod tier;

use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::{EngineError, Result};
use crate::notification::Channel;
use crate::template::{Template, TemplateKey, TemplateScope};

pub use tier::CacheTier;

/// Key of the per-tenant template type list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeListKey {
    pub tenant_id: String,
    pub channel: Channel,
}

/// Key of an application's template list within a tenant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppTemplateListKey {
    pub tenant_id: String,
    pub application_id: String,
    pub channel: Channel,
}

/// Key of an organization's template list, optionally for one application
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrgTemplateListKey {
    pub organization_id: String,
    pub application_id: Option<String>,
    pub channel: Channel,
}

/// A write to the template store that cached data may depend on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChange {
    pub scope: TemplateScope,
    pub channel: Channel,
    pub template_type: String,
}

impl TemplateChange {
    pub fn new(scope: TemplateScope, channel: Channel, template_type: impl Into<String>) -> Self {
        Self {
            scope,
            channel,
            template_type: template_type.into(),
        }
    }

    /// Build a change from the store path that was written, e.g.
    /// `/identity/email/passwordReset`.
    ///
    /// Fails with [`EngineError::InvalidChannel`] for paths outside the
    /// channel layout and [`EngineError::InvalidTemplate`] for a bare
    /// channel path.
    pub fn from_path(scope: TemplateScope, path: &str) -> Result<Self> {
        let channel = Channel::from_path(path)?;
        let template_type = path
            .strip_prefix(channel.base_path())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|template_type| !template_type.is_empty() && !template_type.contains('/'))
            .ok_or_else(|| {
                EngineError::InvalidTemplate(format!("No template type in path {}", path))
            })?;
        Ok(Self::new(scope, channel, template_type))
    }
}

/// The four cache tiers used by the resolver
pub struct TemplateCaches {
    pub template_types: CacheTier<TypeListKey, Arc<Vec<String>>>,
    pub app_templates: CacheTier<AppTemplateListKey, Arc<Vec<Template>>>,
    pub resolved: CacheTier<TemplateKey, Arc<Template>>,
    pub org_templates: CacheTier<OrgTemplateListKey, Arc<Vec<Template>>>,
}

impl TemplateCaches {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            template_types: CacheTier::new("template_types", config),
            app_templates: CacheTier::new("app_templates", config),
            resolved: CacheTier::new("resolved_template", config),
            org_templates: CacheTier::new("org_templates", config),
        }
    }

    /// Drop every entry that may reflect the store state before `change`.
    ///
    /// Returns the number of entries removed across all tiers.
    pub fn apply_change(&self, change: &TemplateChange) -> usize {
        let channel = change.channel;
        let template_type = change.template_type.as_str();

        let removed = match &change.scope {
            TemplateScope::Tenant { tenant_id } => {
                let types = usize::from(self.template_types.invalidate(&TypeListKey {
                    tenant_id: tenant_id.clone(),
                    channel,
                }));
                types
                    + self.resolved.invalidate_where(|key| {
                        &key.tenant_id == tenant_id
                            && key.channel == channel
                            && key.template_type == template_type
                    })
            }
            TemplateScope::Application {
                tenant_id,
                application_id,
            } => {
                let apps = usize::from(self.app_templates.invalidate(&AppTemplateListKey {
                    tenant_id: tenant_id.clone(),
                    application_id: application_id.clone(),
                    channel,
                }));
                apps + self.resolved.invalidate_where(|key| {
                    &key.tenant_id == tenant_id
                        && key.application_id.as_ref() == Some(application_id)
                        && key.channel == channel
                        && key.template_type == template_type
                })
            }
            TemplateScope::Organization {
                organization_id,
                application_id,
            } => {
                // Tenant membership of an organization is not known here, so
                // every tenant's resolution of this type is dropped.
                let orgs = self.org_templates.invalidate_where(|key| {
                    &key.organization_id == organization_id
                        && key.channel == channel
                        && &key.application_id == application_id
                });
                orgs + self.resolved.invalidate_where(|key| {
                    key.channel == channel && key.template_type == template_type
                })
            }
        };

        tracing::info!(
            scope = %change.scope,
            channel = %channel,
            template_type = %template_type,
            removed,
            "Template caches invalidated"
        );
        removed
    }

    /// Drop every entry belonging to a tenant
    pub fn invalidate_tenant(&self, tenant_id: &str) -> usize {
        self.template_types
            .invalidate_where(|key| key.tenant_id == tenant_id)
            + self
                .app_templates
                .invalidate_where(|key| key.tenant_id == tenant_id)
            + self
                .resolved
                .invalidate_where(|key| key.tenant_id == tenant_id)
    }

    /// Empty all tiers
    pub fn clear_all(&self) -> usize {
        self.template_types.clear()
            + self.app_templates.clear()
            + self.resolved.clear()
            + self.org_templates.clear()
    }
}
