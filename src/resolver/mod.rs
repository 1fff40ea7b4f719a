//! Template resolution.
//!
//! A lookup for `(tenant, application, channel, type, locale)` goes through:
//!
//! 1. The resolved-template cache.
//! 2. The precedence tiers at the requested locale: tenant override, then
//!    application default, then organization default.
//! 3. The same tiers again at the default locale.
//!
//! The first hit is validated, cached under the requested key and returned.
//! When every tier misses at both locales the lookup fails with
//! [`EngineError::NotFound`]; a template is never made up.

mod stats;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{AppTemplateListKey, OrgTemplateListKey, TemplateCaches, TypeListKey};
use crate::error::{EngineError, Result};
use crate::locale::LocaleNormalizer;
use crate::metrics::{ResolutionMetrics, StoreMetrics};
use crate::notification::Channel;
use crate::store::{StoreError, StoreResult, TemplateStore};
use crate::telemetry::{attributes, record_attributes};
use crate::template::{Template, TemplateKey, TemplateScope};
use crate::tenant::TenantDirectory;

pub use stats::{ResolverStats, ResolverStatsSnapshot};

/// One level of the override hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    Tenant,
    Application,
    Organization,
}

impl ResolutionTier {
    /// Tiers in precedence order
    pub const PRECEDENCE: [ResolutionTier; 3] = [
        ResolutionTier::Tenant,
        ResolutionTier::Application,
        ResolutionTier::Organization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Tenant => "tenant",
            ResolutionTier::Application => "application",
            ResolutionTier::Organization => "organization",
        }
    }
}

/// Resolves templates through the cache tiers and the template store
pub struct TemplateResolver {
    store: Arc<dyn TemplateStore>,
    tenants: Arc<dyn TenantDirectory>,
    caches: Arc<TemplateCaches>,
    locales: LocaleNormalizer,
    stats: ResolverStats,
}

impl TemplateResolver {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        tenants: Arc<dyn TenantDirectory>,
        caches: Arc<TemplateCaches>,
        locales: LocaleNormalizer,
    ) -> Self {
        Self {
            store,
            tenants,
            caches,
            locales,
            stats: ResolverStats::default(),
        }
    }

    pub fn locales(&self) -> &LocaleNormalizer {
        &self.locales
    }

    pub fn caches(&self) -> &Arc<TemplateCaches> {
        &self.caches
    }

    /// Get resolver statistics
    pub fn stats(&self) -> ResolverStatsSnapshot {
        self.stats.snapshot()
    }

    /// Resolve the template for a notification
    #[tracing::instrument(name = "resolver.resolve", skip(self))]
    pub async fn resolve(
        &self,
        tenant_id: &str,
        application_id: Option<&str>,
        channel: Channel,
        template_type: &str,
        locale: &str,
    ) -> Result<Arc<Template>> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);

        let requested = self.locales.normalize(locale);
        let key = TemplateKey::new(
            tenant_id,
            application_id,
            channel,
            template_type,
            requested.as_str(),
        );

        let span = tracing::Span::current();
        record_attributes(
            &span,
            [
                attributes::tenant_id(tenant_id),
                attributes::channel(channel),
                attributes::template_type(template_type),
                attributes::locale(&requested),
            ],
        );
        if let Some(application_id) = application_id {
            record_attributes(&span, [attributes::application_id(application_id)]);
        }

        let generation = self.caches.resolved.generation();
        if let Some(template) = self.caches.resolved.get(&key) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            ResolutionMetrics::record_outcome("cache");
            tracing::debug!(key = %key, "Resolved template from cache");
            return Ok(template);
        }

        match self.resolve_uncached(&key).await {
            Ok(Some(template)) => {
                self.caches
                    .resolved
                    .put_if_generation(key, template.clone(), generation);
                Ok(template)
            }
            Ok(None) => {
                self.stats.not_found.fetch_add(1, Ordering::Relaxed);
                ResolutionMetrics::record_outcome("not_found");
                tracing::debug!(key = %key, "No template at any tier or locale");
                Err(EngineError::NotFound {
                    tenant_id: key.tenant_id,
                    channel,
                    template_type: key.template_type,
                    locale: key.locale,
                })
            }
            Err(e) => {
                ResolutionMetrics::record_outcome("error");
                tracing::error!(key = %key, error = %e, "Template resolution failed");
                Err(e)
            }
        }
    }

    async fn resolve_uncached(&self, key: &TemplateKey) -> Result<Option<Arc<Template>>> {
        let mut locales = vec![key.locale.as_str()];
        if !self.locales.is_default(&key.locale) {
            locales.push(self.locales.default_locale());
        }

        // Looked up on first reaching the organization tier
        let mut organization: Option<Option<String>> = None;

        for locale in locales {
            for tier in ResolutionTier::PRECEDENCE {
                if tier == ResolutionTier::Organization && organization.is_none() {
                    organization = Some(self.tenants.organization_of(&key.tenant_id).await?);
                }
                let organization_id = organization.as_ref().and_then(|org| org.as_deref());

                let Some(template) = self.lookup_tier(tier, key, organization_id, locale).await?
                else {
                    continue;
                };

                if let Err(e) = template.validate() {
                    StoreMetrics::record_error("validate");
                    tracing::error!(
                        key = %key,
                        tier = tier.as_str(),
                        locale = %locale,
                        error = %e,
                        "Template store returned an invalid template"
                    );
                    return Err(StoreError::Corrupt {
                        path: key.channel.template_path(&key.template_type),
                        reason: e.to_string(),
                    }
                    .into());
                }

                if locale != key.locale {
                    self.stats.locale_fallbacks.fetch_add(1, Ordering::Relaxed);
                    ResolutionMetrics::record_locale_fallback();
                    tracing::warn!(
                        key = %key,
                        fallback_locale = %locale,
                        "Requested locale not found, using default locale"
                    );
                }
                ResolutionMetrics::record_outcome(tier.as_str());
                record_attributes(&tracing::Span::current(), [attributes::tier(tier)]);
                tracing::debug!(key = %key, tier = tier.as_str(), locale = %locale, "Resolved template");

                return Ok(Some(Arc::new(template.with_normalized_content_type())));
            }
        }

        Ok(None)
    }

    async fn lookup_tier(
        &self,
        tier: ResolutionTier,
        key: &TemplateKey,
        organization_id: Option<&str>,
        locale: &str,
    ) -> Result<Option<Template>> {
        match tier {
            ResolutionTier::Tenant => {
                let scope = TemplateScope::tenant(key.tenant_id.as_str());
                let path = key.channel.template_path(&key.template_type);
                Ok(self
                    .timed("get_template", self.store.get_template(&scope, &path, locale))
                    .await?)
            }
            ResolutionTier::Application => {
                let Some(application_id) = key.application_id.as_deref() else {
                    return Ok(None);
                };
                let templates = self
                    .application_templates(&key.tenant_id, application_id, key.channel)
                    .await?;
                Ok(find_template(&templates, &key.template_type, locale))
            }
            ResolutionTier::Organization => {
                let Some(organization_id) = organization_id else {
                    return Ok(None);
                };
                if let Some(application_id) = key.application_id.as_deref() {
                    let templates = self
                        .organization_templates(organization_id, Some(application_id), key.channel)
                        .await?;
                    if let Some(found) = find_template(&templates, &key.template_type, locale) {
                        return Ok(Some(found));
                    }
                }
                let templates = self
                    .organization_templates(organization_id, None, key.channel)
                    .await?;
                Ok(find_template(&templates, &key.template_type, locale))
            }
        }
    }

    /// Application-level templates of a tenant, served from the app list cache
    pub async fn application_templates(
        &self,
        tenant_id: &str,
        application_id: &str,
        channel: Channel,
    ) -> Result<Arc<Vec<Template>>> {
        let key = AppTemplateListKey {
            tenant_id: tenant_id.to_string(),
            application_id: application_id.to_string(),
            channel,
        };
        let generation = self.caches.app_templates.generation();
        if let Some(templates) = self.caches.app_templates.get(&key) {
            return Ok(templates);
        }

        let scope = TemplateScope::application(tenant_id, application_id);
        let templates = Arc::new(
            self.timed(
                "list_templates",
                self.store.list_templates(&scope, channel.base_path()),
            )
            .await?,
        );
        self.caches
            .app_templates
            .put_if_generation(key, templates.clone(), generation);
        Ok(templates)
    }

    /// Organization-level templates, served from the org list cache
    pub async fn organization_templates(
        &self,
        organization_id: &str,
        application_id: Option<&str>,
        channel: Channel,
    ) -> Result<Arc<Vec<Template>>> {
        let key = OrgTemplateListKey {
            organization_id: organization_id.to_string(),
            application_id: application_id.map(str::to_string),
            channel,
        };
        let generation = self.caches.org_templates.generation();
        if let Some(templates) = self.caches.org_templates.get(&key) {
            return Ok(templates);
        }

        let scope = TemplateScope::organization(organization_id, key.application_id.clone());
        let templates = Arc::new(
            self.timed(
                "list_templates",
                self.store.list_templates(&scope, channel.base_path()),
            )
            .await?,
        );
        self.caches
            .org_templates
            .put_if_generation(key, templates.clone(), generation);
        Ok(templates)
    }

    /// Template types a tenant defines for a channel
    pub async fn template_types(&self, tenant_id: &str, channel: Channel) -> Result<Arc<Vec<String>>> {
        let key = TypeListKey {
            tenant_id: tenant_id.to_string(),
            channel,
        };
        let generation = self.caches.template_types.generation();
        if let Some(types) = self.caches.template_types.get(&key) {
            return Ok(types);
        }

        let types = Arc::new(
            self.timed(
                "list_template_types",
                self.store.list_template_types(channel.base_path(), tenant_id),
            )
            .await?,
        );
        self.caches
            .template_types
            .put_if_generation(key, types.clone(), generation);
        Ok(types)
    }

    /// Template types an application defines within a tenant
    pub async fn application_template_types(
        &self,
        tenant_id: &str,
        application_id: &str,
        channel: Channel,
    ) -> Result<Vec<String>> {
        let templates = self
            .application_templates(tenant_id, application_id, channel)
            .await?;
        let mut types: Vec<String> = templates.iter().map(|t| t.template_type.clone()).collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    async fn timed<T, F>(&self, operation: &'static str, future: F) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        self.stats.store_queries.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let result = future.await;
        StoreMetrics::record_latency(operation, start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            StoreMetrics::record_error(operation);
            tracing::error!(operation, error = %e, "Template store operation failed");
        }
        result
    }
}

fn find_template(templates: &[Template], template_type: &str, locale: &str) -> Option<Template> {
    templates
        .iter()
        .find(|t| t.template_type == template_type && t.locale == locale)
        .cloned()
}
