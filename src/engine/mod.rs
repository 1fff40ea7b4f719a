//! Engine facade.
//!
//! [`NotificationTemplateEngine`] wires the locale normalizer, cache tiers,
//! resolver and channel builder together. Hosts construct one per process and
//! share it behind an `Arc`; it holds no global state.

use std::sync::Arc;

use crate::cache::{TemplateCaches, TemplateChange};
use crate::config::Settings;
use crate::error::{EngineError, Result};
use crate::locale::LocaleNormalizer;
use crate::notification::{
    Channel, ChannelNotificationBuilder, NotificationRequest, RenderedNotification,
};
use crate::resolver::{ResolverStatsSnapshot, TemplateResolver};
use crate::store::TemplateStore;
use crate::telemetry::{attributes, record_attributes};
use crate::template::{PlaceholderEngine, Placeholders, Template, TemplateScope};
use crate::tenant::TenantDirectory;

/// Resolves and renders notification templates
pub struct NotificationTemplateEngine {
    resolver: TemplateResolver,
    builder: ChannelNotificationBuilder,
    tenants: Arc<dyn TenantDirectory>,
    caches: Arc<TemplateCaches>,
}

impl NotificationTemplateEngine {
    pub fn new(
        settings: &Settings,
        store: Arc<dyn TemplateStore>,
        tenants: Arc<dyn TenantDirectory>,
    ) -> Self {
        let caches = Arc::new(TemplateCaches::new(&settings.cache));
        let locales = LocaleNormalizer::new(&settings.engine.default_locale);
        let builder =
            ChannelNotificationBuilder::new(PlaceholderEngine::new(&settings.engine.url_charset));

        tracing::info!(
            default_locale = %locales.default_locale(),
            url_charset = %settings.engine.url_charset,
            cache_enabled = settings.cache.enabled,
            cache_ttl_seconds = ?settings.cache.ttl_seconds,
            "Template engine initialized"
        );

        Self {
            resolver: TemplateResolver::new(store, tenants.clone(), caches.clone(), locales),
            builder,
            tenants,
            caches,
        }
    }

    /// Resolve the template for a tenant, application, channel, type and locale
    pub async fn resolve_template(
        &self,
        tenant_id: &str,
        application_id: Option<&str>,
        channel: Channel,
        template_type: &str,
        locale: &str,
    ) -> Result<Arc<Template>> {
        self.resolver
            .resolve(tenant_id, application_id, channel, template_type, locale)
            .await
    }

    /// Render a resolved template for `channel`
    pub fn render_notification(
        &self,
        channel: Channel,
        template: &Template,
        placeholders: &Placeholders,
        send_to: &str,
        send_from: Option<&str>,
    ) -> Result<RenderedNotification> {
        self.builder
            .build(channel, template, placeholders, send_to, send_from)
    }

    /// Template types defined by the tenant behind `tenant_domain`
    pub async fn list_template_types(
        &self,
        channel: Channel,
        tenant_domain: &str,
    ) -> Result<Vec<String>> {
        let tenant_id = self
            .tenants
            .tenant_id(tenant_domain)
            .await?
            .ok_or_else(|| EngineError::UnknownTenant(tenant_domain.to_string()))?;

        let types = self.resolver.template_types(&tenant_id, channel).await?;
        Ok(types.as_ref().clone())
    }

    /// Template types an application defines within a tenant
    pub async fn list_application_template_types(
        &self,
        tenant_id: &str,
        application_id: &str,
        channel: Channel,
    ) -> Result<Vec<String>> {
        self.resolver
            .application_template_types(tenant_id, application_id, channel)
            .await
    }

    /// Resolve and render one notification
    #[tracing::instrument(
        name = "engine.notify",
        skip(self, request),
        fields(
            tenant_id = %request.tenant_id,
            channel = %request.channel,
            template_type = %request.template_type,
            placeholder_count = request.placeholders.len()
        )
    )]
    pub async fn notify(&self, request: NotificationRequest) -> Result<RenderedNotification> {
        let template = self
            .resolve_template(
                &request.tenant_id,
                request.application_id.as_deref(),
                request.channel,
                &request.template_type,
                &request.locale,
            )
            .await?;

        let notification = self.render_notification(
            request.channel,
            &template,
            &request.placeholders,
            &request.send_to,
            request.send_from.as_deref(),
        )?;

        record_attributes(
            &tracing::Span::current(),
            [
                attributes::notification_id(notification.id),
                attributes::locale(&notification.locale),
                attributes::placeholder_count(request.placeholders.len()),
            ],
        );
        Ok(notification)
    }

    /// Invalidate cached data affected by a template write; returns the number of entries dropped
    pub fn on_template_changed(&self, change: &TemplateChange) -> usize {
        self.caches.apply_change(change)
    }

    /// Invalidate after a write reported by store path, e.g. `/identity/sms/otp`
    pub fn on_template_path_changed(&self, scope: TemplateScope, path: &str) -> Result<usize> {
        let change = TemplateChange::from_path(scope, path)?;
        Ok(self.on_template_changed(&change))
    }

    pub fn caches(&self) -> &Arc<TemplateCaches> {
        &self.caches
    }

    pub fn locales(&self) -> &LocaleNormalizer {
        self.resolver.locales()
    }

    /// Get resolver statistics
    pub fn stats(&self) -> ResolverStatsSnapshot {
        self.resolver.stats()
    }
}
