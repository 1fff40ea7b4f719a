use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tenant: TenantConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Locale used when the requested one is invalid or has no template
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Charset used to percent-encode {{url:...}} placeholder values
    #[serde(default = "default_url_charset")]
    pub url_charset: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Disable to always go to the template store
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Optional entry lifetime in seconds; entries live until invalidated when unset
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file used to seed the in-memory template store
    #[serde(default)]
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantConfig {
    /// Treat unregistered tenant domains as their own tenant id
    #[serde(default = "default_tenant_passthrough")]
    pub passthrough: bool,
    /// tenant domain -> tenant id
    #[serde(default)]
    pub domains: HashMap<String, String>,
    /// tenant id -> organization id whose templates act as defaults
    #[serde(default)]
    pub organizations: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Trace sampling ratio (0.0-1.0)
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_url_charset() -> String {
    "UTF-8".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_tenant_passthrough() -> bool {
    true
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "notification-template-engine".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("engine.default_locale", default_locale())?
            .set_default("engine.url_charset", default_url_charset())?
            .set_default("cache.enabled", true)?
            .set_default("tenant.passthrough", default_tenant_passthrough())?
            .set_default("otel.enabled", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // TEMPLATE_ENGINE__ENGINE__DEFAULT_LOCALE, TEMPLATE_ENGINE__CACHE__TTL_SECONDS, etc.
            .add_source(
                Environment::with_prefix("TEMPLATE_ENGINE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            cache: CacheConfig::default(),
            store: StoreConfig::default(),
            tenant: TenantConfig::default(),
            otel: OtelConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            url_charset: default_url_charset(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: None,
        }
    }
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            passthrough: default_tenant_passthrough(),
            domains: HashMap::new(),
            organizations: HashMap::new(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.engine.default_locale, "en_US");
        assert_eq!(settings.engine.url_charset, "UTF-8");
        assert!(settings.cache.enabled);
        assert!(settings.cache.ttl_seconds.is_none());
        assert!(settings.store.seed_file.is_none());
        assert!(!settings.otel.enabled);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"cache": {"ttl_seconds": 60}}"#).unwrap();
        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.ttl_seconds, Some(60));
        assert_eq!(settings.engine.default_locale, "en_US");
        assert!(settings.tenant.passthrough);
    }

    #[test]
    fn test_tenant_organizations_deserialize() {
        let settings: Settings = serde_json::from_str(
            r#"{"tenant": {"passthrough": false, "organizations": {"acme": "root"}}}"#,
        )
        .unwrap();
        assert!(!settings.tenant.passthrough);
        assert!(settings.tenant.domains.is_empty());
        assert_eq!(
            settings.tenant.organizations.get("acme").map(String::as_str),
            Some("root")
        );
    }
}
