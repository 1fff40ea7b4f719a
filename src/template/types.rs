//! Template types and cache keys

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::locale;
use crate::notification::Channel;

/// Content type assumed when a stored template carries none
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Charset parameter appended to HTML content types that lack one
pub const HTML_CHARSET_SUFFIX: &str = "; charset=UTF-8";

/// A stored notification template.
///
/// Values are never mutated once stored; the resolver hands out shared
/// `Arc<Template>` references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Notification scenario, e.g. `passwordReset`
    pub template_type: String,

    /// Human-readable name shown in administration tools; empty when unset
    #[serde(default)]
    pub display_name: String,

    /// Canonical locale (`en_US`)
    pub locale: String,

    /// MIME type of the body
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Subject line (email only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Body with {{placeholder}} tags
    pub body: String,

    /// Footer (email only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl Template {
    /// Create a plain-text template with a body only
    pub fn new(
        template_type: impl Into<String>,
        locale: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            template_type: template_type.into(),
            display_name: String::new(),
            locale: locale.into(),
            content_type: default_content_type(),
            subject: None,
            body: body.into(),
            footer: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Validate the template.
    ///
    /// Stores call this before accepting a row so that a resolved template is
    /// always complete.
    pub fn validate(&self) -> Result<()> {
        if self.template_type.is_empty() || self.template_type.len() > 128 {
            return Err(EngineError::InvalidTemplate(
                "Template type must be 1-128 characters".to_string(),
            ));
        }

        if !self
            .template_type
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(EngineError::InvalidTemplate(format!(
                "Template type '{}' must contain only alphanumeric, dash, dot, or underscore",
                self.template_type
            )));
        }

        match locale::canonicalize(&self.locale) {
            Some(canonical) if canonical == self.locale => {}
            _ => {
                return Err(EngineError::InvalidTemplate(format!(
                    "Locale '{}' is not in language_COUNTRY form",
                    self.locale
                )))
            }
        }

        if self.body.trim().is_empty() {
            return Err(EngineError::InvalidTemplate(format!(
                "Template '{}' ({}) has an empty body",
                self.template_type, self.locale
            )));
        }

        Ok(())
    }

    /// Copy of this template with its content type normalized
    pub fn with_normalized_content_type(&self) -> Self {
        Self {
            content_type: normalize_content_type(&self.content_type),
            ..self.clone()
        }
    }
}

/// Apply the content-type defaults: empty becomes `text/plain`, HTML types
/// without a charset get `; charset=UTF-8`.
pub fn normalize_content_type(content_type: &str) -> String {
    let trimmed = content_type.trim();
    if trimmed.is_empty() {
        return DEFAULT_CONTENT_TYPE.to_string();
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.contains("html") && !lower.contains("charset") {
        format!("{}{}", trimmed, HTML_CHARSET_SUFFIX)
    } else {
        trimmed.to_string()
    }
}

/// Where a template row lives in the override hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum TemplateScope {
    /// Tenant-wide override
    Tenant { tenant_id: String },
    /// Application default within a tenant
    Application {
        tenant_id: String,
        application_id: String,
    },
    /// Organization default, optionally specific to an application
    Organization {
        organization_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        application_id: Option<String>,
    },
}

impl TemplateScope {
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        TemplateScope::Tenant {
            tenant_id: tenant_id.into(),
        }
    }

    pub fn application(tenant_id: impl Into<String>, application_id: impl Into<String>) -> Self {
        TemplateScope::Application {
            tenant_id: tenant_id.into(),
            application_id: application_id.into(),
        }
    }

    pub fn organization(
        organization_id: impl Into<String>,
        application_id: Option<String>,
    ) -> Self {
        TemplateScope::Organization {
            organization_id: organization_id.into(),
            application_id,
        }
    }
}

impl fmt::Display for TemplateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateScope::Tenant { tenant_id } => write!(f, "tenant:{}", tenant_id),
            TemplateScope::Application {
                tenant_id,
                application_id,
            } => write!(f, "tenant:{}/app:{}", tenant_id, application_id),
            TemplateScope::Organization {
                organization_id,
                application_id: Some(app),
            } => write!(f, "org:{}/app:{}", organization_id, app),
            TemplateScope::Organization {
                organization_id,
                application_id: None,
            } => write!(f, "org:{}", organization_id),
        }
    }
}

/// Key of a resolved template.
///
/// Equality is structural, so two keys built independently from the same
/// request address the same cache entry. The tenant is always part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub tenant_id: String,
    pub application_id: Option<String>,
    pub channel: Channel,
    pub template_type: String,
    pub locale: String,
}

impl TemplateKey {
    pub fn new(
        tenant_id: impl Into<String>,
        application_id: Option<&str>,
        channel: Channel,
        template_type: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            application_id: application_id.map(str::to_string),
            channel,
            template_type: template_type.into(),
            locale: locale.into(),
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.tenant_id,
            self.application_id.as_deref().unwrap_or("-"),
            self.channel,
            self.template_type,
            self.locale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_validation_valid() {
        let template = Template::new("passwordReset", "en_US", "Reset: {{url:link}}")
            .with_subject("Reset your password");
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_template_validation_empty_type() {
        let template = Template::new("", "en_US", "body");
        assert!(matches!(
            template.validate(),
            Err(EngineError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_template_validation_invalid_type_chars() {
        let template = Template::new("password/reset", "en_US", "body");
        assert!(matches!(
            template.validate(),
            Err(EngineError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_template_validation_non_canonical_locale() {
        let template = Template::new("passwordReset", "en-us", "body");
        assert!(matches!(
            template.validate(),
            Err(EngineError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_template_validation_blank_body() {
        let template = Template::new("passwordReset", "en_US", "   ");
        assert!(matches!(
            template.validate(),
            Err(EngineError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_content_type_defaults() {
        assert_eq!(normalize_content_type(""), "text/plain");
        assert_eq!(normalize_content_type("text/plain"), "text/plain");
        assert_eq!(
            normalize_content_type("text/html"),
            "text/html; charset=UTF-8"
        );
        assert_eq!(
            normalize_content_type("text/html; charset=ISO-8859-1"),
            "text/html; charset=ISO-8859-1"
        );
    }

    #[test]
    fn test_deserialize_defaults_content_type() {
        let template: Template = serde_json::from_str(
            r#"{"template_type": "welcome", "locale": "en_US", "body": "Hi"}"#,
        )
        .unwrap();
        assert_eq!(template.content_type, "text/plain");
        assert!(template.subject.is_none());
    }

    #[test]
    fn test_constructed_and_deserialized_defaults_match() {
        let deserialized: Template = serde_json::from_str(
            r#"{"template_type": "welcome", "locale": "en_US", "body": "Hi"}"#,
        )
        .unwrap();
        assert_eq!(deserialized, Template::new("welcome", "en_US", "Hi"));
        assert!(deserialized.display_name.is_empty());
    }

    #[test]
    fn test_key_structural_equality() {
        use std::collections::HashSet;

        let a = TemplateKey::new("acme", Some("portal"), Channel::Email, "welcome", "en_US");
        let b = TemplateKey::new(
            String::from("acme"),
            Some("portal"),
            Channel::Email,
            String::from("welcome"),
            String::from("en_US"),
        );
        assert_eq!(a, b);

        let mut keys = HashSet::new();
        keys.insert(a);
        assert!(keys.contains(&b));

        let other_tenant = TemplateKey::new("globex", Some("portal"), Channel::Email, "welcome", "en_US");
        assert!(!keys.contains(&other_tenant));
    }

    #[test]
    fn test_scope_serde_tagged() {
        let scope = TemplateScope::application("acme", "portal");
        let json = serde_json::to_value(&scope).unwrap();
        assert_eq!(json["level"], "application");
        assert_eq!(json["application_id"], "portal");

        let back: TemplateScope = serde_json::from_value(json).unwrap();
        assert_eq!(back, scope);
    }
}
