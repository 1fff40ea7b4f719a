//! Notification templates.
//!
//! This module provides:
//! - Template definition with subject/body/footer and `{{placeholder}}` tags
//! - Scopes of the tenant > application > organization override hierarchy
//! - Structural cache keys for resolved templates
//! - The placeholder substitution engine
//!
//! # Example
//!
//! ```ignore
//! let template = Template::new("passwordReset", "en_US", "Reset here: {{url:reset-link}}")
//!     .with_subject("Hello {{user-name}}");
//!
//! let values = Placeholders::new()
//!     .with("user-name", "Jo")
//!     .with("reset-link", "https://id.example.com/reset?code=abc");
//!
//! let engine = PlaceholderEngine::default();
//! let body = engine.render(&template.body, &values)?;
//! ```

mod placeholders;
mod substitution;
mod types;

pub use placeholders::Placeholders;
pub use substitution::{extract_tags, PlaceholderEngine, UrlCharset, URL_TAG_PREFIX};
pub use types::{
    normalize_content_type, Template, TemplateKey, TemplateScope, DEFAULT_CONTENT_TYPE,
    HTML_CHARSET_SUFFIX,
};
