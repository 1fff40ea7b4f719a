//! Template store abstraction.
//!
//! The engine reads templates through the [`TemplateStore`] trait so the
//! persistence layer (registry, SQL, remote service) can be swapped freely.
//! Paths follow the `/identity/<channel>/<templateType>` layout produced by
//! [`Channel::template_path`](crate::notification::Channel::template_path).

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::template::{Template, TemplateScope};

pub use memory::{InMemoryTemplateStore, SeedTemplate};

/// Errors that can occur in template store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store is temporarily unavailable
    #[error("Template store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be mapped to a complete template
    #[error("Corrupt template at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// Template rejected on write
    #[error("Invalid template: {0}")]
    Invalid(String),

    #[error("Template already exists: {0}")]
    AlreadyExists(String),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Read side of the template persistence layer.
///
/// Implementations return whole templates or nothing; a row that cannot be
/// mapped completely is reported as [`StoreError::Corrupt`].
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Template types defined for a tenant under a channel base path
    async fn list_template_types(&self, path: &str, tenant_id: &str) -> StoreResult<Vec<String>>;

    /// Fetch one template by scope, template path and canonical locale
    async fn get_template(
        &self,
        scope: &TemplateScope,
        path: &str,
        locale: &str,
    ) -> StoreResult<Option<Template>>;

    /// All templates of a scope under a channel base path
    async fn list_templates(&self, scope: &TemplateScope, path: &str)
        -> StoreResult<Vec<Template>>;
}
