//! In-memory template store backed by DashMap.
//!
//! Templates are lost on restart; hosts seed the store from a JSON file or
//! populate it through the write operations below.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{StoreError, StoreResult, TemplateStore};
use crate::notification::Channel;
use crate::template::{Template, TemplateScope};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StoredKey {
    scope: TemplateScope,
    path: String,
    locale: String,
}

/// One entry of a seed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedTemplate {
    pub scope: TemplateScope,
    pub channel: Channel,
    #[serde(flatten)]
    pub template: Template,
}

/// In-memory template storage
pub struct InMemoryTemplateStore {
    templates: DashMap<StoredKey, Template>,
}

impl Default for InMemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTemplateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Build a store from a JSON array of [`SeedTemplate`]s
    pub fn from_seed_json(json: &str) -> StoreResult<Self> {
        let seeds: Vec<SeedTemplate> = serde_json::from_str(json)?;
        let store = Self::new();
        for seed in seeds {
            store.create(seed.scope, seed.channel, seed.template)?;
        }
        Ok(store)
    }

    /// Build a store from a seed file on disk
    pub fn from_seed_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let store = Self::from_seed_json(&json)?;
        tracing::info!(
            path = %path.display(),
            templates = store.count(),
            "Template store seeded"
        );
        Ok(store)
    }

    fn key(scope: &TemplateScope, channel: Channel, template: &Template) -> StoredKey {
        StoredKey {
            scope: scope.clone(),
            path: channel.template_path(&template.template_type),
            locale: template.locale.clone(),
        }
    }

    /// Create a new template
    pub fn create(
        &self,
        scope: TemplateScope,
        channel: Channel,
        template: Template,
    ) -> StoreResult<()> {
        template
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        match self.templates.entry(Self::key(&scope, channel, &template)) {
            Entry::Occupied(existing) => Err(StoreError::AlreadyExists(format!(
                "{} {} ({})",
                scope,
                existing.key().path,
                existing.key().locale
            ))),
            Entry::Vacant(slot) => {
                slot.insert(template);
                Ok(())
            }
        }
    }

    /// Replace an existing template
    pub fn update(
        &self,
        scope: TemplateScope,
        channel: Channel,
        template: Template,
    ) -> StoreResult<Template> {
        template
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let key = Self::key(&scope, channel, &template);
        match self.templates.get_mut(&key) {
            Some(mut existing) => Ok(std::mem::replace(existing.value_mut(), template)),
            None => Err(StoreError::NotFound(format!(
                "{} {} ({})",
                scope, key.path, key.locale
            ))),
        }
    }

    /// Delete a template, returning it
    pub fn remove(
        &self,
        scope: &TemplateScope,
        channel: Channel,
        template_type: &str,
        locale: &str,
    ) -> StoreResult<Template> {
        let key = StoredKey {
            scope: scope.clone(),
            path: channel.template_path(template_type),
            locale: locale.to_string(),
        };
        self.templates
            .remove(&key)
            .map(|(_, template)| template)
            .ok_or_else(|| {
                StoreError::NotFound(format!("{} {} ({})", scope, key.path, key.locale))
            })
    }

    /// Get the number of templates
    pub fn count(&self) -> usize {
        self.templates.len()
    }
}

fn under_base_path(path: &str, base: &str) -> bool {
    path.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|template_type| !template_type.is_empty())
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn list_template_types(&self, path: &str, tenant_id: &str) -> StoreResult<Vec<String>> {
        let scope = TemplateScope::tenant(tenant_id);
        let types: BTreeSet<String> = self
            .templates
            .iter()
            .filter(|entry| entry.key().scope == scope && under_base_path(&entry.key().path, path))
            .map(|entry| entry.value().template_type.clone())
            .collect();
        Ok(types.into_iter().collect())
    }

    async fn get_template(
        &self,
        scope: &TemplateScope,
        path: &str,
        locale: &str,
    ) -> StoreResult<Option<Template>> {
        let key = StoredKey {
            scope: scope.clone(),
            path: path.to_string(),
            locale: locale.to_string(),
        };
        Ok(self.templates.get(&key).map(|t| t.clone()))
    }

    async fn list_templates(
        &self,
        scope: &TemplateScope,
        path: &str,
    ) -> StoreResult<Vec<Template>> {
        let mut templates: Vec<Template> = self
            .templates
            .iter()
            .filter(|entry| &entry.key().scope == scope && under_base_path(&entry.key().path, path))
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| {
            (&a.template_type, &a.locale).cmp(&(&b.template_type, &b.locale))
        });
        Ok(templates)
    }
}
