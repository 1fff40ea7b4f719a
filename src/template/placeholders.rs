//! Placeholder values for a single render

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Tag name to value mapping used to render one notification.
///
/// Keys are case-sensitive and unique; inserting an existing key replaces its
/// value, so callers layer sources from least to most specific (user claims,
/// then event properties, then computed values such as confirmation codes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placeholders(BTreeMap<String, String>);

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build values from a JSON object of event properties.
    ///
    /// Strings are taken verbatim, numbers and booleans use their display
    /// form, `null` becomes the empty string and arrays or objects are
    /// inserted as JSON text.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let map = match value {
            serde_json::Value::Object(map) => map,
            _ => {
                return Err(EngineError::InvalidTemplate(
                    "Placeholder values must be a JSON object".to_string(),
                ))
            }
        };

        Ok(map
            .iter()
            .map(|(key, value)| (key.clone(), json_to_string(value)))
            .collect())
    }

    /// Layer `other` on top of these values
    pub fn merge(&mut self, other: Placeholders) {
        self.0.extend(other.0);
    }
}

fn json_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        // For arrays and objects, use JSON representation
        _ => value.to_string(),
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Placeholders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Placeholders {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
