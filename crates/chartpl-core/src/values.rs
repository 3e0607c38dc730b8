//! Values handling with deep merge support

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};

/// Values container with deep merge capability
///
/// The root of a `Values` tree is always a mapping. Documents that decode to
/// nothing (empty input, a bare `~`) become an empty mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Parse values from a YAML document read from `source_name`
    ///
    /// JSON documents are accepted too, since JSON is a subset of YAML.
    pub fn parse(source_name: &str, yaml: &str) -> Result<Self> {
        if is_blank_document(yaml) {
            return Ok(Self::new());
        }

        let mut document: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| CoreError::decode(source_name, e))?;
        // `<<: *anchor` merge keys are resolved before the tree leaves YAML
        document
            .apply_merge()
            .map_err(|e| CoreError::decode(source_name, e))?;
        let value =
            serde_json::to_value(document).map_err(|e| CoreError::decode(source_name, e))?;

        match value {
            JsonValue::Null => Ok(Self::new()),
            JsonValue::Object(_) => Ok(Self(value)),
            other => Err(CoreError::decode(
                source_name,
                format!("top-level value must be a mapping, found {}", kind_name(&other)),
            )),
        }
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse("<inline>", yaml)
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Objects: recursive merge
    /// - Everything else (scalars, arrays, null): overlay replaces base
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Deep merge without touching either input
    #[must_use]
    pub fn merged(&self, overlay: &Values) -> Values {
        let mut result = self.clone();
        result.merge(overlay);
        result
    }

    /// Merge multiple values in order, later entries winning
    pub fn merge_all<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Values>,
    {
        let mut result = Values::new();
        for v in values {
            result.merge(&v);
        }
        result
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Render the tree as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.0).map_err(|e| CoreError::decode("<values>", e))
    }
}

impl From<JsonValue> for Values {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(value);
    }

    let key = path[0];
    let remaining = &path[1..];

    match value {
        JsonValue::Object(map) => map.get(key).and_then(|v| get_nested(v, remaining)),
        JsonValue::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|idx| items.get(idx))
            .and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

/// True when a document holds nothing but whitespace, comments and markers
fn is_blank_document(yaml: &str) -> bool {
    yaml.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a sequence",
        JsonValue::Object(_) => "a mapping",
    }
}
