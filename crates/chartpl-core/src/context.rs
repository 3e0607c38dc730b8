//! Template rendering context

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::values::Values;

/// Process environment captured once, at context assembly
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvSnapshot(BTreeMap<String, String>);

impl EnvSnapshot {
    /// Snapshot the current process environment
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn capture() -> Self {
        let mut vars = BTreeMap::new();
        for (key, value) in std::env::vars_os() {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => {
                    vars.insert(key, value);
                }
                (Ok(key), Err(_)) => {
                    tracing::debug!("skipping environment variable {} (not UTF-8)", key);
                }
                _ => {}
            }
        }
        Self(vars)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Release information; unset fields are left out of the context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ReleaseInfo {
    pub fn new(name: Option<String>, namespace: Option<String>) -> Self {
        Self { name, namespace }
    }
}

/// Context available to all templates
///
/// Built once per invocation and shared read-only by every template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenderContext {
    /// Merged values
    pub values: JsonValue,

    /// Environment snapshot
    pub env: EnvSnapshot,

    /// Release information
    pub release: ReleaseInfo,

    /// Chart metadata (empty mapping when the chart has none)
    pub chart: JsonValue,
}

impl RenderContext {
    /// Assemble the context from already-decoded inputs
    pub fn new(
        values: Values,
        env: EnvSnapshot,
        release: ReleaseInfo,
        chart: Option<Values>,
    ) -> Self {
        Self {
            values: values.into_inner(),
            env,
            release,
            chart: chart.unwrap_or_default().into_inner(),
        }
    }

    /// Convert to minijinja-compatible context
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_context_keys() {
        let values = Values::from_yaml("replicas: 3").unwrap();
        let env: EnvSnapshot = [("HOME", "/root")].into_iter().collect();
        let release = ReleaseInfo::new(Some("myapp".to_string()), Some("prod".to_string()));
        let chart = Values::from_yaml("name: demo").unwrap();

        let ctx = RenderContext::new(values, env, release, Some(chart));

        assert_eq!(
            ctx.to_json(),
            json!({
                "Values": {"replicas": 3},
                "Env": {"HOME": "/root"},
                "Release": {"Name": "myapp", "Namespace": "prod"},
                "Chart": {"name": "demo"}
            })
        );
    }

    #[test]
    fn test_empty_release_is_present() {
        let ctx = RenderContext::new(
            Values::new(),
            EnvSnapshot::default(),
            ReleaseInfo::default(),
            None,
        );

        let json = ctx.to_json();
        assert_eq!(json["Release"], json!({}));
        assert_eq!(json["Chart"], json!({}));
    }

    #[test]
    fn test_partial_release() {
        let release = ReleaseInfo::new(None, Some("staging".to_string()));
        assert_eq!(
            serde_json::to_value(&release).unwrap(),
            json!({"Namespace": "staging"})
        );
    }

    #[test]
    fn test_env_snapshot_is_detached() {
        let key = "CHARTPL_CONTEXT_TEST_VAR";
        // SAFETY: only this test touches this variable
        unsafe { std::env::set_var(key, "before") };
        let snapshot = EnvSnapshot::capture();
        unsafe { std::env::set_var(key, "after") };

        assert_eq!(snapshot.get(key), Some("before"));
        unsafe { std::env::remove_var(key) };
    }
}
