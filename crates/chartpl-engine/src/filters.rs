//! Template filters
//!
//! Helm-compatible helpers exposed to templates. Format helpers are
//! registered both as filters (`{{ x | toYaml }}`) and as functions
//! (`{{ toYaml(x) }}`), see [`crate::library`].

use base64::Engine as _;
use chartpl_core::Values;
use minijinja::{Error, ErrorKind, Value};

fn to_json_value(value: &Value) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value).map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

/// Convert a value to YAML format
///
/// Usage: {{ Values.config | toYaml }}
pub fn to_yaml(value: Value) -> Result<String, Error> {
    let json_value = to_json_value(&value)?;

    let yaml = serde_yaml::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    // Remove trailing newline and leading "---\n" if present
    let yaml = yaml.trim_start_matches("---\n").trim_end();

    Ok(yaml.to_string())
}

/// Decode a YAML document into a value
///
/// Usage: {{ (Values.raw | fromYaml).key }}
pub fn from_yaml(text: String) -> Result<Value, Error> {
    let json_value: serde_json::Value = serde_yaml::from_str(&text).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, format!("fromYaml: {}", e))
    })?;
    Ok(Value::from_serialize(&json_value))
}

/// Convert a value to JSON format
///
/// Usage: {{ Values.config | toJson }}
pub fn to_json(value: Value) -> Result<String, Error> {
    let json_value = to_json_value(&value)?;

    serde_json::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

/// Decode a JSON document into a value
pub fn from_json(text: String) -> Result<Value, Error> {
    let json_value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, format!("fromJson: {}", e))
    })?;
    Ok(Value::from_serialize(&json_value))
}

/// Convert a mapping to TOML
///
/// Usage: {{ Values.config | toToml }}
pub fn to_toml(value: Value) -> Result<String, Error> {
    let json_value = to_json_value(&value)?;

    toml::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("toToml: {}", e)))
}

/// Base64 encode a string
///
/// Usage: {{ secret | b64enc }}
#[must_use]
pub fn b64enc(value: String) -> String {
    base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
}

/// Base64 decode a string
pub fn b64dec(value: String) -> Result<String, Error> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(value.as_bytes())
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("base64 decode error: {}", e)))?;

    String::from_utf8(decoded)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("UTF-8 decode error: {}", e)))
}

fn as_plain_string(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Quote a string with double quotes
///
/// Usage: {{ Values.name | quote }}
#[must_use]
pub fn quote(value: Value) -> String {
    let s = as_plain_string(&value);
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Quote a string with single quotes
#[must_use]
pub fn squote(value: Value) -> String {
    format!("'{}'", as_plain_string(&value).replace('\'', "''"))
}

/// Indent text with a newline prefix (like Helm's nindent)
///
/// Usage: {{ content | nindent(4) }}
#[must_use]
pub fn nindent(value: String, spaces: usize) -> String {
    format!("\n{}", indent(value, spaces))
}

/// Indent every non-empty line
///
/// Usage: {{ content | indent(4) }}
#[must_use]
pub fn indent(value: String, spaces: usize) -> String {
    let line_count = value.lines().count();
    let mut result = String::with_capacity(value.len() + spaces * line_count + line_count);

    let indent_str = " ".repeat(spaces);
    let mut first = true;

    for line in value.lines() {
        if !first {
            result.push('\n');
        }
        first = false;

        if !line.is_empty() {
            result.push_str(&indent_str);
        }
        result.push_str(line);
    }

    result
}

/// Require a value, fail if undefined or empty
///
/// Usage: {{ Values.host | required("host is required") }}
pub fn required(value: Value, message: Option<String>) -> Result<Value, Error> {
    if value.is_undefined() || value.is_none() {
        let msg = message.unwrap_or_else(|| "required value is missing".to_string());
        return Err(Error::new(ErrorKind::InvalidOperation, msg));
    }
    if value.as_str().is_some_and(str::is_empty) {
        let msg = message.unwrap_or_else(|| "required value is empty".to_string());
        return Err(Error::new(ErrorKind::InvalidOperation, msg));
    }
    Ok(value)
}

/// Check if a value is empty
///
/// Usage: {% if Values.list | empty %}
pub fn empty(value: Value) -> bool {
    if value.is_undefined() || value.is_none() {
        return true;
    }

    match value.len() {
        Some(len) => len == 0,
        None => value.as_str().is_some_and(str::is_empty),
    }
}

/// Check if a mapping has a key
///
/// Usage: {% if Values | haskey("ingress") %}
pub fn haskey(value: Value, key: String) -> bool {
    value.get_attr(&key).map(|v| !v.is_undefined()).unwrap_or(false)
}

/// Get all keys from a mapping
pub fn keys(value: Value) -> Result<Vec<String>, Error> {
    if value.kind() != minijinja::value::ValueKind::Map {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "cannot get keys from non-mapping value",
        ));
    }
    let iter = value.try_iter()?;
    Ok(iter.filter_map(|v| v.as_str().map(str::to_string)).collect())
}

/// Deep merge two mappings, the argument winning on conflicts
///
/// Uses the same rules as value-source merging.
///
/// Usage: {{ defaults | merge(overrides) }}
pub fn merge(base: Value, overlay: Value) -> Result<Value, Error> {
    let base = Values::from(to_json_value(&base)?);
    let overlay = Values::from(to_json_value(&overlay)?);

    Ok(Value::from_serialize(base.merged(&overlay).inner()))
}

/// SHA256 hash of a string
///
/// Usage: {{ Values.config | toJson | sha256sum }}
pub fn sha256sum(value: String) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Truncate a string to a maximum number of characters
///
/// Usage: {{ Release.Name | trunc(63) }}
pub fn trunc(value: String, length: usize) -> String {
    if value.chars().count() <= length {
        value
    } else {
        value.chars().take(length).collect()
    }
}

pub fn trimprefix(value: String, prefix: String) -> String {
    value.strip_prefix(&prefix).unwrap_or(&value).to_string()
}

pub fn trimsuffix(value: String, suffix: String) -> String {
    value.strip_suffix(&suffix).unwrap_or(&value).to_string()
}

/// Convert to snake_case
pub fn snakecase(value: String) -> String {
    let mut result = String::with_capacity(value.len() + value.len() / 4);
    let mut prev_upper = false;

    for (i, c) in value.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !prev_upper {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_upper = true;
        } else if c == '-' || c == ' ' {
            result.push('_');
            prev_upper = false;
        } else {
            result.push(c);
            prev_upper = false;
        }
    }

    result
}

/// Convert to kebab-case
pub fn kebabcase(value: String) -> String {
    snakecase(value).replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::Environment;

    #[test]
    fn test_to_yaml() {
        let value = Value::from_serialize(serde_json::json!({
            "name": "test",
            "port": 8080
        }));
        let yaml = to_yaml(value).unwrap();
        assert_eq!(yaml, "name: test\nport: 8080");
    }

    #[test]
    fn test_from_yaml() {
        let value = from_yaml("a:\n  b: [1, 2]\n".to_string()).unwrap();
        let b = value.get_attr("a").unwrap().get_attr("b").unwrap();
        assert_eq!(b.len(), Some(2));
    }

    #[test]
    fn test_from_yaml_malformed() {
        assert!(from_yaml("a: [1, 2".to_string()).is_err());
    }

    #[test]
    fn test_json_helpers() {
        let value = from_json(r#"{"a": [1, true, null]}"#.to_string()).unwrap();
        assert_eq!(to_json(value).unwrap(), r#"{"a":[1,true,null]}"#);
        assert!(from_json("{not json".to_string()).is_err());
    }

    #[test]
    fn test_to_toml() {
        let value = Value::from_serialize(serde_json::json!({"server": {"port": 80}}));
        let toml = to_toml(value).unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("port = 80"));
    }

    #[test]
    fn test_to_toml_rejects_scalars() {
        assert!(to_toml(Value::from(5)).is_err());
    }

    #[test]
    fn test_b64_round_trip() {
        let encoded = b64enc("hello world".to_string());
        assert_eq!(encoded, "aGVsbG8gd29ybGQ=");
        assert_eq!(b64dec(encoded).unwrap(), "hello world");
        assert!(b64dec("!!!".to_string()).is_err());
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(Value::from("test")), "\"test\"");
        assert_eq!(quote(Value::from(8080)), "\"8080\"");
        assert_eq!(quote(Value::from(r#"say "hi""#)), r#""say \"hi\"""#);
        assert_eq!(squote(Value::from("it's")), "'it''s'");
    }

    #[test]
    fn test_nindent() {
        let result = nindent("line1\n\nline2".to_string(), 4);
        assert_eq!(result, "\n    line1\n\n    line2");
    }

    #[test]
    fn test_required() {
        assert!(required(Value::from("test"), None).is_ok());
        assert!(required(Value::UNDEFINED, None).is_err());
        assert!(required(Value::from(""), None).is_err());

        let err = required(Value::from(()), Some("host is required".to_string())).unwrap_err();
        assert!(err.to_string().contains("host is required"));
    }

    #[test]
    fn test_empty() {
        assert!(empty(Value::UNDEFINED));
        assert!(empty(Value::from("")));
        assert!(empty(Value::from_serialize(Vec::<i32>::new())));
        assert!(!empty(Value::from("test")));
        assert!(!empty(Value::from(0)));
    }

    #[test]
    fn test_merge_filter_uses_deep_merge() {
        let mut env = Environment::new();
        env.add_filter("merge", merge);
        env.add_filter("toJson", to_json);

        let result = env
            .render_str(
                r#"{{ {"a": {"x": 1, "y": 2}, "l": [1, 2]} | merge({"a": {"y": 9}, "l": [3]}) | toJson }}"#,
                (),
            )
            .unwrap();
        assert_eq!(result, r#"{"a":{"x":1,"y":9},"l":[3]}"#);
    }

    #[test]
    fn test_keys_and_haskey() {
        let value = Value::from_serialize(serde_json::json!({"a": 1, "b": 2}));
        assert_eq!(keys(value.clone()).unwrap(), vec!["a", "b"]);
        assert!(haskey(value.clone(), "a".to_string()));
        assert!(!haskey(value, "c".to_string()));
        assert!(keys(Value::from("str")).is_err());
    }

    #[test]
    fn test_sha256sum() {
        assert_eq!(
            sha256sum("abc".to_string()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_trunc() {
        assert_eq!(trunc("hello".to_string(), 3), "hel");
        assert_eq!(trunc("hi".to_string(), 10), "hi");
        assert_eq!(trunc("héllo".to_string(), 2), "hé");
    }

    #[test]
    fn test_trim_prefix_suffix() {
        assert_eq!(trimprefix("v1.2".to_string(), "v".to_string()), "1.2");
        assert_eq!(trimsuffix("a.yaml".to_string(), ".yaml".to_string()), "a");
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(snakecase("camelCase".to_string()), "camel_case");
        assert_eq!(snakecase("PascalCase".to_string()), "pascal_case");
        assert_eq!(kebabcase("myApp name".to_string()), "my-app-name");
    }
}
