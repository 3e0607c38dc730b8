//! Template functions (global functions available in templates)

use minijinja::{Error, ErrorKind, Value};

/// Fail with a custom error message
///
/// Usage: {{ fail("Something went wrong") }}
pub fn fail(message: String) -> Result<Value, Error> {
    Err(Error::new(ErrorKind::InvalidOperation, message))
}

/// Create a dict from key-value pairs
///
/// Usage: {{ dict("key1", value1, "key2", value2) }}
pub fn dict(args: Vec<Value>) -> Result<Value, Error> {
    if !args.len().is_multiple_of(2) {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "dict requires an even number of arguments (key-value pairs)",
        ));
    }

    let mut map = serde_json::Map::new();

    for chunk in args.chunks(2) {
        let key = chunk[0]
            .as_str()
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "dict keys must be strings"))?;
        let value: serde_json::Value = serde_json::to_value(&chunk[1])
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
        map.insert(key.to_string(), value);
    }

    Ok(Value::from_serialize(serde_json::Value::Object(map)))
}

/// Create a list from values
///
/// Usage: {{ list("a", "b", "c") }}
pub fn list(args: Vec<Value>) -> Value {
    Value::from(args)
}

/// Get a value with a default if undefined
///
/// Usage: {{ get(Values, "key", "default") }}
pub fn get(obj: Value, key: String, default: Option<Value>) -> Value {
    match obj.get_attr(&key) {
        Ok(v) if !v.is_undefined() => v,
        _ => default.unwrap_or(Value::UNDEFINED),
    }
}

/// Return first non-empty value
///
/// Usage: {{ coalesce(Values.a, Values.b, "fallback") }}
pub fn coalesce(args: Vec<Value>) -> Value {
    for arg in args {
        if arg.is_undefined() || arg.is_none() {
            continue;
        }
        match arg.as_str() {
            Some("") => continue,
            _ => return arg,
        }
    }
    Value::UNDEFINED
}

/// Ternary operator
///
/// Usage: {{ ternary("yes", "no", Values.enabled) }}
pub fn ternary(true_val: Value, false_val: Value, condition: Value) -> Value {
    if condition.is_true() {
        true_val
    } else {
        false_val
    }
}

/// Printf-style formatting
///
/// Usage: {{ printf("%s-%d", name, count) }}
///
/// Supports format specifiers: %s, %d, %f, %v, %q, %%
pub fn printf(format: String, args: Vec<Value>) -> Result<String, Error> {
    let mut result = String::with_capacity(format.len() + args.len() * 10);
    let mut chars = format.chars();
    let mut args = args.iter();

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }

        let format_char = match chars.next() {
            Some(fc) => fc,
            None => {
                result.push('%');
                break;
            }
        };

        if format_char == '%' {
            result.push('%');
            continue;
        }

        let arg = args.next().ok_or_else(|| {
            Error::new(ErrorKind::InvalidOperation, "not enough arguments for format string")
        })?;

        match format_char {
            'd' => match arg.as_i64() {
                Some(n) => result.push_str(&n.to_string()),
                None => result.push_str(&arg.to_string()),
            },
            'f' => match f64::try_from(arg.clone()) {
                Ok(n) => result.push_str(&format!("{:.6}", n)),
                Err(_) => result.push_str(&arg.to_string()),
            },
            'q' => result.push_str(&crate::filters::quote(arg.clone())),
            // %s, %v and anything unknown
            _ => result.push_str(&arg.to_string()),
        }
    }

    Ok(result)
}

/// Read an environment variable from the live process environment
///
/// Part of the standard library only; the engine's sandboxed library
/// leaves it out so templates go through `Env`.
pub fn env(name: String) -> String {
    std::env::var(&name).unwrap_or_default()
}

/// Expand `$VAR` and `${VAR}` references from the live process environment
///
/// Unset variables expand to an empty string. Left out of the sandboxed
/// library along with `env`.
pub fn expandenv(text: String) -> String {
    expand_with(&text, |name| std::env::var(name).ok())
}

fn expand_with<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some((start, '{')) => {
                chars.next();
                let rest = &text[start + 1..];
                match rest.find('}') {
                    Some(end) => {
                        out.push_str(&lookup(&rest[..end]).unwrap_or_default());
                        // skip the name and the closing brace
                        for _ in 0..rest[..=end].chars().count() {
                            chars.next();
                        }
                    }
                    None => out.push_str("${"),
                }
            }
            Some((start, n)) if n == '_' || n.is_ascii_alphabetic() => {
                let mut end = start;
                while let Some(&(idx, ch)) = chars.peek() {
                    if ch == '_' || ch.is_ascii_alphanumeric() {
                        end = idx + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&lookup(&text[start..end]).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }

    out
}

/// Convert a `--set` style string to YAML
///
/// Usage: {{ ToYAML("image.tag=v2,replicas=3") }}
pub fn set_string_to_yaml(text: String) -> Result<String, Error> {
    let values = chartpl_core::parse_set_token(&text)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
    let yaml = values
        .to_yaml()
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
    Ok(yaml.trim_end().to_string())
}
