//! Parsing of `--set key=value` arguments
//!
//! Follows the Helm conventions:
//! - `a=1,b=2` holds several assignments
//! - `image.tag=v2` creates nested mappings
//! - `ports[0]=80` sets a list element, padding with null
//! - `tags={a,b,c}` creates a list
//! - `\,` `\.` `\=` `\[` and `\\` keep the literal character

use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::values::Values;

/// Upper bound for `name[i]` indices, to keep a typo from allocating gigabytes
const MAX_INDEX: usize = 65_536;

/// One step of a `--set` key path
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Parse several `--set` arguments, later arguments winning
pub fn parse_set_values(set_args: &[String]) -> Result<Values> {
    let mut values = Values::new();
    for arg in set_args {
        values.merge(&parse_set_token(arg)?);
    }
    Ok(values)
}

/// Parse a single `--set` argument into a values tree
pub fn parse_set_token(token: &str) -> Result<Values> {
    let mut root = JsonValue::Object(serde_json::Map::new());

    for assignment in split_assignments(token) {
        let (raw_key, raw_value) = split_key_value(&assignment).ok_or_else(|| {
            set_error(token, format!("'{}' is not in key=value format", assignment))
        })?;

        let path = parse_key(token, &raw_key)?;
        let value = parse_value(&raw_value);
        set_path(token, &mut root, &path, value)?;
    }

    Ok(Values(root))
}

fn set_error(token: &str, message: impl Into<String>) -> CoreError {
    CoreError::SetParse {
        token: token.to_string(),
        message: message.into(),
    }
}

/// Split on unescaped commas that are not inside a `{...}` list literal
///
/// Escapes are kept in the output; they are resolved by the key and value parsers.
fn split_assignments(token: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = token.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Split at the first unescaped `=`
fn split_key_value(assignment: &str) -> Option<(String, String)> {
    let mut escaped = false;
    for (idx, c) in assignment.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' => {
                return Some((
                    assignment[..idx].to_string(),
                    assignment[idx + 1..].to_string(),
                ));
            }
            _ => {}
        }
    }
    None
}

/// Parse `a.b[0].c` into path segments
fn parse_key(token: &str, raw: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut name = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => name.push(next),
                None => return Err(set_error(token, "key ends with a dangling escape")),
            },
            '.' => {
                if name.is_empty() && !matches!(segments.last(), Some(Segment::Index(_))) {
                    return Err(set_error(token, format!("empty key segment in '{}'", raw)));
                }
                if !name.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut name)));
                }
            }
            '[' => {
                if !name.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut name)));
                }
                if segments.is_empty() {
                    return Err(set_error(token, format!("list index without a name in '{}'", raw)));
                }
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) => digits.push(d),
                        None => return Err(set_error(token, format!("unclosed '[' in '{}'", raw))),
                    }
                }
                let idx: usize = digits.trim().parse().map_err(|_| {
                    set_error(token, format!("invalid list index '{}' in '{}'", digits, raw))
                })?;
                if idx > MAX_INDEX {
                    return Err(set_error(
                        token,
                        format!("list index {} exceeds the maximum of {}", idx, MAX_INDEX),
                    ));
                }
                segments.push(Segment::Index(idx));
            }
            _ => name.push(c),
        }
    }

    if !name.is_empty() {
        segments.push(Segment::Key(name));
    }

    if segments.is_empty() {
        return Err(set_error(token, "key is empty"));
    }

    Ok(segments)
}

/// Parse the right-hand side of an assignment
fn parse_value(raw: &str) -> JsonValue {
    if raw.len() >= 2 && raw.starts_with('{') && raw.ends_with('}') {
        let inner = &raw[1..raw.len() - 1];
        if inner.is_empty() {
            return JsonValue::Array(Vec::new());
        }
        let items = split_list_items(inner)
            .into_iter()
            .map(|item| infer_scalar(&unescape(&item)))
            .collect();
        return JsonValue::Array(items);
    }

    infer_scalar(&unescape(raw))
}

fn split_list_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Infer the type of a scalar the way Helm does
fn infer_scalar(s: &str) -> JsonValue {
    match s {
        "true" => return JsonValue::Bool(true),
        "false" => return JsonValue::Bool(false),
        "null" => return JsonValue::Null,
        _ => {}
    }

    // "007" stays a string, "0" is a number
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.starts_with('0') && digits.len() > 1 {
        return JsonValue::String(s.to_string());
    }

    match s.parse::<i64>() {
        Ok(n) => JsonValue::Number(n.into()),
        Err(_) => JsonValue::String(s.to_string()),
    }
}

fn set_path(token: &str, target: &mut JsonValue, path: &[Segment], value: JsonValue) -> Result<()> {
    let Some((head, rest)) = path.split_first() else {
        *target = value;
        return Ok(());
    };

    match head {
        Segment::Key(key) => {
            if !target.is_object() {
                *target = JsonValue::Object(serde_json::Map::new());
            }
            let map = target
                .as_object_mut()
                .ok_or_else(|| set_error(token, "expected a mapping"))?;
            let entry = map.entry(key.clone()).or_insert(JsonValue::Null);
            set_path(token, entry, rest, value)
        }
        Segment::Index(idx) => {
            if !target.is_array() {
                *target = JsonValue::Array(Vec::new());
            }
            let items = target
                .as_array_mut()
                .ok_or_else(|| set_error(token, "expected a list"))?;
            if items.len() <= *idx {
                items.resize(*idx + 1, JsonValue::Null);
            }
            set_path(token, &mut items[*idx], rest, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(token: &str) -> JsonValue {
        parse_set_token(token).unwrap().into_inner()
    }

    #[test]
    fn test_parse_set_values() {
        let args = vec![
            "image.tag=v2".to_string(),
            "replicas=5".to_string(),
            "debug=true".to_string(),
        ];

        let values = parse_set_values(&args).unwrap();

        assert_eq!(values.get("image.tag").unwrap(), "v2");
        assert_eq!(values.get("replicas").unwrap(), 5);
        assert_eq!(values.get("debug").unwrap(), true);
    }

    #[test]
    fn test_multiple_assignments_in_one_token() {
        assert_eq!(parse("a=1,b.c=two"), json!({"a": 1, "b": {"c": "two"}}));
    }

    #[test]
    fn test_later_assignment_wins() {
        assert_eq!(parse("a.x=1,a.y=2,a.x=3"), json!({"a": {"x": 3, "y": 2}}));
    }

    #[test]
    fn test_scalar_inference() {
        assert_eq!(
            parse("t=true,f=false,n=null,i=42,neg=-7,zero=0,pad=007,s=hello,e="),
            json!({
                "t": true,
                "f": false,
                "n": null,
                "i": 42,
                "neg": -7,
                "zero": 0,
                "pad": "007",
                "s": "hello",
                "e": ""
            })
        );
    }

    #[test]
    fn test_list_literal() {
        assert_eq!(parse("tags={a,b,3}"), json!({"tags": ["a", "b", 3]}));
        assert_eq!(parse("empty={}"), json!({"empty": []}));
    }

    #[test]
    fn test_list_literal_followed_by_assignment() {
        assert_eq!(parse("tags={a,b},x=1"), json!({"tags": ["a", "b"], "x": 1}));
    }

    #[test]
    fn test_list_index() {
        assert_eq!(parse("ports[1]=443"), json!({"ports": [null, 443]}));
        assert_eq!(
            parse("servers[0].host=a,servers[0].port=80"),
            json!({"servers": [{"host": "a", "port": 80}]})
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(parse(r"name=a\,b"), json!({"name": "a,b"}));
        assert_eq!(parse(r"dotted\.key=v"), json!({"dotted.key": "v"}));
        assert_eq!(parse(r"k=x\=y"), json!({"k": "x=y"}));
    }

    #[test]
    fn test_value_may_contain_equals() {
        assert_eq!(parse("url=a=b"), json!({"url": "a=b"}));
    }

    #[test]
    fn test_missing_equals_is_an_error() {
        let err = parse_set_token("foo").unwrap_err();
        assert!(matches!(err, CoreError::SetParse { ref token, .. } if token == "foo"));
    }

    #[test]
    fn test_bad_index_is_an_error() {
        assert!(parse_set_token("a[x]=1").is_err());
        assert!(parse_set_token("a[1=1").is_err());
        assert!(parse_set_token("a[999999999]=1").is_err());
        assert!(parse_set_token("[0]=1").is_err());
    }

    #[test]
    fn test_empty_key_segment_is_an_error() {
        assert!(parse_set_token("a..b=1").is_err());
        assert!(parse_set_token("=1").is_err());
    }

    #[test]
    fn test_empty_token() {
        assert!(parse_set_token("").unwrap().is_empty());
    }

    #[test]
    fn test_tokens_fold_in_order() {
        let values =
            parse_set_values(&["a.list={1,2,3}".to_string(), "a.list={9}".to_string()]).unwrap();
        assert_eq!(values.into_inner(), json!({"a": {"list": [9]}}));
    }
}
