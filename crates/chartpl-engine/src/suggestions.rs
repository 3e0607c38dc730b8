//! Fuzzy matching and context-aware suggestions for template errors
//!
//! Levenshtein distance picks likely corrections for misspelled context
//! keys, helper names and value paths.

use serde_json::Value as JsonValue;

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Top-level context variables always available in templates
pub const CONTEXT_VARIABLES: &[&str] = &["Values", "Env", "Release", "Chart"];

/// Suggestion result with confidence scoring
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggested correction
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
}

/// Find closest matches from a list of candidates
pub fn find_closest_matches(input: &str, candidates: &[&str], max_results: usize) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = strsim::levenshtein(input, candidate);
            (distance <= MAX_SUGGESTION_DISTANCE && distance > 0).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
            })
        })
        .collect();

    suggestions.sort_by_key(|s| s.distance);
    suggestions.truncate(max_results);
    suggestions
}

fn backticked(matches: &[Suggestion]) -> String {
    matches
        .iter()
        .map(|s| format!("`{}`", s.text))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Suggest a fix for an undefined expression such as `Value.image` or `Values.imag.tag`
pub fn suggest_undefined(expr: &str, context: &JsonValue) -> String {
    let mut parts = expr.split('.');
    let root = parts.next().unwrap_or_default();

    // Case slips are the most common mistake: `values` for `Values`
    if let Some(fixed) = CONTEXT_VARIABLES
        .iter()
        .find(|v| v.eq_ignore_ascii_case(root) && **v != root)
    {
        let corrected = format!("{}{}", fixed, &expr[root.len()..]);
        return format!("Did you mean `{}`? Context keys are capitalized.", corrected);
    }

    if !CONTEXT_VARIABLES.contains(&root) {
        let matches = find_closest_matches(root, CONTEXT_VARIABLES, 1);
        if !matches.is_empty() {
            return format!("Did you mean {}?", backticked(&matches));
        }
        return format!(
            "`{}` is not defined. Templates can read {}.",
            root,
            CONTEXT_VARIABLES.join(", ")
        );
    }

    // Walk the path to find where it breaks
    let mut current = context.get(root);
    let mut walked = vec![root];
    for part in parts {
        let Some(value) = current else { break };
        match value.get(part) {
            Some(next) => {
                walked.push(part);
                current = Some(next);
            }
            None => {
                let prefix = walked.join(".");
                return suggest_available_properties(&prefix, part, value);
            }
        }
    }

    format!(
        "`{}` is not defined. Check spelling or use `| default(\"fallback\")`.",
        expr
    )
}

/// Suggest sibling keys when `parent.attempted` does not exist
pub fn suggest_available_properties(parent_path: &str, attempted_key: &str, parent: &JsonValue) -> String {
    let available: Vec<&str> = match parent {
        JsonValue::Object(map) => map.keys().map(String::as_str).collect(),
        _ => {
            return format!(
                "`{}` is not a mapping, so `{}` cannot be looked up in it.",
                parent_path, attempted_key
            );
        }
    };

    if available.is_empty() {
        return format!("`{}` is empty; `{}` is not set.", parent_path, attempted_key);
    }

    let matches = find_closest_matches(attempted_key, &available, 3);
    if matches.is_empty() {
        format!(
            "Key `{}` not found in `{}`. Available keys: {}",
            attempted_key,
            parent_path,
            available.join(", ")
        )
    } else {
        let suggestions: Vec<String> = matches
            .iter()
            .map(|m| format!("`{}.{}`", parent_path, m.text))
            .collect();
        format!(
            "Did you mean {}? Available: {}",
            suggestions.join(" or "),
            available.join(", ")
        )
    }
}

/// Suggest corrections for an unknown filter or function
pub fn suggest_unknown_helper(name: &str, known: &[&str]) -> String {
    let matches = find_closest_matches(name, known, 3);
    if !matches.is_empty() {
        return format!("Did you mean {}?", backticked(&matches));
    }
    format!("`{}` is not available. Known helpers: {}", name, known.join(", "))
}

/// Generate a type-specific hint for iteration errors
pub fn suggest_iteration_fix(type_name: &str) -> String {
    match type_name {
        "object" | "map" => {
            "Mappings iterate over keys; use `| items` for pairs: `{% for key, value in obj | items %}`"
                .to_string()
        }
        "string" => {
            "Strings iterate character by character. Did you mean to split it first?".to_string()
        }
        "null" | "none" => {
            "Value is null. Check that it exists or use `| default([])` for an empty list"
                .to_string()
        }
        _ => format!("Value of type `{}` is not iterable.", type_name),
    }
}

/// Extract the first quoted name from an error message
pub fn extract_quoted_name(msg: &str) -> Option<String> {
    let patterns = [("`", "`"), ("'", "'"), ("\"", "\"")];

    for (start, end) in patterns {
        if let Some(start_idx) = msg.find(start) {
            let rest = &msg[start_idx + start.len()..];
            if let Some(end_idx) = rest.find(end) {
                return Some(rest[..end_idx].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> JsonValue {
        json!({
            "Values": {
                "image": {"repository": "nginx", "tag": "latest"},
                "replicas": 3
            },
            "Env": {"HOME": "/root"},
            "Release": {},
            "Chart": {}
        })
    }

    #[test]
    fn test_find_closest_matches() {
        let matches = find_closest_matches("toYml", &["toYaml", "toJson", "quote"], 3);
        assert_eq!(matches[0].text, "toYaml");
        assert_eq!(matches[0].distance, 1);
    }

    #[test]
    fn test_exact_match_is_not_a_suggestion() {
        assert!(find_closest_matches("quote", &["quote"], 3).is_empty());
    }

    #[test]
    fn test_lowercase_context_key() {
        let hint = suggest_undefined("values.image.tag", &context());
        assert!(hint.contains("`Values.image.tag`"), "{hint}");
    }

    #[test]
    fn test_misspelled_context_key() {
        let hint = suggest_undefined("Valeus.replicas", &context());
        assert!(hint.contains("`Values`"), "{hint}");
    }

    #[test]
    fn test_misspelled_value_key() {
        let hint = suggest_undefined("Values.image.tga", &context());
        assert!(hint.contains("`Values.image.tag`"), "{hint}");
        assert!(hint.contains("repository"), "{hint}");
    }

    #[test]
    fn test_missing_value_key_lists_available() {
        let hint = suggest_undefined("Values.nonexistent", &context());
        assert!(hint.contains("Available keys: image, replicas"), "{hint}");
    }

    #[test]
    fn test_unknown_helper() {
        let hint = suggest_unknown_helper("toYml", &["toYaml", "toJson"]);
        assert!(hint.contains("`toYaml`"));

        let hint = suggest_unknown_helper("env", &["toYaml"]);
        assert!(hint.contains("not available"));
    }

    #[test]
    fn test_extract_quoted_name() {
        assert_eq!(
            extract_quoted_name("unknown filter `foo`"),
            Some("foo".to_string())
        );
        assert_eq!(
            extract_quoted_name("variable 'bar' is undefined"),
            Some("bar".to_string())
        );
        assert_eq!(extract_quoted_name("no quotes"), None);
    }
}
