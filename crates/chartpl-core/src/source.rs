//! Value sources and their precedence
//!
//! Sources are folded in a fixed order, later ones winning on conflicts:
//! chart defaults, then `-f` files and URLs, then standard input, then
//! `--set` arguments.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{CoreError, Result};
use crate::set::parse_set_token;
use crate::values::Values;

/// One origin of configuration values
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    /// `values.yaml` shipped inside the chart (missing file is fine)
    ChartDefaults(PathBuf),
    /// A `-f` file on disk
    File(PathBuf),
    /// A `-f` argument that is an http(s) URL
    Url(Url),
    /// YAML piped through standard input
    Stdin,
    /// A `--set` argument
    Set(String),
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::ChartDefaults(path) => write!(f, "chart defaults '{}'", path.display()),
            ValueSource::File(path) => write!(f, "file '{}'", path.display()),
            ValueSource::Url(url) => write!(f, "url '{}'", url),
            ValueSource::Stdin => write!(f, "standard input"),
            ValueSource::Set(token) => write!(f, "--set '{}'", token),
        }
    }
}

impl ValueSource {
    /// Classify a `-f` argument as a URL or a path
    pub fn from_values_arg(arg: &str) -> Self {
        if let Ok(url) = Url::parse(arg) {
            if url.scheme() == "http" || url.scheme() == "https" {
                return Self::Url(url);
            }
        }
        Self::File(PathBuf::from(arg))
    }

    /// Precedence rank; sources with a higher rank override lower ones
    pub fn rank(&self) -> u8 {
        match self {
            ValueSource::ChartDefaults(_) => 0,
            ValueSource::File(_) | ValueSource::Url(_) => 1,
            ValueSource::Stdin => 2,
            ValueSource::Set(_) => 3,
        }
    }

    /// Read and decode this source, taking standard input from `stdin`
    pub fn load_with<R: Read>(&self, stdin: &mut R) -> Result<Values> {
        let name = self.to_string();
        match self {
            ValueSource::ChartDefaults(path) => {
                if !path.exists() {
                    tracing::debug!("no chart defaults at {}", path.display());
                    return Ok(Values::new());
                }
                Values::parse(&name, &read_file(&name, path)?)
            }
            ValueSource::File(path) => Values::parse(&name, &read_file(&name, path)?),
            ValueSource::Url(url) => Values::parse(&name, &fetch_url(&name, url)?),
            ValueSource::Stdin => {
                let mut buf = String::new();
                stdin
                    .read_to_string(&mut buf)
                    .map_err(|e| CoreError::source_read(&name, e))?;
                Values::parse(&name, &buf)
            }
            ValueSource::Set(token) => parse_set_token(token),
        }
    }
}

fn read_file(name: &str, path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CoreError::source_read(name, e))
}

fn fetch_url(name: &str, url: &Url) -> Result<String> {
    tracing::debug!("fetching values from {}", url);
    let response =
        reqwest::blocking::get(url.clone()).map_err(|e| CoreError::source_read(name, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CoreError::source_read(name, format!("server returned {}", status)));
    }

    response.text().map_err(|e| CoreError::source_read(name, e))
}

/// Put sources in precedence order, keeping command-line order within a rank
pub fn order_sources(mut sources: Vec<ValueSource>) -> Vec<ValueSource> {
    sources.sort_by_key(ValueSource::rank);
    sources
}

/// Load every source and fold them into one tree
///
/// Sources are sorted by precedence first, so callers may pass them in any
/// order. The first failing source aborts the fold.
pub fn resolve_values<R: Read>(sources: Vec<ValueSource>, stdin: &mut R) -> Result<Values> {
    let mut values = Values::new();

    for source in order_sources(sources) {
        let layer = source.load_with(stdin)?;
        tracing::debug!("merging values from {}", source);
        values.merge(&layer);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_from_values_arg() {
        assert!(matches!(
            ValueSource::from_values_arg("https://example.com/values.yaml"),
            ValueSource::Url(_)
        ));
        assert!(matches!(
            ValueSource::from_values_arg("http://example.com/values.yaml"),
            ValueSource::Url(_)
        ));
        assert_eq!(
            ValueSource::from_values_arg("./values.yaml"),
            ValueSource::File(PathBuf::from("./values.yaml"))
        );
        assert_eq!(
            ValueSource::from_values_arg("C:/values.yaml"),
            ValueSource::File(PathBuf::from("C:/values.yaml"))
        );
    }

    #[test]
    fn test_precedence_across_all_sources() {
        let dir = TempDir::new().unwrap();
        let defaults = write(&dir, "values.yaml", "a: {x: 1, y: 2}\nlist: [1, 2, 3]\nonly: defaults\n");
        let file = write(&dir, "override.yaml", "list: [9]\nfrom: file\nshared: file\n");
        let mut stdin = Cursor::new("shared: stdin\nfrom_stdin: true\n");

        let values = resolve_values(
            vec![
                ValueSource::Set("a.y=9".to_string()),
                ValueSource::Stdin,
                ValueSource::File(file),
                ValueSource::ChartDefaults(defaults),
            ],
            &mut stdin,
        )
        .unwrap();

        assert_eq!(
            values.into_inner(),
            json!({
                "a": {"x": 1, "y": 9},
                "list": [9],
                "only": "defaults",
                "from": "file",
                "shared": "stdin",
                "from_stdin": true
            })
        );
    }

    #[test]
    fn test_set_beats_stdin() {
        let mut stdin = Cursor::new("key: stdin\n");
        let values = resolve_values(
            vec![ValueSource::Stdin, ValueSource::Set("key=set".to_string())],
            &mut stdin,
        )
        .unwrap();
        assert_eq!(values.get("key").unwrap(), "set");
    }

    #[test]
    fn test_files_keep_command_line_order() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "first.yaml", "k: first\n");
        let second = write(&dir, "second.yaml", "k: second\n");

        let values = resolve_values(
            vec![ValueSource::File(first), ValueSource::File(second)],
            &mut std::io::empty(),
        )
        .unwrap();
        assert_eq!(values.get("k").unwrap(), "second");
    }

    #[test]
    fn test_missing_chart_defaults_is_empty() {
        let dir = TempDir::new().unwrap();
        let values = ValueSource::ChartDefaults(dir.path().join("values.yaml"))
            .load_with(&mut std::io::empty())
            .unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_missing_file_is_source_read_error() {
        let dir = TempDir::new().unwrap();
        let err = ValueSource::File(dir.path().join("nope.yaml"))
            .load_with(&mut std::io::empty())
            .unwrap_err();
        assert!(matches!(err, CoreError::SourceRead { .. }));
        assert!(err.to_string().contains("nope.yaml"));
    }

    #[test]
    fn test_invalid_yaml_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.yaml", "a: [1, 2\n");
        let err = ValueSource::File(path).load_with(&mut std::io::empty()).unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
    }

    #[test]
    fn test_empty_stdin_is_empty_mapping() {
        let values = ValueSource::Stdin.load_with(&mut std::io::empty()).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ValueSource::Stdin.to_string(), "standard input");
        assert_eq!(ValueSource::Set("a=1".to_string()).to_string(), "--set 'a=1'");
    }
}
