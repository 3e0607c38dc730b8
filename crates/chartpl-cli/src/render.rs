//! The render pipeline: chart, values, context, output

use std::io::{Read, Write};
use std::path::Path;

use chartpl_core::{
    Chart, EnvSnapshot, ReleaseInfo, RenderContext, ValueSource, Values, resolve_values,
};
use chartpl_engine::{Engine, RenderSummary};
use console::style;

use crate::error::Result;

/// Everything one invocation needs, already parsed from the command line
#[derive(Debug, Default)]
pub struct RenderRequest<'a> {
    pub values_files: &'a [String],
    pub set_values: &'a [String],
    pub values_from_stdin: bool,
    pub release_name: Option<String>,
    pub namespace: Option<String>,
    pub templates: &'a [String],
    pub debug: bool,
}

impl RenderRequest<'_> {
    /// Value sources in command-line order; precedence is applied when resolving
    fn sources(&self, chart: &Chart) -> Vec<ValueSource> {
        let mut sources = vec![ValueSource::ChartDefaults(chart.values_path.clone())];
        sources.extend(
            self.values_files
                .iter()
                .map(|arg| ValueSource::from_values_arg(arg)),
        );
        if self.values_from_stdin {
            sources.push(ValueSource::Stdin);
        }
        sources.extend(self.set_values.iter().cloned().map(ValueSource::Set));
        sources
    }
}

/// Render a chart to `out`, reading stdin values from `stdin`
pub fn run<R: Read, W: Write>(
    chart_path: &Path,
    request: &RenderRequest<'_>,
    stdin: &mut R,
    out: &mut W,
) -> Result<RenderSummary> {
    let chart = Chart::load(chart_path)?;
    tracing::debug!("loaded chart from {}", chart.root.display());

    // Unknown templates fail before any value source is touched
    let selection = chart.select_templates(request.templates)?;

    let values = resolve_values(request.sources(&chart), stdin)?;
    if request.debug {
        print_values(&values)?;
    }

    let context = RenderContext::new(
        values,
        EnvSnapshot::capture(),
        ReleaseInfo::new(request.release_name.clone(), request.namespace.clone()),
        chart.metadata.clone(),
    );

    let engine = Engine::default();
    let summary = engine.render(&context, &selection, out)?;

    tracing::debug!(
        "rendered {} template(s), {} bytes",
        summary.templates.len(),
        summary.bytes_written
    );
    Ok(summary)
}

/// Dump the merged values to stderr
fn print_values(values: &Values) -> Result<()> {
    let yaml = values.to_yaml()?;
    eprintln!("{}", style("# Computed Values").cyan().bold());
    eprintln!("{}", style(yaml.trim_end()).dim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use std::fs;
    use tempfile::TempDir;

    fn create_chart(values: &str, templates: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("values.yaml"), values).unwrap();
        fs::create_dir(dir.path().join("templates")).unwrap();
        for (name, content) in templates {
            fs::write(dir.path().join("templates").join(name), content).unwrap();
        }
        dir
    }

    fn render(chart: &TempDir, request: &RenderRequest<'_>, stdin: &str) -> (Result<RenderSummary>, String) {
        let mut out = Vec::new();
        let result = run(chart.path(), request, &mut stdin.as_bytes(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_sources_follow_command_line() {
        let chart = create_chart("", &[]);
        let chart = Chart::load(chart.path()).unwrap();
        let files = vec!["a.yaml".to_string(), "https://example.com/v.yaml".to_string()];
        let sets = vec!["x=1".to_string()];
        let request = RenderRequest {
            values_files: &files,
            set_values: &sets,
            values_from_stdin: true,
            ..Default::default()
        };

        let sources = request.sources(&chart);
        assert_eq!(sources.len(), 5);
        assert!(matches!(sources[0], ValueSource::ChartDefaults(_)));
        assert!(matches!(sources[1], ValueSource::File(_)));
        assert!(matches!(sources[2], ValueSource::Url(_)));
        assert_eq!(sources[3], ValueSource::Stdin);
        assert_eq!(sources[4], ValueSource::Set("x=1".to_string()));
    }

    #[test]
    fn test_stdin_ignored_without_flag() {
        let chart = create_chart("k: default\n", &[("a.yaml", "{{ Values.k }}")]);

        let (result, out) = render(&chart, &RenderRequest::default(), "k: stdin\n");
        result.unwrap();
        assert_eq!(out, "default");
    }

    #[test]
    fn test_stdin_and_set_precedence() {
        let chart = create_chart(
            "a: defaults\nb: defaults\nc: defaults\n",
            &[("t.yaml", "{{ Values.a }} {{ Values.b }} {{ Values.c }}")],
        );
        let sets = vec!["c=set".to_string()];
        let request = RenderRequest {
            values_from_stdin: true,
            set_values: &sets,
            ..Default::default()
        };

        let (result, out) = render(&chart, &request, "b: stdin\nc: stdin\n");
        result.unwrap();
        assert_eq!(out, "defaults stdin set");
    }

    #[test]
    fn test_selection_checked_before_values() {
        let chart = create_chart("", &[("a.yaml", "a")]);
        let files = vec!["/definitely/not/here.yaml".to_string()];
        let templates = vec!["missing".to_string()];
        let request = RenderRequest {
            values_files: &files,
            templates: &templates,
            ..Default::default()
        };

        let (result, out) = render(&chart, &request, "");
        assert!(matches!(result, Err(CliError::Chart { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn test_release_fields() {
        let chart = create_chart("", &[("r.yaml", "{{ Release | toJson }}")]);
        let request = RenderRequest {
            release_name: Some("web".to_string()),
            ..Default::default()
        };

        let (result, out) = render(&chart, &request, "");
        result.unwrap();
        assert_eq!(out, r#"{"Name":"web"}"#);
    }

    #[test]
    fn test_unreadable_template_is_named() {
        let chart = create_chart("", &[("a.yaml", "ok")]);
        fs::write(chart.path().join("templates").join("b.yaml"), [0xff, 0xfe, 0x00]).unwrap();

        let (result, out) = render(&chart, &RenderRequest::default(), "");
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::IO_ERROR);
        assert!(err.to_string().contains("'b'"), "got: {}", err);
        assert_eq!(out, "ok");
    }
}
