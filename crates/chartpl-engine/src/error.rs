//! Engine error types with beautiful formatting

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::suggestions::{
    extract_quoted_name, suggest_iteration_fix, suggest_undefined, suggest_unknown_helper,
};

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    /// Template could not be parsed
    #[error("Failed to parse template '{}'", .0.template_name)]
    #[diagnostic(code(chartpl::template::parse))]
    Parse(#[diagnostic_source] TemplateError),

    /// Template parsed but failed while rendering
    #[error("Failed to render template '{}'", .0.template_name)]
    #[diagnostic(code(chartpl::template::render))]
    Evaluation(#[diagnostic_source] TemplateError),

    /// A selected template file could not be read
    #[error("Failed to read template '{template}' from {path}: {source}")]
    #[diagnostic(code(chartpl::template::read))]
    TemplateRead {
        template: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// The template error behind a parse or evaluation failure
    pub fn template_error(&self) -> Option<&TemplateError> {
        match self {
            EngineError::Parse(e) | EngineError::Evaluation(e) => Some(e),
            EngineError::TemplateRead { .. } | EngineError::Io(_) => None,
        }
    }
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    TypeError,
    InvalidOperation,
    Other,
}

impl TemplateErrorKind {
    /// Convert to a code string for diagnostics
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined_variable",
            Self::UnknownFilter => "unknown_filter",
            Self::UnknownFunction => "unknown_function",
            Self::SyntaxError => "syntax",
            Self::TypeError => "type",
            Self::InvalidOperation => "invalid_operation",
            Self::Other => "render",
        }
    }
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
pub struct TemplateError {
    /// Error message
    pub message: String,

    /// Error kind for categorization
    pub kind: TemplateErrorKind,

    /// Identifier of the failing template
    pub template_name: String,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error
    #[help]
    pub suggestion: Option<String>,
}

/// What the suggestion engine may look at
#[derive(Debug, Clone, Copy)]
pub struct SuggestionScope<'a> {
    /// The serialized render context
    pub context: &'a serde_json::Value,
    /// Helper names callable from templates
    pub helpers: &'a [&'a str],
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    pub fn from_minijinja(
        err: &minijinja::Error,
        template_name: &str,
        template_source: &str,
        scope: Option<SuggestionScope<'_>>,
    ) -> Self {
        let (kind, message) = categorize_minijinja_error(err);
        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));
        let suggestion = generate_suggestion(err, kind, scope);

        Self {
            message,
            kind,
            template_name: template_name.to_string(),
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    /// Create a simple error without source mapping
    pub fn simple(template_name: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TemplateErrorKind::Other,
            template_name: template_name.to_string(),
            src: NamedSource::new(template_name, String::new()),
            span: None,
            suggestion: None,
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Categorize a MiniJinja error into our error kinds
fn categorize_minijinja_error(err: &minijinja::Error) -> (TemplateErrorKind, String) {
    let msg = err.to_string();
    let detailed = format!("{:#}", err);

    let kind = match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::UnknownFunction => TemplateErrorKind::UnknownFunction,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => {
            let msg_lower = msg.to_lowercase();
            if msg_lower.contains("not iterable") || msg_lower.contains("cannot") {
                TemplateErrorKind::TypeError
            } else {
                TemplateErrorKind::Other
            }
        }
    };

    let enhanced_msg = match kind {
        TemplateErrorKind::UndefinedVariable => match extract_expression_from_display(&detailed) {
            Some(expr) => format!("undefined variable `{}`", expr),
            None => msg.replace("undefined value", "undefined variable"),
        },
        TemplateErrorKind::UnknownFilter => match extract_filter_from_display(&detailed) {
            Some(filter) => format!("unknown filter `{}`", filter),
            None => msg,
        },
        _ => msg
            .replace("invalid operation: ", "")
            .replace("syntax error: ", ""),
    };

    (kind, enhanced_msg)
}

/// Find the `{{ ... }}` expression on the line MiniJinja marks with `>`
fn marked_expression(display: &str) -> Option<&str> {
    // MiniJinja format:
    //    8 >   typo: {{ Values.app.name }}
    //      i            ^^^^^^^^^ undefined value
    display
        .lines()
        .find(|line| {
            let trimmed = line.trim_start();
            trimmed.contains(" > ") || trimmed.starts_with("> ")
        })
        .and_then(|line| {
            let start = line.find("{{")?;
            let end = line[start..].find("}}")?;
            Some(&line[start + 2..start + end])
        })
}

/// Extract the problematic expression from MiniJinja's detailed display
fn extract_expression_from_display(display: &str) -> Option<String> {
    let expr = marked_expression(display)?.trim();
    // Get the first part before any filter
    let expr_part = expr.split('|').next().unwrap_or(expr).trim();
    (!expr_part.is_empty()).then(|| expr_part.to_string())
}

/// Extract the filter name from MiniJinja's detailed display
fn extract_filter_from_display(display: &str) -> Option<String> {
    let expr = marked_expression(display)?;
    let pipe_pos = expr.rfind('|')?;
    let name = expr[pipe_pos + 1..]
        .split(|c: char| c.is_whitespace() || c == '(')
        .find(|s| !s.is_empty())?;
    Some(name.to_string())
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (idx, line) in source.lines().enumerate() {
        if idx + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len().into()));
        }
        offset += line.len() + 1;
    }

    None
}

/// Generate context-aware suggestions based on error kind
fn generate_suggestion(
    err: &minijinja::Error,
    kind: TemplateErrorKind,
    scope: Option<SuggestionScope<'_>>,
) -> Option<String> {
    let msg = err.to_string();
    let detailed = format!("{:#}", err);

    match kind {
        TemplateErrorKind::UndefinedVariable => {
            let expr = extract_expression_from_display(&detailed)?;
            match scope {
                Some(scope) => Some(suggest_undefined(&expr, scope.context)),
                None => Some(format!(
                    "`{}` is not defined. Check spelling or use `| default(\"fallback\")`.",
                    expr
                )),
            }
        }

        TemplateErrorKind::UnknownFilter | TemplateErrorKind::UnknownFunction => {
            let name = if kind == TemplateErrorKind::UnknownFilter {
                extract_filter_from_display(&detailed)
            } else {
                None
            }
            .or_else(|| unknown_helper_name(&msg))
            .or_else(|| extract_quoted_name(&msg))?;
            let helpers = scope.map(|s| s.helpers).unwrap_or_default();
            Some(suggest_unknown_helper(&name, helpers))
        }

        TemplateErrorKind::SyntaxError => {
            if msg.contains('}') || msg.contains('%') {
                Some(
                    "Check bracket matching: `{{ }}` for expressions, `{% %}` for statements, `{# #}` for comments".to_string(),
                )
            } else if msg.contains("expected") {
                Some("Check for missing closing tags or mismatched brackets.".to_string())
            } else {
                None
            }
        }

        TemplateErrorKind::TypeError | TemplateErrorKind::InvalidOperation => {
            let lower = msg.to_lowercase();
            if lower.contains("not iterable") {
                Some(suggest_iteration_fix("map"))
            } else if lower.contains("not callable") {
                Some("Use `{{ value }}` for variables, `{{ func() }}` for function calls.".to_string())
            } else {
                None
            }
        }

        _ => None,
    }
}

/// MiniJinja reports unknown helpers as "... <name> is unknown (in <template>:<line>)"
fn unknown_helper_name(msg: &str) -> Option<String> {
    let before = &msg[..msg.find(" is unknown")?];
    before
        .split_whitespace()
        .last()
        .map(|name| name.trim_matches(|c| c == '`' || c == '\'' || c == '"').to_string())
        .filter(|name| !name.is_empty())
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
