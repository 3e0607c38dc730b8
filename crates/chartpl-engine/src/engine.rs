//! Template engine based on MiniJinja

use std::io::Write;

use chartpl_core::{RenderContext, TemplateSelection};
use minijinja::{Environment, Value};

use crate::error::{EngineError, Result, SuggestionScope, TemplateError};
use crate::library::FunctionLibrary;

/// Written between two rendered documents
pub const DOCUMENT_SEPARATOR: &str = "\n---\n";

/// Outcome of a successful multi-template render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Identifiers of rendered templates, in output order
    pub templates: Vec<String>,

    /// Total bytes written to the sink, separators included
    pub bytes_written: usize,
}

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
    library: FunctionLibrary,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            strict_mode: true,
            library: FunctionLibrary::sandboxed(),
        }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Replace the helper library (the sandboxed one by default)
    pub fn functions(mut self, library: FunctionLibrary) -> Self {
        self.library = library;
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        Engine {
            strict_mode: self.strict_mode,
            helper_names: self.library.known_names(),
            library: self.library,
        }
    }
}

/// The template engine
pub struct Engine {
    strict_mode: bool,
    library: FunctionLibrary,
    helper_names: Vec<&'static str>,
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::new().build()
    }
}

impl Engine {
    /// Create an engine with the sandboxed library
    pub fn new(strict_mode: bool) -> Self {
        EngineBuilder::new().strict(strict_mode).build()
    }

    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Create a configured MiniJinja environment
    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        }

        // Rendered bodies keep their final newline byte-for-byte
        env.set_keep_trailing_newline(true);
        // Source snippets for error reports
        env.set_debug(true);

        self.library.install(&mut env);

        env
    }

    fn parse_error(&self, err: &minijinja::Error, name: &str, source: &str, ctx: &serde_json::Value) -> EngineError {
        EngineError::Parse(TemplateError::from_minijinja(
            err,
            name,
            source,
            Some(self.scope(ctx)),
        ))
    }

    fn evaluation_error(&self, err: &minijinja::Error, name: &str, source: &str, ctx: &serde_json::Value) -> EngineError {
        EngineError::Evaluation(TemplateError::from_minijinja(
            err,
            name,
            source,
            Some(self.scope(ctx)),
        ))
    }

    fn scope<'a>(&'a self, ctx: &'a serde_json::Value) -> SuggestionScope<'a> {
        SuggestionScope {
            context: ctx,
            helpers: &self.helper_names,
        }
    }

    /// Parse then evaluate one template in `env`
    fn render_in(
        &self,
        env: &mut Environment<'static>,
        name: &str,
        source: &str,
        ctx: &Value,
        ctx_json: &serde_json::Value,
    ) -> Result<String> {
        env.add_template_owned(name.to_string(), source.to_string())
            .map_err(|e| self.parse_error(&e, name, source, ctx_json))?;

        let tmpl = env
            .get_template(name)
            .map_err(|e| self.parse_error(&e, name, source, ctx_json))?;

        tmpl.render(ctx)
            .map_err(|e| self.evaluation_error(&e, name, source, ctx_json))
    }

    /// Render a single template string
    pub fn render_string(
        &self,
        template: &str,
        context: &RenderContext,
        template_name: &str,
    ) -> Result<String> {
        let mut env = self.create_environment();
        let ctx_json = context.to_json();
        let ctx = Value::from_serialize(&ctx_json);

        self.render_in(&mut env, template_name, template, &ctx, &ctx_json)
    }

    /// Render in-memory `(name, source)` documents into `sink`
    ///
    /// Documents after the first are preceded by [`DOCUMENT_SEPARATOR`].
    /// The first failure stops the run; earlier documents stay written.
    pub fn render_documents<W, I, N, S>(
        &self,
        context: &RenderContext,
        documents: I,
        sink: &mut W,
    ) -> Result<RenderSummary>
    where
        W: Write,
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut env = self.create_environment();
        let ctx_json = context.to_json();
        let ctx = Value::from_serialize(&ctx_json);
        let mut out = DocumentSink::new(sink);

        for (name, source) in documents {
            let name = name.as_ref();
            let body = self.render_in(&mut env, name, source.as_ref(), &ctx, &ctx_json)?;
            out.write_document(name, &body)?;
        }

        out.finish()
    }

    /// Render the selected templates of a chart into `sink`
    ///
    /// Templates are read from disk one at a time, so a failing template
    /// leaves the output of the ones before it in the sink.
    pub fn render<W: Write>(
        &self,
        context: &RenderContext,
        selection: &TemplateSelection,
        sink: &mut W,
    ) -> Result<RenderSummary> {
        let mut env = self.create_environment();
        let ctx_json = context.to_json();
        let ctx = Value::from_serialize(&ctx_json);
        let mut out = DocumentSink::new(sink);

        for template in selection {
            tracing::debug!("rendering template {} from {}", template.name, template.path.display());
            let source = std::fs::read_to_string(&template.path).map_err(|source| {
                EngineError::TemplateRead {
                    template: template.name.clone(),
                    path: template.path.display().to_string(),
                    source,
                }
            })?;
            let body = self.render_in(&mut env, &template.name, &source, &ctx, &ctx_json)?;
            out.write_document(&template.name, &body)?;
        }

        out.finish()
    }
}

/// Frames rendered documents with separators
struct DocumentSink<'w, W: Write> {
    sink: &'w mut W,
    summary: RenderSummary,
}

impl<'w, W: Write> DocumentSink<'w, W> {
    fn new(sink: &'w mut W) -> Self {
        Self {
            sink,
            summary: RenderSummary::default(),
        }
    }

    fn write_document(&mut self, name: &str, body: &str) -> Result<()> {
        if !self.summary.templates.is_empty() {
            self.sink.write_all(DOCUMENT_SEPARATOR.as_bytes())?;
            self.summary.bytes_written += DOCUMENT_SEPARATOR.len();
        }
        self.sink.write_all(body.as_bytes())?;
        self.summary.bytes_written += body.len();
        self.summary.templates.push(name.to_string());
        Ok(())
    }

    fn finish(self) -> Result<RenderSummary> {
        self.sink.flush()?;
        Ok(self.summary)
    }
}
