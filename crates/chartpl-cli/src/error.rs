//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use chartpl_core::CoreError;
use chartpl_engine::{EngineError, TemplateError};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// A values source or --set token could not be turned into values
    #[error("Invalid values: {message}")]
    #[diagnostic(code(chartpl::cli::values))]
    Values {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Template parsing or rendering failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(TemplateError),

    /// Chart structure or template selection error
    #[error("Chart error: {message}")]
    #[diagnostic(code(chartpl::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, unreachable URL, closed output)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartpl::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Values { .. } => exit_codes::VALUES_ERROR,
            CliError::Template(_) => exit_codes::TEMPLATE_ERROR,
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a values error
    pub fn values(message: impl Into<String>) -> Self {
        Self::Values {
            message: message.into(),
            help: None,
        }
    }

    /// Create a chart error with help text
    pub fn chart_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Chart {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SourceRead { .. } => CliError::Io {
                message: err.to_string(),
            },
            CoreError::Decode { .. } => CliError::values(err.to_string()),
            CoreError::SetParse { .. } => CliError::Values {
                message: err.to_string(),
                help: Some(
                    "Use key=value pairs, e.g. --set image.tag=v2,replicas=3 or --set tags={a,b}"
                        .to_string(),
                ),
            },
            CoreError::ChartNotFound { ref path } => CliError::chart_with_help(
                err.to_string(),
                format!("Expected a directory with a templates/ folder at {}", path),
            ),
            CoreError::TemplateSelection { ref available, .. } => CliError::chart_with_help(
                err.to_string(),
                format!("Available templates: {}", available),
            ),
            CoreError::Io(e) => CliError::from(e),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Parse(e) | EngineError::Evaluation(e) => CliError::Template(e),
            EngineError::TemplateRead { .. } => CliError::Io {
                message: err.to_string(),
            },
            EngineError::Io(e) => CliError::from(e),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
