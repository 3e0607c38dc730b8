//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read values from {source_name}: {message}")]
    SourceRead {
        source_name: String,
        message: String,
    },

    #[error("Failed to parse values from {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    #[error("Invalid --set argument '{token}': {message}")]
    SetParse { token: String, message: String },

    #[error("Chart not found: {path}")]
    ChartNotFound { path: String },

    #[error("No such template: {name} (available: {available})")]
    TemplateSelection { name: String, available: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Decode failure for a named source
    pub fn decode(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Read failure for a named source
    pub fn source_read(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::SourceRead {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
