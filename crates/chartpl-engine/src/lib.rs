//! chartpl Engine - strict MiniJinja rendering for charts
//!
//! This crate provides:
//! - `Engine`: renders templates against a `RenderContext` in strict mode
//! - `FunctionLibrary`: the named helper registry (toYaml, quote, dict, ...)
//! - Human-readable error messages with suggestions

pub mod engine;
pub mod error;
pub mod filters;
pub mod functions;
pub mod library;
pub mod suggestions;

pub use engine::{DOCUMENT_SEPARATOR, Engine, EngineBuilder, RenderSummary};
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use library::{FunctionLibrary, RESTRICTED_FUNCTIONS};
