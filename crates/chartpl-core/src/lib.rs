//! chartpl Core - value resolution for the chart template renderer
//!
//! This crate provides the data side of the rendering pipeline:
//! - `Values`: Configuration values with deep merge support
//! - `set`: Helm-style `--set key=value` parsing
//! - `source`: Loading values from chart defaults, files, URLs and stdin
//! - `chart`: Chart discovery and template selection
//! - `context`: The immutable rendering context handed to templates

pub mod chart;
pub mod context;
pub mod error;
pub mod set;
pub mod source;
pub mod values;

pub use chart::{Chart, TemplateRef, TemplateSelection};
pub use context::{EnvSnapshot, ReleaseInfo, RenderContext};
pub use error::{CoreError, Result};
pub use set::{parse_set_token, parse_set_values};
pub use source::{ValueSource, resolve_values};
pub use values::Values;
