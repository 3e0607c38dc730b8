//! Chart discovery and template selection

use std::path::{Path, PathBuf};


use crate::error::{CoreError, Result};
use crate::values::Values;

/// Chart metadata file name
pub const CHART_FILE: &str = "Chart.yaml";

/// Default values file name
pub const VALUES_FILE: &str = "values.yaml";

/// Templates directory name
pub const TEMPLATES_DIR: &str = "templates";

/// A chart directory on disk
#[derive(Debug, Clone)]
pub struct Chart {
    /// Root directory of the chart
    pub root: PathBuf,

    /// Templates directory
    pub templates_dir: PathBuf,

    /// Default values file path (may not exist)
    pub values_path: PathBuf,

    /// Decoded `Chart.yaml`, if the chart has one
    pub metadata: Option<Values>,
}

/// A discovered template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    /// Identifier used by `--template` (file stem)
    pub name: String,

    /// Path to the template file
    pub path: PathBuf,
}

/// Ordered list of templates chosen for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSelection(Vec<TemplateRef>);

impl TemplateSelection {
    /// Select templates by identifier, keeping the requested order
    ///
    /// An empty request selects every discovered template in discovery
    /// order. Unknown identifiers fail the whole selection.
    pub fn resolve(discovered: &[TemplateRef], requested: &[String]) -> Result<Self> {
        if requested.is_empty() {
            return Ok(Self(discovered.to_vec()));
        }

        let mut selected = Vec::with_capacity(requested.len());
        for name in requested {
            let template = discovered
                .iter()
                .find(|t| &t.name == name)
                .ok_or_else(|| CoreError::TemplateSelection {
                    name: name.clone(),
                    available: available_names(discovered),
                })?;
            selected.push(template.clone());
        }

        Ok(Self(selected))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TemplateRef> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Template identifiers in render order
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a TemplateSelection {
    type Item = &'a TemplateRef;
    type IntoIter = std::slice::Iter<'a, TemplateRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<TemplateRef>> for TemplateSelection {
    fn from(templates: Vec<TemplateRef>) -> Self {
        Self(templates)
    }
}

fn available_names(discovered: &[TemplateRef]) -> String {
    if discovered.is_empty() {
        return "none".to_string();
    }
    discovered
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Chart {
    /// Load a chart from a directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(CoreError::ChartNotFound {
                path: root.display().to_string(),
            });
        }

        let chart_file = root.join(CHART_FILE);
        let metadata = if chart_file.exists() {
            let name = format!("chart file '{}'", chart_file.display());
            let content = std::fs::read_to_string(&chart_file)
                .map_err(|e| CoreError::source_read(&name, e))?;
            Some(Values::parse(&name, &content)?)
        } else {
            tracing::debug!("{} has no {}", root.display(), CHART_FILE);
            None
        };

        Ok(Self {
            templates_dir: root.join(TEMPLATES_DIR),
            values_path: root.join(VALUES_FILE),
            root,
            metadata,
        })
    }

    /// Discover templates: `templates/*.yaml`, sorted by file name
    pub fn template_files(&self) -> Result<Vec<TemplateRef>> {
        let dir = glob::Pattern::escape(&self.templates_dir.to_string_lossy());
        let pattern = format!("{}/*.yaml", dir);

        let paths = glob::glob(&pattern).map_err(|e| CoreError::ChartNotFound {
            path: format!("{} ({})", self.templates_dir.display(), e),
        })?;

        let mut templates = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| CoreError::Io(e.into()))?;
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            templates.push(TemplateRef { name, path });
        }

        templates.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!("discovered {} template(s) in {}", templates.len(), self.templates_dir.display());
        Ok(templates)
    }

    /// Discover templates and apply a `--template` selection
    pub fn select_templates(&self, requested: &[String]) -> Result<TemplateSelection> {
        let discovered = self.template_files()?;
        TemplateSelection::resolve(&discovered, requested)
    }
}
