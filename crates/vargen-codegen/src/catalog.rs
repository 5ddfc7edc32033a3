//! Template catalog.
//!
//! Templates are files under the templates directory ending in
//! `.<template_extension>`. The file name minus that suffix is the output
//! name pattern (`@Name@Variable.cs.tmpl` produces `MeterVariable.cs`).
//! Templates below a tool-only directory produce tool-only artifacts.
//!
//! An optional first line restricts which referability a template serves:
//!
//! ```text
//! //! referability: value, reference
//! ```

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use vargen_core::{Referability, Settings, VarTypeError, VarTypeResult};

const DIRECTIVE_PREFIX: &str = "//! referability:";

/// Where a template's output lands relative to the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Directly in the target directory.
    RuntimeVisible,
    /// In the target directory's tool-only sibling.
    ToolOnly,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuntimeVisible => "runtime",
            Self::ToolOnly => "tool-only",
        }
    }
}

/// Referability kinds a template is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    ValueOnly,
    ReferenceOnly,
    Both,
}

impl Applicability {
    /// Whether a template with this applicability serves `referability`.
    pub fn supports(&self, referability: Referability) -> bool {
        matches!(
            (self, referability),
            (Self::Both, Referability::Value | Referability::Reference)
                | (Self::ValueOnly, Referability::Value)
                | (Self::ReferenceOnly, Referability::Reference)
        )
    }

    /// Parse the value list of a directive line.
    pub fn parse(list: &str) -> Option<Self> {
        let mut value = false;
        let mut reference = false;
        for item in list.split(',').map(|s| s.trim().to_lowercase()) {
            match item.as_str() {
                "value" => value = true,
                "reference" => reference = true,
                "any" | "both" => {
                    value = true;
                    reference = true;
                }
                _ => return None,
            }
        }
        match (value, reference) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::ValueOnly),
            (false, true) => Some(Self::ReferenceOnly),
            (false, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueOnly => "value",
            Self::ReferenceOnly => "reference",
            Self::Both => "value, reference",
        }
    }
}

/// One template file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateDescriptor {
    pub source_path: PathBuf,
    /// Output file name, still containing placeholders.
    pub name_pattern: String,
    pub applicability: Applicability,
    pub placement: Placement,
}

impl TemplateDescriptor {
    pub fn supports(&self, referability: Referability) -> bool {
        self.applicability.supports(referability)
    }

    /// Template body with the directive line removed.
    pub fn load_body(&self) -> VarTypeResult<String> {
        let text = std::fs::read_to_string(&self.source_path)
            .map_err(|e| VarTypeError::io(&self.source_path, e))?;
        Ok(split_directive(&text).1.to_string())
    }
}

/// Separate an optional directive line from the template body.
///
/// Returns the directive's value list (if any) and the remaining body.
fn split_directive(text: &str) -> (Option<&str>, &str) {
    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (text, ""),
    };
    match first.trim().strip_prefix(DIRECTIVE_PREFIX) {
        Some(list) => (Some(list), rest),
        None => (None, text),
    }
}

/// All templates found by the last scan, ordered by relative path.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<TemplateDescriptor>,
}

impl TemplateCatalog {
    /// Catalog over an explicit template list.
    pub fn from_templates(templates: Vec<TemplateDescriptor>) -> Self {
        Self { templates }
    }

    /// Read every template under `settings.templates_dir`.
    ///
    /// A missing templates directory yields an empty catalog. Templates with
    /// an unreadable body or an unrecognised directive are skipped.
    pub fn scan(settings: &Settings) -> VarTypeResult<Self> {
        let root = &settings.templates_dir;
        if !root.is_dir() {
            warn!(path = %root.display(), "Templates directory not found");
            return Ok(Self::default());
        }

        let suffix = format!(".{}", settings.template_extension);
        let mut templates = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                VarTypeError::Template(format!("failed to walk {}: {}", root.display(), e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name_pattern) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_suffix(&suffix))
                .filter(|pattern| !pattern.is_empty())
            else {
                continue;
            };

            let path = entry.path();
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable template");
                    continue;
                }
            };
            let applicability = match split_directive(&text).0 {
                None => Applicability::Both,
                Some(list) => match Applicability::parse(list) {
                    Some(applicability) => applicability,
                    None => {
                        warn!(path = %path.display(), directive = %list.trim(), "Skipping template with unknown referability directive");
                        continue;
                    }
                },
            };

            let relative = path.strip_prefix(root).unwrap_or(path);
            let placement = if under_dir(relative, &settings.tool_only_dir) {
                Placement::ToolOnly
            } else {
                Placement::RuntimeVisible
            };

            templates.push(TemplateDescriptor {
                source_path: path.to_path_buf(),
                name_pattern: name_pattern.to_string(),
                applicability,
                placement,
            });
        }

        debug!(count = templates.len(), "Template catalog built");
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    /// Templates that serve `referability`, in catalog order.
    pub fn templates_for(&self, referability: Referability) -> impl Iterator<Item = &TemplateDescriptor> {
        self.templates.iter().filter(move |t| t.supports(referability))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Whether a directory component of `relative` is named `dir_name`.
fn under_dir(relative: &Path, dir_name: &str) -> bool {
    relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .any(|c| matches!(c, Component::Normal(part) if part == dir_name))
}

/// Built-in templates written by `vargen init`.
pub static DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (
        "@Name@Variable.cs.tmpl",
        include_str!("templates/@Name@Variable.cs.tmpl"),
    ),
    (
        "@Name@Reference.cs.tmpl",
        include_str!("templates/@Name@Reference.cs.tmpl"),
    ),
    (
        "@Name@Constant.cs.tmpl",
        include_str!("templates/@Name@Constant.cs.tmpl"),
    ),
    (
        "Editor/@Name@VariableEditor.cs.tmpl",
        include_str!("templates/Editor/@Name@VariableEditor.cs.tmpl"),
    ),
];

/// Write the built-in templates into `templates_dir`, leaving existing files untouched.
///
/// Returns the paths written.
pub fn write_default_templates(templates_dir: &Path) -> VarTypeResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (relative, content) in DEFAULT_TEMPLATES {
        let path = templates_dir.join(relative);
        if path.exists() {
            debug!(path = %path.display(), "Template already present");
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VarTypeError::io(parent, e))?;
        }
        std::fs::write(&path, content).map_err(|e| VarTypeError::io(&path, e))?;
        written.push(path);
    }
    Ok(written)
}
