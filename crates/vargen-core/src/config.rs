//! Project settings.
//!
//! Settings come from an optional `vargen.toml` at the project root, then
//! from `VARGEN_*` environment variables. The CLI applies its own flags last.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{VarTypeError, VarTypeResult};

/// Name of the settings file at the project root.
pub const CONFIG_FILE_NAME: &str = "vargen.toml";

const DEFAULT_TEMPLATES_DIR: &str = "VarTypeTemplates";
const DEFAULT_TOOL_ONLY_DIR: &str = "Editor";
const DEFAULT_TEMPLATE_EXTENSION: &str = "tmpl";

const ENV_BUILTIN_MODE: &str = "VARGEN_BUILTIN_MODE";
const ENV_TEMPLATES_DIR: &str = "VARGEN_TEMPLATES_DIR";

/// Contents of `vargen.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    templates_dir: Option<PathBuf>,
    tool_only_dir: Option<String>,
    template_extension: Option<String>,
    builtin_mode: Option<bool>,
}

/// Resolved settings for one project.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub project_root: PathBuf,
    /// Template corpus, absolute.
    pub templates_dir: PathBuf,
    /// Directory name that marks the tool-only partition.
    pub tool_only_dir: String,
    /// Suffix (without dot) stripped from template file names.
    pub template_extension: String,
    /// Elevated mode: new artifacts are system-owned and system sets are editable.
    pub builtin_mode: bool,
}

impl Settings {
    /// Default settings rooted at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            templates_dir: project_root.join(DEFAULT_TEMPLATES_DIR),
            project_root,
            tool_only_dir: DEFAULT_TOOL_ONLY_DIR.to_string(),
            template_extension: DEFAULT_TEMPLATE_EXTENSION.to_string(),
            builtin_mode: false,
        }
    }

    /// Load `vargen.toml` (if present) and apply environment overrides.
    pub fn load(project_root: &Path) -> VarTypeResult<Self> {
        let mut settings = Self::new(project_root);

        let path = project_root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            let raw = std::fs::read_to_string(&path).map_err(|e| VarTypeError::io(&path, e))?;
            let file: ConfigFile = toml::from_str(&raw)
                .map_err(|e| VarTypeError::config(format!("{}: {}", path.display(), e)))?;
            settings.apply_file(file)?;
            debug!(path = %path.display(), "Loaded settings file");
        }

        if let Ok(dir) = std::env::var(ENV_TEMPLATES_DIR) {
            settings.templates_dir = settings.project_root.join(dir);
        }
        if let Ok(flag) = std::env::var(ENV_BUILTIN_MODE) {
            settings.builtin_mode = parse_flag(&flag).ok_or_else(|| {
                VarTypeError::config(format!("{ENV_BUILTIN_MODE} must be a boolean, got '{flag}'"))
            })?;
        }

        Ok(settings)
    }

    fn apply_file(&mut self, file: ConfigFile) -> VarTypeResult<()> {
        if let Some(dir) = file.templates_dir {
            self.templates_dir = self.project_root.join(dir);
        }
        if let Some(name) = file.tool_only_dir {
            let name = name.trim().to_string();
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(VarTypeError::config(format!(
                    "tool_only_dir must be a single directory name, got '{name}'"
                )));
            }
            self.tool_only_dir = name;
        }
        if let Some(ext) = file.template_extension {
            let ext = ext.trim().trim_start_matches('.').to_string();
            if ext.is_empty() {
                return Err(VarTypeError::config("template_extension must not be empty"));
            }
            self.template_extension = ext;
        }
        if let Some(flag) = file.builtin_mode {
            self.builtin_mode = flag;
        }
        Ok(())
    }

    pub fn with_builtin_mode(mut self, builtin_mode: bool) -> Self {
        self.builtin_mode = builtin_mode;
        self
    }

    /// Whether `path` is inside, or is, the tool-only partition.
    ///
    /// Only components below the project root are considered, after `..`
    /// has been applied lexically.
    pub fn is_tool_only(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::ParentDir => {
                    parts.pop();
                }
                _ => {}
            }
        }
        parts.iter().any(|part| *part == self.tool_only_dir.as_str())
    }

    /// The tool-only sibling of a runtime-visible directory.
    pub fn tool_only_sibling(&self, dir: &Path) -> PathBuf {
        dir.join(&self.tool_only_dir)
    }

    /// Resolve a user-supplied path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Starter `vargen.toml` written by `vargen init`.
    pub fn default_config_toml() -> String {
        format!(
            "# vargen settings\n\
             templates_dir = \"{DEFAULT_TEMPLATES_DIR}\"\n\
             tool_only_dir = \"{DEFAULT_TOOL_ONLY_DIR}\"\n\
             template_extension = \"{DEFAULT_TEMPLATE_EXTENSION}\"\n\
             builtin_mode = false\n"
        )
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
