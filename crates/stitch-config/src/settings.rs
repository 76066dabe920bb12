//! Compiler Configuration (stitch.toml)
//!
//! Handles the optional `stitch.toml` file that sits next to (or above) the
//! projects directory. Every section and every key is optional; accessors on
//! [`StitchConfig`] fall back to the built-in defaults.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default projects directory, relative to the config root
pub const DEFAULT_PROJECTS_DIR: &str = "projects";
/// Default script fragment extension
pub const DEFAULT_SCRIPT_EXT: &str = "js";
/// Default markup fragment extension
pub const DEFAULT_MARKUP_EXT: &str = "html";
/// Default stylesheet fragment extension
pub const DEFAULT_STYLE_EXT: &str = "scss";
/// Default specifier of the virtual utility module
pub const DEFAULT_UTILITY_MODULE: &str = "utils";
/// Default external stylesheet compiler
pub const DEFAULT_STYLE_COMPILER: &str = "sass";
/// Default watcher debounce window
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Configuration file model for stitch.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StitchConfig {
    /// Projects directory settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<ProjectsSection>,

    /// Fragment file extensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ExtensionsSection>,

    /// Virtual utility module
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utility: Option<UtilitySection>,

    /// External stylesheet compiler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSection>,

    /// Minifier settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<MinifySection>,

    /// Watch mode settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectsSection {
    /// Directory holding one subdirectory per project (default: "projects")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ExtensionsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct UtilitySection {
    /// Import specifier that names the utility module (default: "utils")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Shared utility file (default: "<projects dir>/utils.<script ext>")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StyleSection {
    /// Compiler executable (default: "sass")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,

    /// Extra arguments passed before the stylesheet path
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct MinifySection {
    /// Write minified artifacts (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Strip comments while minifying (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_comments: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

impl StitchConfig {
    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration text; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: origin.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(ext) = &self.extensions {
            for (field, value) in [
                ("extensions.script", &ext.script),
                ("extensions.markup", &ext.markup),
                ("extensions.style", &ext.style),
            ] {
                if let Some(value) = value {
                    validate_extension(field, value)?;
                }
            }
        }

        let (script, markup, style) = (self.script_ext(), self.markup_ext(), self.style_ext());
        if script == markup || script == style || markup == style {
            return Err(ConfigError::ValidationError(format!(
                "fragment extensions must be distinct (script={}, markup={}, style={})",
                script, markup, style
            )));
        }

        if let Some(module) = self.utility.as_ref().and_then(|u| u.module.as_deref()) {
            if module.is_empty() || module.contains(['\'', '"']) {
                return Err(ConfigError::InvalidValue {
                    field: "utility.module".to_string(),
                    reason: format!("'{}' is not a usable import specifier", module),
                });
            }
        }

        if let Some(compiler) = self.style.as_ref().and_then(|s| s.compiler.as_deref()) {
            if compiler.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "style.compiler".to_string(),
                    reason: "compiler cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Projects directory as written in the file (relative paths are resolved by the loader)
    pub fn projects_dir(&self) -> &Path {
        self.projects
            .as_ref()
            .and_then(|p| p.dir.as_deref())
            .unwrap_or_else(|| Path::new(DEFAULT_PROJECTS_DIR))
    }

    pub fn script_ext(&self) -> &str {
        self.extensions
            .as_ref()
            .and_then(|e| e.script.as_deref())
            .unwrap_or(DEFAULT_SCRIPT_EXT)
    }

    pub fn markup_ext(&self) -> &str {
        self.extensions
            .as_ref()
            .and_then(|e| e.markup.as_deref())
            .unwrap_or(DEFAULT_MARKUP_EXT)
    }

    pub fn style_ext(&self) -> &str {
        self.extensions
            .as_ref()
            .and_then(|e| e.style.as_deref())
            .unwrap_or(DEFAULT_STYLE_EXT)
    }

    pub fn utility_module(&self) -> &str {
        self.utility
            .as_ref()
            .and_then(|u| u.module.as_deref())
            .unwrap_or(DEFAULT_UTILITY_MODULE)
    }

    /// Utility file as written in the file, if any
    pub fn utility_file(&self) -> Option<&Path> {
        self.utility.as_ref().and_then(|u| u.file.as_deref())
    }

    pub fn style_compiler(&self) -> &str {
        self.style
            .as_ref()
            .and_then(|s| s.compiler.as_deref())
            .unwrap_or(DEFAULT_STYLE_COMPILER)
    }

    pub fn style_args(&self) -> &[String] {
        self.style.as_ref().map(|s| s.args.as_slice()).unwrap_or(&[])
    }

    pub fn minify_enabled(&self) -> bool {
        self.minify.as_ref().and_then(|m| m.enabled).unwrap_or(true)
    }

    pub fn strip_comments(&self) -> bool {
        self.minify
            .as_ref()
            .and_then(|m| m.strip_comments)
            .unwrap_or(true)
    }

    pub fn debounce_ms(&self) -> u64 {
        self.watch
            .as_ref()
            .and_then(|w| w.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS)
    }
}

/// Extensions are bare suffixes such as "js", never ".js" or "min.js"
fn validate_extension(field: &str, value: &str) -> ConfigResult<()> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a bare file extension", value),
        })
    }
}
