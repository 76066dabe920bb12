//! Configuration Loader
//!
//! Handles loading configuration from multiple sources with proper precedence.

use crate::settings::StitchConfig;
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for
pub const CONFIG_FILE_NAME: &str = "stitch.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources with the following precedence:
/// 1. Built-in defaults - lowest priority
/// 2. stitch.toml (found by walking up from the start directory)
/// 3. Environment variables (STITCH_*) - overrides the file
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Read STITCH_* variables
    use_env: bool,
}

/// Loaded configuration with paths resolved against the config root
#[derive(Debug, Clone)]
pub struct Config {
    /// File settings with environment overrides applied
    pub file: StitchConfig,

    /// Directory relative paths are resolved against: the directory holding
    /// stitch.toml, or the start directory when no file was found
    pub root: PathBuf,

    /// Path of the loaded stitch.toml, if any
    pub config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { use_env: true }
    }

    /// Ignore environment variables (used by tests and embedders)
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find stitch.toml. A missing file is not
    /// an error: defaults apply and the start directory becomes the root.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (root, config_path, file) = match find_config_file(start_dir) {
            Some(path) => {
                let file = StitchConfig::load_from_file(&path)?;
                let root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| start_dir.to_path_buf());
                (root, Some(path), file)
            }
            None => (start_dir.to_path_buf(), None, StitchConfig::default()),
        };

        let file = self.apply_env_overrides(file)?;

        Ok(Config {
            file,
            root,
            config_path,
        })
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let file = StitchConfig::load_from_file(config_path)?;
        let file = self.apply_env_overrides(file)?;
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::InvalidPath(config_path.to_path_buf()))?;

        Ok(Config {
            file,
            root,
            config_path: Some(config_path.to_path_buf()),
        })
    }

    /// Apply environment variable overrides
    ///
    /// Recognised variables: STITCH_PROJECTS_DIR, STITCH_SASS, STITCH_MINIFY,
    /// STITCH_DEBOUNCE_MS.
    fn apply_env_overrides(&self, mut config: StitchConfig) -> ConfigResult<StitchConfig> {
        if !self.use_env {
            return Ok(config);
        }

        if let Ok(dir) = env::var("STITCH_PROJECTS_DIR") {
            config.projects.get_or_insert_with(Default::default).dir = Some(PathBuf::from(dir));
        }

        if let Ok(compiler) = env::var("STITCH_SASS") {
            config.style.get_or_insert_with(Default::default).compiler = Some(compiler);
        }

        if let Ok(minify) = env::var("STITCH_MINIFY") {
            let enabled = matches!(minify.to_lowercase().as_str(), "true" | "1" | "yes");
            config.minify.get_or_insert_with(Default::default).enabled = Some(enabled);
        }

        if let Ok(debounce) = env::var("STITCH_DEBOUNCE_MS") {
            let ms = debounce
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "STITCH_DEBOUNCE_MS".to_string(),
                    reason: format!("'{}' is not a number of milliseconds", debounce),
                })?;
            config.watch.get_or_insert_with(Default::default).debounce_ms = Some(ms);
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Defaults rooted at `root`, without reading any file or variable
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            file: StitchConfig::default(),
            root: root.into(),
            config_path: None,
        }
    }

    /// Override the projects directory (CLI flag)
    pub fn set_projects_dir(&mut self, dir: impl Into<PathBuf>) {
        self.file.projects.get_or_insert_with(Default::default).dir = Some(dir.into());
    }

    /// Absolute (root-joined) projects directory
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(self.file.projects_dir())
    }

    /// Shared utility file backing the virtual utility module
    pub fn utility_file(&self) -> PathBuf {
        match self.file.utility_file() {
            Some(path) => self.root.join(path),
            None => self
                .projects_dir()
                .join(format!("{}.{}", self.file.utility_module(), self.file.script_ext())),
        }
    }

    pub fn script_ext(&self) -> &str {
        self.file.script_ext()
    }

    pub fn markup_ext(&self) -> &str {
        self.file.markup_ext()
    }

    pub fn style_ext(&self) -> &str {
        self.file.style_ext()
    }

    pub fn utility_module(&self) -> &str {
        self.file.utility_module()
    }

    /// Check whether a stitch.toml was found
    pub fn has_file(&self) -> bool {
        self.config_path.is_some()
    }
}

/// Find stitch.toml in `start_dir` or any ancestor
fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(temp.path())
            .unwrap();

        assert!(!config.has_file());
        assert_eq!(config.root, temp.path());
        assert_eq!(config.projects_dir(), temp.path().join("projects"));
        assert_eq!(config.utility_file(), temp.path().join("projects/utils.js"));
    }

    #[test]
    fn test_utility_file_follows_module_and_extension() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[extensions]\nscript = \"mjs\"\n[utility]\nmodule = \"helpers\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(temp.path())
            .unwrap();

        assert_eq!(
            config.utility_file(),
            temp.path().join("projects/helpers.mjs")
        );
    }

    #[test]
    fn test_set_projects_dir_overrides_file() {
        let mut config = Config::with_root("/srv/stitch");
        config.set_projects_dir("/data/projects");
        assert_eq!(config.projects_dir(), PathBuf::from("/data/projects"));
    }

    #[test]
    fn test_load_from_file_uses_parent_as_root() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[projects]\ndir = \"scripts\"\n").unwrap();

        let config = ConfigLoader::new().without_env().load_from_file(&path).unwrap();
        assert_eq!(config.projects_dir(), temp.path().join("scripts"));
    }
}
