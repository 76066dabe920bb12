//! CLI configuration
//!
//! Output preferences come from environment variables; everything that
//! shapes a build comes from stitch.toml via `stitch-config`.

use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use stitch_config::{Config, ConfigLoader};

/// Output preferences loaded from environment variables
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Default to JSON output (STITCH_JSON=1)
    pub default_json: bool,
    /// Disable colored output (STITCH_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("STITCH_JSON")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            no_color: env::var("STITCH_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
        }
    }
}

/// Load stitch.toml from the working directory or its ancestors. A
/// `--projects-dir` flag wins over the file and the environment; relative
/// flag values are taken from the working directory.
pub fn load_project_config(projects_dir: Option<&Path>) -> Result<Config> {
    let cwd = env::current_dir().context("Failed to read the current directory")?;
    let mut config = ConfigLoader::new()
        .load_from_directory(&cwd)
        .context("Failed to load stitch.toml")?;

    if let Some(dir) = projects_dir {
        config.set_projects_dir(cwd.join(dir));
    }

    Ok(config)
}
