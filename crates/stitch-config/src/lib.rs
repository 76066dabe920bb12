//! Stitch Configuration System
//!
//! Provides configuration management for the stitch compiler including:
//! - Compiler configuration (stitch.toml)
//! - Environment variable overrides
//! - Per-project settings with safe defaults
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. stitch.toml (searched upwards from the working directory)
//! 3. Environment variables (STITCH_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use stitch_config::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::new().load_from_directory(Path::new(".")).unwrap();
//! println!("projects live in {}", config.projects_dir().display());
//! ```

pub mod loader;
pub mod project;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
pub use project::ProjectSettings;
pub use settings::StitchConfig;
