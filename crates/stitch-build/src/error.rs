/// Build system error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Project not found: {project}")]
    ProjectNotFound { project: String },

    #[error("Variant not found: {project}/{variant}")]
    VariantNotFound { project: String, variant: String },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to write artifact {path}: {error}")]
    CacheWrite {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Stylesheet compilation failed for {path}: {error}")]
    StyleCompile { path: PathBuf, error: String },

    #[error("Minification failed: {0}")]
    Minify(String),

    #[error("Invalid import pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] stitch_config::ConfigError),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a variant not found error
    pub fn variant_not_found(project: impl Into<String>, variant: impl Into<String>) -> Self {
        Self::VariantNotFound {
            project: project.into(),
            variant: variant.into(),
        }
    }

    /// Create a project not found error
    pub fn project_not_found(project: impl Into<String>) -> Self {
        Self::ProjectNotFound {
            project: project.into(),
        }
    }

    /// Create a stylesheet compilation error
    pub fn style_compile(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::StyleCompile {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// True for "nothing to compile" failures, which callers report as not found
    /// rather than as a broken filesystem.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. } | Self::VariantNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(BuildError::variant_not_found("p1", "v1").is_not_found());
        assert!(BuildError::project_not_found("p1").is_not_found());
        let io = BuildError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!io.is_not_found());
    }

    #[test]
    fn test_display_names_variant() {
        let err = BuildError::variant_not_found("p1", "v9");
        assert_eq!(err.to_string(), "Variant not found: p1/v9");
    }
}
