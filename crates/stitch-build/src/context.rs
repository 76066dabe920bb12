//! Resolution context and path confinement
//!
//! Import paths resolve against the variant directory (relative specifiers)
//! or the project root (bare specifiers), and must stay inside the project
//! root after canonicalisation.

use crate::error::{BuildError, BuildResult};
use std::path::{Component, Path, PathBuf};

/// Where an import path ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Existing file inside the project root (canonical path)
    File(PathBuf),
    /// Inside the project root but nothing is there
    Missing(PathBuf),
    /// Would leave the project root
    Escapes(PathBuf),
}

/// The (variant directory, project root) pair threaded through resolution
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    variant_dir: PathBuf,
    project_root: PathBuf,
}

impl ResolutionContext {
    /// Create a context; both directories are canonicalised.
    pub fn new(project_root: &Path, variant_dir: &Path) -> BuildResult<Self> {
        let project_root = project_root
            .canonicalize()
            .map_err(|e| BuildError::io(project_root, e))?;
        let variant_dir = variant_dir
            .canonicalize()
            .map_err(|e| BuildError::io(variant_dir, e))?;
        Ok(Self {
            variant_dir,
            project_root,
        })
    }

    pub fn variant_dir(&self) -> &Path {
        &self.variant_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolve an import specifier without reading the target.
    ///
    /// Lexically normalised paths outside the root are rejected before the
    /// filesystem is touched; existing files are then canonicalised so a
    /// symlink pointing out of the root is rejected too.
    pub fn locate(&self, specifier: &str) -> Located {
        let base = if is_relative_specifier(specifier) {
            &self.variant_dir
        } else {
            &self.project_root
        };
        let candidate = normalize(&base.join(specifier.trim_start_matches('/')));

        if !candidate.starts_with(&self.project_root) {
            return Located::Escapes(candidate);
        }

        match candidate.canonicalize() {
            Ok(real) if !real.starts_with(&self.project_root) => Located::Escapes(real),
            Ok(real) if real.is_file() => Located::File(real),
            _ => Located::Missing(candidate),
        }
    }
}

/// `./x` and `../x` resolve against the variant directory
fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Remove `.` and `..` components without consulting the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
