//! Minified artifact cache
//!
//! One file per variant, written beside the entry script as
//! `<project>/<variant>/<variant>.min.<ext>`. There is no index and no
//! integrity data: a store simply overwrites the previous artifact.

use crate::error::{BuildError, BuildResult};
use crate::project::ProjectTree;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;

/// Reads and writes variant artifacts under a project tree
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    tree: ProjectTree,
}

impl ArtifactCache {
    pub fn new(tree: ProjectTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    /// Where the artifact for a variant lives, whether or not it exists
    pub fn path_for(&self, project: &str, variant: &str) -> PathBuf {
        self.tree
            .root()
            .join(project)
            .join(variant)
            .join(self.tree.artifact_name(variant))
    }

    /// Write a minified script, replacing any earlier artifact
    pub fn store(&self, project: &str, variant: &str, minified: &str) -> BuildResult<PathBuf> {
        let dir = self.tree.variant_dir(project, variant)?;
        let path = dir.join(self.tree.artifact_name(variant));

        fs::write(&path, minified).map_err(|error| BuildError::CacheWrite {
            path: path.clone(),
            error,
        })?;

        info!(
            artifact = %path.display(),
            bytes = minified.len(),
            "wrote artifact for {}/{}",
            project,
            variant
        );
        Ok(path)
    }

    /// Read a stored artifact; `None` when the variant was never built
    pub fn load(&self, project: &str, variant: &str) -> BuildResult<Option<String>> {
        let dir = self.tree.variant_dir(project, variant)?;
        let path = dir.join(self.tree.artifact_name(variant));

        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BuildError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache() -> (TempDir, ArtifactCache) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("p1/v1")).unwrap();
        let cache = ArtifactCache::new(ProjectTree::new(temp.path(), "js"));
        (temp, cache)
    }

    #[test]
    fn test_store_writes_beside_entry() {
        let (temp, cache) = cache();
        let path = cache.store("p1", "v1", "a();").unwrap();
        assert_eq!(path, temp.path().join("p1/v1/v1.min.js"));
        assert_eq!(fs::read_to_string(path).unwrap(), "a();");
    }

    #[test]
    fn test_store_overwrites() {
        let (_temp, cache) = cache();
        cache.store("p1", "v1", "first();").unwrap();
        cache.store("p1", "v1", "second();").unwrap();
        assert_eq!(cache.load("p1", "v1").unwrap().as_deref(), Some("second();"));
    }

    #[test]
    fn test_load_absent_is_none() {
        let (_temp, cache) = cache();
        assert_eq!(cache.load("p1", "v1").unwrap(), None);
    }

    #[test]
    fn test_store_into_missing_variant_fails() {
        let (_temp, cache) = cache();
        let err = cache.store("p1", "v2", "x").unwrap_err();
        assert!(err.is_not_found());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_is_cache_write() {
        let (temp, cache) = cache();
        // A directory where the artifact should go makes the write fail
        fs::create_dir(temp.path().join("p1/v1/v1.min.js")).unwrap();
        let err = cache.store("p1", "v1", "x").unwrap_err();
        assert!(matches!(err, BuildError::CacheWrite { .. }));
    }
}
