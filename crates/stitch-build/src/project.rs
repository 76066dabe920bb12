//! Project and variant discovery
//!
//! A project is a directory under the projects root; a variant is a
//! directory inside a project. Files sitting directly in a project directory
//! are fragments shared by all of its variants. Nothing here creates or
//! removes directories.

use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read-only view of the projects directory
#[derive(Debug, Clone)]
pub struct ProjectTree {
    root: PathBuf,
    script_ext: String,
}

/// Summary of one variant, as listed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInfo {
    pub name: String,
    /// Entry script file name, when the variant has one
    pub entry: Option<String>,
    /// Whether a minified artifact exists
    pub has_artifact: bool,
}

impl ProjectTree {
    pub fn new(root: impl Into<PathBuf>, script_ext: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            script_ext: script_ext.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn script_ext(&self) -> &str {
        &self.script_ext
    }

    /// Directory of a project. Names that could address anything other than a
    /// direct child of the root are refused.
    pub fn project_dir(&self, project: &str) -> BuildResult<PathBuf> {
        if !is_plain_name(project) {
            return Err(BuildError::project_not_found(project));
        }
        let dir = self.root.join(project);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(BuildError::project_not_found(project))
        }
    }

    /// Directory of a variant, see [`ProjectTree::project_dir`]
    pub fn variant_dir(&self, project: &str, variant: &str) -> BuildResult<PathBuf> {
        let project_dir = self.project_dir(project)?;
        if !is_plain_name(variant) {
            return Err(BuildError::variant_not_found(project, variant));
        }
        let dir = project_dir.join(variant);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(BuildError::variant_not_found(project, variant))
        }
    }

    /// All projects, sorted. A missing projects root yields an empty list.
    pub fn list_projects(&self) -> BuildResult<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        list_entries(&self.root, EntryFilter::Dirs)
    }

    /// All variants of a project, sorted
    pub fn list_variants(&self, project: &str) -> BuildResult<Vec<String>> {
        let dir = self.project_dir(project)?;
        list_entries(&dir, EntryFilter::Dirs)
    }

    /// Script files directly inside `dir`, sorted, the directory's own
    /// artifact excluded
    pub fn list_script_files(&self, dir: &Path) -> BuildResult<Vec<String>> {
        let files = list_entries(dir, EntryFilter::Files)?;
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(files
            .into_iter()
            .filter(|name| self.is_script_name(name) && !self.is_artifact_of(&dir_name, name))
            .collect())
    }

    /// Entry script of a variant: `<variant>.<ext>` if present, else the
    /// first script file by name.
    pub fn entry_file(&self, project: &str, variant: &str) -> BuildResult<PathBuf> {
        let dir = self.variant_dir(project, variant)?;
        let exact = format!("{}.{}", variant, self.script_ext);
        let scripts = self.list_script_files(&dir)?;

        let chosen = if scripts.iter().any(|s| *s == exact) {
            Some(exact)
        } else {
            scripts.into_iter().next()
        };

        chosen
            .map(|name| dir.join(name))
            .ok_or_else(|| BuildError::variant_not_found(project, variant))
    }

    /// Listing of every variant of a project
    pub fn describe_variants(&self, project: &str) -> BuildResult<Vec<VariantInfo>> {
        let mut infos = Vec::new();
        for variant in self.list_variants(project)? {
            let entry = match self.entry_file(project, &variant) {
                Ok(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            };
            let has_artifact = self
                .root
                .join(project)
                .join(&variant)
                .join(self.artifact_name(&variant))
                .is_file();
            infos.push(VariantInfo {
                name: variant,
                entry,
                has_artifact,
            });
        }
        Ok(infos)
    }

    /// `<variant>.min.<ext>`
    pub fn artifact_name(&self, variant: &str) -> String {
        format!("{}.min.{}", variant, self.script_ext)
    }

    pub fn is_script_name(&self, name: &str) -> bool {
        name.strip_suffix(&self.script_ext)
            .is_some_and(|stem| stem.ends_with('.') && stem.len() > 1)
    }

    /// Whether `name` is the artifact of `variant`. Other `*.min.<ext>`
    /// files are ordinary scripts.
    pub fn is_artifact_of(&self, variant: &str, name: &str) -> bool {
        name == self.artifact_name(variant)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryFilter {
    Dirs,
    Files,
}

/// Direct children of `dir` of one type, sorted by name, dot entries skipped
fn list_entries(dir: &Path, filter: EntryFilter) -> BuildResult<Vec<String>> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| BuildError::io(dir, e.into()))?;
        let wanted = match filter {
            EntryFilter::Dirs => entry.file_type().is_dir(),
            EntryFilter::Files => entry.file_type().is_file(),
        };
        if !wanted {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }

    Ok(names)
}

/// A single, visible path component
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && Path::new(name).components().count() == 1
}
