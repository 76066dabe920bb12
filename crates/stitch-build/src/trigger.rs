//! Rebuild policy for filesystem events
//!
//! Decides which variants a changed path affects and rebuilds them through
//! the [`Pipeline`]. Watching the filesystem is left to the caller; this
//! module only sees `{add, change}` events.
//!
//! A variant's own `<variant>.min.<ext>` is output and never triggers a
//! rebuild; any other minified script is a source like the rest.

use crate::error::BuildResult;
use crate::pipeline::{BuildReport, Pipeline};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Kind of filesystem event the trigger reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Add,
    Change,
}

/// A filesystem event under the projects directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Add,
            path: path.into(),
        }
    }

    pub fn change(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Change,
            path: path.into(),
        }
    }
}

/// What has to be rebuilt after a change
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RebuildScope {
    Nothing,
    /// A file inside a variant directory changed
    Variant { project: String, variant: String },
    /// A shared fragment directly inside a project changed
    Project(String),
    /// The utility module changed
    Everything,
}

/// Maps events to rebuilds
pub struct RebuildTrigger {
    pipeline: Pipeline,
    root: PathBuf,
    canonical_root: Option<PathBuf>,
    utility_file: PathBuf,
    canonical_utility: Option<PathBuf>,
}

impl RebuildTrigger {
    pub fn new(pipeline: Pipeline) -> Self {
        let root = pipeline.tree().root().to_path_buf();
        let utility_file = pipeline.syntax().utility_file.clone();
        Self {
            canonical_root: root.canonicalize().ok(),
            canonical_utility: utility_file.canonicalize().ok(),
            root,
            utility_file,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Which variants a change to `path` affects
    pub fn classify(&self, path: &Path) -> RebuildScope {
        if self.is_utility_file(path) {
            return RebuildScope::Everything;
        }

        let Some(relative) = self.relative_to_root(path) else {
            return RebuildScope::Nothing;
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => match part.to_str() {
                    Some(part) if !part.starts_with('.') => parts.push(part),
                    _ => return RebuildScope::Nothing,
                },
                _ => return RebuildScope::Nothing,
            }
        }

        let Some(file_name) = parts.last() else {
            return RebuildScope::Nothing;
        };
        if !self.is_watched_file(file_name) {
            return RebuildScope::Nothing;
        }
        if let [_, variant, name] = parts.as_slice() {
            if self.pipeline.tree().is_artifact_of(variant, name) {
                return RebuildScope::Nothing;
            }
        }

        match parts.as_slice() {
            [project, _] => RebuildScope::Project(project.to_string()),
            [project, variant, _, ..] => RebuildScope::Variant {
                project: project.to_string(),
                variant: variant.to_string(),
            },
            _ => RebuildScope::Nothing,
        }
    }

    /// Rebuild whatever one event affects. Per-variant failures are logged
    /// and collected in the report.
    pub fn handle(&self, event: &FsEvent) -> BuildReport {
        let scope = self.classify(&event.path);
        debug!(path = %event.path.display(), kind = ?event.kind, scope = ?scope, "filesystem event");
        self.rebuild(&[scope])
    }

    /// Rebuild for a batch of events, building each affected variant once
    pub fn handle_batch(&self, events: &[FsEvent]) -> BuildReport {
        let scopes: Vec<RebuildScope> = events.iter().map(|e| self.classify(&e.path)).collect();
        self.rebuild(&scopes)
    }

    fn rebuild(&self, scopes: &[RebuildScope]) -> BuildReport {
        let start = Instant::now();
        let plan = plan(scopes);
        let mut report = BuildReport::default();

        if plan.everything {
            info!("utility module changed, rebuilding every project");
            report = self.report_or_log(self.pipeline.build_all(), "all projects");
        } else {
            for project in &plan.projects {
                info!("shared fragment changed, rebuilding {}", project);
                report.merge(self.report_or_log(self.pipeline.build_project(project), project));
            }
            for (project, variant) in &plan.variants {
                info!("rebuilding {}/{}", project, variant);
                report.merge(self.pipeline.build_one(project, variant));
            }
        }

        report.stats.total_time = start.elapsed();
        report
    }

    fn report_or_log(&self, result: BuildResult<BuildReport>, what: &str) -> BuildReport {
        result.unwrap_or_else(|e| {
            error!(error = %e, "rebuild of {} failed", what);
            BuildReport::default()
        })
    }

    fn relative_to_root<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        path.strip_prefix(&self.root).ok().or_else(|| {
            self.canonical_root
                .as_ref()
                .and_then(|root| path.strip_prefix(root).ok())
        })
    }

    fn is_utility_file(&self, path: &Path) -> bool {
        path == self.utility_file || self.canonical_utility.as_deref() == Some(path)
    }

    fn is_watched_file(&self, name: &str) -> bool {
        let syntax = self.pipeline.syntax();
        [&syntax.script_ext, &syntax.markup_ext, &syntax.style_ext]
            .iter()
            .any(|ext| {
                name.strip_suffix(ext.as_str())
                    .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
            })
    }
}

#[derive(Debug, Default)]
struct RebuildPlan {
    everything: bool,
    projects: BTreeSet<String>,
    variants: BTreeSet<(String, String)>,
}

/// Collapse scopes so no variant is built twice
fn plan(scopes: &[RebuildScope]) -> RebuildPlan {
    let mut plan = RebuildPlan::default();
    for scope in scopes {
        match scope {
            RebuildScope::Nothing => {}
            RebuildScope::Everything => plan.everything = true,
            RebuildScope::Project(project) => {
                plan.projects.insert(project.clone());
            }
            RebuildScope::Variant { project, variant } => {
                plan.variants.insert((project.clone(), variant.clone()));
            }
        }
    }
    let projects = &plan.projects;
    plan.variants.retain(|(project, _)| !projects.contains(project));
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::PassthroughStyle;
    use pretty_assertions::assert_eq;
    use std::fs;
    use stitch_config::Config;
    use tempfile::TempDir;

    fn trigger(files: &[(&str, &str)]) -> (TempDir, RebuildTrigger) {
        let temp = TempDir::new().unwrap();
        for (path, content) in files {
            let path = temp.path().join("projects").join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let config = Config::with_root(temp.path());
        let pipeline = Pipeline::with_style_compiler(&config, Box::new(PassthroughStyle)).unwrap();
        (temp, RebuildTrigger::new(pipeline))
    }

    fn projects(temp: &TempDir) -> PathBuf {
        temp.path().join("projects")
    }

    #[test]
    fn test_classify_paths() {
        let (temp, trigger) = trigger(&[("p1/v1/v1.js", "")]);
        let root = projects(&temp);

        assert_eq!(
            trigger.classify(&root.join("p1/v1/v1.js")),
            RebuildScope::Variant {
                project: "p1".into(),
                variant: "v1".into()
            }
        );
        assert_eq!(
            trigger.classify(&root.join("p1/v1/parts/card.html")),
            RebuildScope::Variant {
                project: "p1".into(),
                variant: "v1".into()
            }
        );
        assert_eq!(
            trigger.classify(&root.join("p1/shared.scss")),
            RebuildScope::Project("p1".into())
        );
        assert_eq!(trigger.classify(&root.join("utils.js")), RebuildScope::Everything);
    }

    #[test]
    fn test_vendored_minified_script_triggers_rebuild() {
        let (temp, trigger) = trigger(&[("p1/v1/v1.js", "")]);
        let root = projects(&temp);

        assert_eq!(
            trigger.classify(&root.join("p1/v1/lib.min.js")),
            RebuildScope::Variant {
                project: "p1".into(),
                variant: "v1".into()
            }
        );
        assert_eq!(
            trigger.classify(&root.join("p1/vendor.min.js")),
            RebuildScope::Project("p1".into())
        );
    }

    #[test]
    fn test_classify_ignored_paths() {
        let (temp, trigger) = trigger(&[]);
        let root = projects(&temp);

        for ignored in [
            "p1/v1/v1.min.js",
            "p1/v1/.v1.js.swp",
            "p1/.hidden/v1.js",
            "p1/v1/notes.txt",
            "p1/v1/js",
            "stray.js",
        ] {
            assert_eq!(
                trigger.classify(&root.join(ignored)),
                RebuildScope::Nothing,
                "{} should be ignored",
                ignored
            );
        }
        assert_eq!(
            trigger.classify(Path::new("/elsewhere/p1/v1/v1.js")),
            RebuildScope::Nothing
        );
    }

    #[test]
    fn test_shared_fragment_rebuilds_every_variant() {
        let (temp, trigger) = trigger(&[
            ("p1/shared.js", "export default 1;"),
            ("p1/v1/v1.js", "import s from '../shared.js';\nconsole.log( s );"),
            ("p1/v2/v2.js", "import s from 'shared.js';\nconsole.log( s + 1 );"),
            ("p2/v1/v1.js", "other();"),
        ]);
        let root = projects(&temp);

        let report = trigger.handle(&FsEvent::change(root.join("p1/shared.js")));

        assert_eq!(report.stats.built_variants, 2);
        assert_eq!(
            fs::read_to_string(root.join("p1/v1/v1.min.js")).unwrap(),
            "const s=1;console.log(s);"
        );
        assert_eq!(
            fs::read_to_string(root.join("p1/v2/v2.min.js")).unwrap(),
            "const s=1;console.log(s+1);"
        );
        assert!(!root.join("p2/v1/v1.min.js").exists());
    }

    #[test]
    fn test_variant_change_rebuilds_only_that_variant() {
        let (temp, trigger) = trigger(&[("p1/v1/v1.js", "a();"), ("p1/v2/v2.js", "b();")]);
        let root = projects(&temp);

        let report = trigger.handle(&FsEvent::add(root.join("p1/v1/v1.js")));

        assert_eq!(report.stats.built_variants, 1);
        assert!(root.join("p1/v1/v1.min.js").exists());
        assert!(!root.join("p1/v2/v2.min.js").exists());
    }

    #[test]
    fn test_artifact_write_does_not_retrigger() {
        let (temp, trigger) = trigger(&[("p1/v1/v1.js", "a();")]);
        let root = projects(&temp);
        let report = trigger.handle(&FsEvent::change(root.join("p1/v1/v1.min.js")));
        assert_eq!(report.stats.total_variants, 0);
    }

    #[test]
    fn test_failing_variant_does_not_stop_others() {
        let (temp, trigger) = trigger(&[
            ("p1/shared.html", "<b>x</b>"),
            ("p1/broken/readme.md", ""),
            ("p1/ok/ok.js", "import t from '../shared.html';"),
        ]);
        let root = projects(&temp);

        let report = trigger.handle(&FsEvent::change(root.join("p1/shared.html")));

        assert_eq!(report.stats.failed_variants, 1);
        assert_eq!(report.stats.built_variants, 1);
        assert!(root.join("p1/ok/ok.min.js").exists());
    }

    #[test]
    fn test_batch_builds_each_variant_once() {
        let (temp, trigger) = trigger(&[("p1/shared.js", ""), ("p1/v1/v1.js", "a();")]);
        let root = projects(&temp);

        let report = trigger.handle_batch(&[
            FsEvent::change(root.join("p1/v1/v1.js")),
            FsEvent::change(root.join("p1/shared.js")),
            FsEvent::change(root.join("p1/v1/v1.js")),
        ]);

        assert_eq!(report.stats.total_variants, 1);
    }
}
