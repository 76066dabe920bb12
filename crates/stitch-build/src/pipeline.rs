//! Resolve → minify → store orchestration
use crate::cache::ArtifactCache;
use crate::error::BuildResult;
use crate::minify::{JsMinifier, Minifier, MinifyOptions};
use crate::project::ProjectTree;
use crate::resolver::{FragmentSyntax, Inliner, ResolvedVariant, VariantResolver};
use crate::style::{SassCommand, StyleCompiler};

use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use stitch_config::Config;
use tracing::{debug, error};

/// A resolved variant together with its deliverable text
#[derive(Debug, Clone)]
pub struct CompiledVariant {
    pub resolved: ResolvedVariant,
    /// Minified script, or the resolved script when minification is off
    pub output: String,
}

/// A variant whose artifact was written
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltVariant {
    pub project: String,
    pub variant: String,
    pub artifact: PathBuf,
    pub bytes: usize,
    /// Number of degraded imports
    pub issues: usize,
    #[serde(skip)]
    pub duration: Duration,
}

/// A variant that could not be built
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedVariant {
    pub project: String,
    pub variant: String,
    pub error: String,
    /// Nothing to compile, as opposed to a broken filesystem
    pub not_found: bool,
}

/// Build statistics
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    /// Variants attempted
    pub total_variants: usize,
    pub built_variants: usize,
    pub failed_variants: usize,
    /// Degraded imports across all built variants
    pub issues: usize,
    #[serde(skip)]
    pub total_time: Duration,
}

/// Outcome of building several variants
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub built: Vec<BuiltVariant>,
    pub failed: Vec<FailedVariant>,
    pub stats: BuildStats,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, project: &str, variant: &str, result: BuildResult<BuiltVariant>) {
        self.stats.total_variants += 1;
        match result {
            Ok(built) => {
                self.stats.built_variants += 1;
                self.stats.issues += built.issues;
                self.built.push(built);
            }
            Err(e) => {
                error!(error = %e, "failed to build {}/{}", project, variant);
                self.stats.failed_variants += 1;
                self.failed.push(FailedVariant {
                    project: project.to_string(),
                    variant: variant.to_string(),
                    not_found: e.is_not_found(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: BuildReport) {
        self.stats.total_variants += other.stats.total_variants;
        self.stats.built_variants += other.stats.built_variants;
        self.stats.failed_variants += other.stats.failed_variants;
        self.stats.issues += other.stats.issues;
        self.built.extend(other.built);
        self.failed.extend(other.failed);
    }
}

/// The whole compile path for one projects directory
pub struct Pipeline {
    resolver: VariantResolver,
    minifier: Minifier,
    cache: ArtifactCache,
    minify_enabled: bool,
}

impl Pipeline {
    pub fn new(resolver: VariantResolver, minifier: Minifier, cache: ArtifactCache) -> Self {
        Self {
            resolver,
            minifier,
            cache,
            minify_enabled: true,
        }
    }

    /// Pipeline for a loaded configuration, compiling stylesheets with the
    /// configured external compiler
    pub fn from_config(config: &Config) -> BuildResult<Self> {
        let mut sass = SassCommand::new(config.file.style_compiler());
        if !config.file.style_args().is_empty() {
            sass = sass.with_args(config.file.style_args().to_vec());
        }
        Self::with_style_compiler(config, Box::new(sass))
    }

    /// Pipeline for a loaded configuration with an explicit stylesheet compiler
    pub fn with_style_compiler(
        config: &Config,
        style_compiler: Box<dyn StyleCompiler>,
    ) -> BuildResult<Self> {
        let tree = ProjectTree::new(config.projects_dir(), config.script_ext());
        let inliner = Inliner::new(FragmentSyntax::from_config(config), style_compiler)?;
        let minifier = Minifier::new(Box::new(JsMinifier::new(MinifyOptions {
            strip_comments: config.file.strip_comments(),
        })));

        Ok(Self::new(
            VariantResolver::new(tree.clone(), inliner),
            minifier,
            ArtifactCache::new(tree),
        )
        .with_minify(config.file.minify_enabled()))
    }

    /// Enable/disable minification of stored artifacts
    pub fn with_minify(mut self, enabled: bool) -> Self {
        self.minify_enabled = enabled;
        self
    }

    pub fn tree(&self) -> &ProjectTree {
        self.resolver.tree()
    }

    pub fn resolver(&self) -> &VariantResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn syntax(&self) -> &FragmentSyntax {
        self.resolver.syntax()
    }

    pub fn resolve(&self, project: &str, variant: &str) -> BuildResult<ResolvedVariant> {
        self.resolver.resolve(project, variant)
    }

    /// Resolve and minify without touching the cache
    pub fn compile(&self, project: &str, variant: &str) -> BuildResult<CompiledVariant> {
        let resolved = self.resolver.resolve(project, variant)?;
        let output = if self.minify_enabled {
            self.minifier.minify(&resolved.script)
        } else {
            resolved.script.clone()
        };
        Ok(CompiledVariant { resolved, output })
    }

    /// Resolve, minify and store one variant
    pub fn build_variant(&self, project: &str, variant: &str) -> BuildResult<BuiltVariant> {
        let start = Instant::now();
        let compiled = self.compile(project, variant)?;
        let artifact = self.cache.store(project, variant, &compiled.output)?;

        debug!(
            issues = compiled.resolved.issues.len(),
            "built {}/{} from {}",
            project,
            variant,
            compiled.resolved.entry_filename
        );

        Ok(BuiltVariant {
            project: project.to_string(),
            variant: variant.to_string(),
            artifact,
            bytes: compiled.output.len(),
            issues: compiled.resolved.issues.len(),
            duration: start.elapsed(),
        })
    }

    /// Build every variant of a project. One variant failing does not stop
    /// the others.
    pub fn build_project(&self, project: &str) -> BuildResult<BuildReport> {
        let start = Instant::now();
        let mut report = BuildReport::default();

        for variant in self.tree().list_variants(project)? {
            let result = self.build_variant(project, &variant);
            report.record(project, &variant, result);
        }

        report.stats.total_time = start.elapsed();
        Ok(report)
    }

    /// Build every variant of every project
    pub fn build_all(&self) -> BuildResult<BuildReport> {
        let start = Instant::now();
        let mut report = BuildReport::default();

        for project in self.tree().list_projects()? {
            match self.build_project(&project) {
                Ok(project_report) => report.merge(project_report),
                Err(e) => {
                    error!(error = %e, "failed to list variants of {}", project);
                    report.stats.total_variants += 1;
                    report.stats.failed_variants += 1;
                    report.failed.push(FailedVariant {
                        project: project.clone(),
                        variant: String::new(),
                        not_found: e.is_not_found(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.stats.total_time = start.elapsed();
        Ok(report)
    }

    /// Build a single variant into a one-entry report
    pub fn build_one(&self, project: &str, variant: &str) -> BuildReport {
        let start = Instant::now();
        let mut report = BuildReport::default();
        let result = self.build_variant(project, variant);
        report.record(project, variant, result);
        report.stats.total_time = start.elapsed();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::PassthroughStyle;
    use std::fs;
    use tempfile::TempDir;

    fn pipeline(files: &[(&str, &str)]) -> (TempDir, Pipeline) {
        let temp = TempDir::new().unwrap();
        for (path, content) in files {
            let path = temp.path().join("projects").join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let config = Config::with_root(temp.path());
        let pipeline = Pipeline::with_style_compiler(&config, Box::new(PassthroughStyle)).unwrap();
        (temp, pipeline)
    }

    #[test]
    fn test_compile_minifies() {
        let (_temp, pipeline) = pipeline(&[("p1/v1/v1.js", "function f(){ console.log(1); }\n")]);
        let compiled = pipeline.compile("p1", "v1").unwrap();
        assert_eq!(compiled.output, "function f(){console.log(1);}");
        assert_eq!(compiled.resolved.script, "function f(){ console.log(1); }\n");
    }

    #[test]
    fn test_compile_without_minify_keeps_resolved_text() {
        let (_temp, pipeline) = pipeline(&[("p1/v1/v1.js", "a( 1 );\n")]);
        let pipeline = pipeline.with_minify(false);
        assert_eq!(pipeline.compile("p1", "v1").unwrap().output, "a( 1 );\n");
    }

    #[test]
    fn test_build_variant_stores_artifact() {
        let (temp, pipeline) = pipeline(&[("p1/v1/v1.js", "run( );")]);
        let built = pipeline.build_variant("p1", "v1").unwrap();
        assert_eq!(built.artifact, temp.path().join("projects/p1/v1/v1.min.js"));
        assert_eq!(fs::read_to_string(&built.artifact).unwrap(), "run();");
    }

    #[test]
    fn test_build_project_continues_past_failures() {
        let (_temp, pipeline) = pipeline(&[
            ("p1/a/a.js", "a();"),
            ("p1/b/readme.txt", "no scripts here"),
            ("p1/c/c.js", "c();"),
        ]);
        let report = pipeline.build_project("p1").unwrap();
        assert_eq!(report.stats.total_variants, 3);
        assert_eq!(report.stats.built_variants, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].variant, "b");
        assert!(report.failed[0].not_found);
        assert!(!report.is_success());
    }

    #[test]
    fn test_build_all_covers_every_project() {
        let (_temp, pipeline) = pipeline(&[("p1/v1/v1.js", "a();"), ("p2/v1/v1.js", "b();")]);
        let report = pipeline.build_all().unwrap();
        assert_eq!(report.stats.built_variants, 2);
        assert!(report.is_success());
    }

    #[test]
    fn test_build_one_missing_variant_reports_failure() {
        let (_temp, pipeline) = pipeline(&[("p1/v1/v1.js", "a();")]);
        let report = pipeline.build_one("p1", "nope");
        assert_eq!(report.stats.failed_variants, 1);
        assert!(report.failed[0].not_found);
    }
}
