//! Variant resolution
//!
//! Turns a variant's entry script into one flat script by replacing every
//! markup, stylesheet and script import with generated code. Per-import
//! failures never abort resolution: they degrade to an empty or undefined
//! binding, are logged, and are recorded as [`ImportIssue`]s.

use crate::codegen::{style_injection, Binding, BindingValue};
use crate::context::{Located, ResolutionContext};
use crate::error::{BuildError, BuildResult};
use crate::project::ProjectTree;
use crate::scanner::{ImportKind, ImportRef, ImportScanner};
use crate::style::StyleCompiler;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Marker introducing a script fragment's exported value
pub const EXPORT_MARKER: &str = "export default";

/// Fragment naming conventions used while inlining
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSyntax {
    pub script_ext: String,
    pub markup_ext: String,
    pub style_ext: String,
    /// Specifier of the virtual utility module
    pub utility_module: String,
    /// File the virtual utility module is read from
    pub utility_file: PathBuf,
}

impl FragmentSyntax {
    pub fn from_config(config: &stitch_config::Config) -> Self {
        Self {
            script_ext: config.script_ext().to_string(),
            markup_ext: config.markup_ext().to_string(),
            style_ext: config.style_ext().to_string(),
            utility_module: config.utility_module().to_string(),
            utility_file: config.utility_file(),
        }
    }
}

/// Why an import was degraded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IssueKind {
    /// Target does not exist or could not be read
    MissingFragment,
    /// The stylesheet compiler failed
    StyleCompilation { message: String },
    /// Target resolves outside the project root
    Confinement,
    /// Target is already being resolved further up the import chain
    Cycle,
}

/// A degraded import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportIssue {
    /// File containing the import statement
    pub file: PathBuf,
    pub name: String,
    pub specifier: String,
    pub issue: IssueKind,
}

/// Result of resolving one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVariant {
    pub project: String,
    pub variant: String,
    /// File name of the entry script
    pub entry_filename: String,
    /// Flat, import-free script
    pub script: String,
    pub issues: Vec<ImportIssue>,
}

/// Applies the three inliners to script text
pub struct Inliner {
    syntax: FragmentSyntax,
    markup: ImportScanner,
    style: ImportScanner,
    script: ImportScanner,
    style_compiler: Box<dyn StyleCompiler>,
}

impl Inliner {
    pub fn new(syntax: FragmentSyntax, style_compiler: Box<dyn StyleCompiler>) -> BuildResult<Self> {
        Ok(Self {
            markup: ImportScanner::new(ImportKind::Markup, &syntax.markup_ext)?,
            style: ImportScanner::new(ImportKind::Style, &syntax.style_ext)?,
            script: ImportScanner::with_utility(&syntax.script_ext, &syntax.utility_module)?,
            syntax,
            style_compiler,
        })
    }

    pub fn syntax(&self) -> &FragmentSyntax {
        &self.syntax
    }

    /// Resolve the imports of `source`, which was read from `file`.
    ///
    /// `file` is treated as already in progress, so an import chain leading
    /// back to it is reported as a cycle.
    pub fn inline(
        &self,
        ctx: &ResolutionContext,
        file: &Path,
        source: &str,
    ) -> (String, Vec<ImportIssue>) {
        let mut session = Session {
            inliner: self,
            ctx,
            stack: vec![file.to_path_buf()],
            in_utility: false,
            issues: Vec::new(),
        };
        let text = session.resolve_text(source, file);
        (text, session.issues)
    }
}

/// State of one resolution: the chain of files being resolved and the
/// issues collected so far
struct Session<'a> {
    inliner: &'a Inliner,
    ctx: &'a ResolutionContext,
    stack: Vec<PathBuf>,
    in_utility: bool,
    issues: Vec<ImportIssue>,
}

impl Session<'_> {
    /// Markup, then stylesheets, then scripts (which recurse)
    fn resolve_text(&mut self, source: &str, file: &Path) -> String {
        let inliner = self.inliner;
        let text = splice(source, inliner.markup.scan(source), |import| {
            self.inline_markup(&import, file)
        });
        let text = splice(&text, inliner.style.scan(&text), |import| {
            self.inline_style(&import, file)
        });
        splice(&text, inliner.script.scan(&text), |import| {
            self.inline_script(&import, file)
        })
    }

    fn inline_markup(&mut self, import: &ImportRef<'_>, file: &Path) -> String {
        let content = match self.ctx.locate(import.path) {
            Located::File(path) => match fs::read_to_string(&path) {
                Ok(content) => {
                    debug!(name = import.name, path = %path.display(), "inlined markup");
                    content
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read markup fragment");
                    self.record(import, file, IssueKind::MissingFragment);
                    String::new()
                }
            },
            Located::Missing(path) => {
                warn!(path = %path.display(), file = %file.display(), "markup fragment not found");
                self.record(import, file, IssueKind::MissingFragment);
                String::new()
            }
            Located::Escapes(path) => {
                warn!(path = %path.display(), file = %file.display(), "markup import leaves the project root");
                self.record(import, file, IssueKind::Confinement);
                String::new()
            }
        };
        Binding::text(import.name, content).to_string()
    }

    fn inline_style(&mut self, import: &ImportRef<'_>, file: &Path) -> String {
        let path = match self.ctx.locate(import.path) {
            Located::File(path) => path,
            Located::Missing(path) => {
                warn!(path = %path.display(), file = %file.display(), "stylesheet not found");
                self.record(import, file, IssueKind::MissingFragment);
                return String::new();
            }
            Located::Escapes(path) => {
                warn!(path = %path.display(), file = %file.display(), "stylesheet import leaves the project root");
                self.record(import, file, IssueKind::Confinement);
                return String::new();
            }
        };

        match self.inliner.style_compiler.compile(&path) {
            Ok(css) => {
                debug!(name = import.name, path = %path.display(), "inlined stylesheet");
                format!(
                    "{}\n{}",
                    Binding::text(import.name, css),
                    style_injection(import.name)
                )
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "stylesheet compilation failed");
                let message = match e {
                    BuildError::StyleCompile { error, .. } => error,
                    other => other.to_string(),
                };
                self.record(import, file, IssueKind::StyleCompilation { message });
                String::new()
            }
        }
    }

    fn inline_script(&mut self, import: &ImportRef<'_>, file: &Path) -> String {
        if import.kind == ImportKind::VirtualUtility {
            return self.inline_utility(import, file);
        }

        let path = match self.ctx.locate(import.path) {
            Located::File(path) => path,
            Located::Missing(path) => {
                warn!(path = %path.display(), file = %file.display(), "script fragment not found");
                self.record(import, file, IssueKind::MissingFragment);
                return Binding::undefined(import.name).to_string();
            }
            Located::Escapes(path) => {
                warn!(path = %path.display(), file = %file.display(), "script import leaves the project root, dropped");
                self.record(import, file, IssueKind::Confinement);
                return String::new();
            }
        };

        if self.stack.contains(&path) {
            warn!(path = %path.display(), file = %file.display(), "circular script import rejected");
            self.record(import, file, IssueKind::Cycle);
            return Binding::undefined(import.name).to_string();
        }

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read script fragment");
                self.record(import, file, IssueKind::MissingFragment);
                return Binding::undefined(import.name).to_string();
            }
        };

        self.stack.push(path.clone());
        let resolved = self.resolve_text(&source, &path);
        self.stack.pop();

        debug!(name = import.name, path = %path.display(), "inlined script");
        Binding::new(import.name, classify_script(&resolved)).to_string()
    }

    fn inline_utility(&mut self, import: &ImportRef<'_>, file: &Path) -> String {
        if self.in_utility {
            warn!(file = %file.display(), "utility module imports itself, bound to an empty object");
            return Binding::empty_object(import.name).to_string();
        }

        let path = self.inliner.syntax.utility_file.clone();
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "utility module not available");
                self.record(import, file, IssueKind::MissingFragment);
                return Binding::undefined(import.name).to_string();
            }
        };

        self.in_utility = true;
        let resolved = self.resolve_text(&source, &path);
        self.in_utility = false;

        debug!(name = import.name, "inlined utility module");
        Binding::new(import.name, classify_script(&resolved)).to_string()
    }

    fn record(&mut self, import: &ImportRef<'_>, file: &Path, issue: IssueKind) {
        self.issues.push(ImportIssue {
            file: file.to_path_buf(),
            name: import.name.to_string(),
            specifier: import.path.to_string(),
            issue,
        });
    }
}

/// Rebuild `source` with every import statement replaced.
///
/// Imports come from a scan of `source` itself, so replacements never
/// affect which statements are found.
fn splice<'t, I, F>(source: &'t str, imports: I, mut replace: F) -> String
where
    I: Iterator<Item = ImportRef<'t>>,
    F: FnMut(ImportRef<'t>) -> String,
{
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for import in imports {
        let span = import.span.clone();
        out.push_str(&source[cursor..span.start]);
        out.push_str(&replace(import));
        cursor = span.end;
    }

    out.push_str(&source[cursor..]);
    out
}

/// Split a resolved script into the statements before its exported value and
/// the value itself.
///
/// The last occurrence of the marker wins, wherever it appears.
pub fn split_export(text: &str) -> Option<(&str, &str)> {
    let at = text.rfind(EXPORT_MARKER)?;
    let expr = text[at + EXPORT_MARKER.len()..]
        .trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    if expr.is_empty() {
        return None;
    }
    Some((text[..at].trim(), expr))
}

/// Value import when the file ends in an exported value, otherwise a
/// zero-argument function over the whole file
fn classify_script(resolved: &str) -> BindingValue {
    match split_export(resolved) {
        Some(("", expr)) => BindingValue::Expr(expr.to_string()),
        Some((statements, expr)) => BindingValue::Prelude {
            statements: statements.to_string(),
            expr: expr.to_string(),
        },
        None => BindingValue::Thunk(resolved.to_string()),
    }
}

/// Locates a variant's entry file and inlines it
pub struct VariantResolver {
    tree: ProjectTree,
    inliner: Inliner,
}

impl VariantResolver {
    pub fn new(tree: ProjectTree, inliner: Inliner) -> Self {
        Self { tree, inliner }
    }

    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    pub fn syntax(&self) -> &FragmentSyntax {
        self.inliner.syntax()
    }

    /// Resolve a variant into one flat script.
    ///
    /// Fails with a not-found error when the project, the variant directory or
    /// an entry script is missing; other I/O failures propagate as is.
    pub fn resolve(&self, project: &str, variant: &str) -> BuildResult<ResolvedVariant> {
        let project_dir = self.tree.project_dir(project)?;
        let variant_dir = self.tree.variant_dir(project, variant)?;
        let entry = self.tree.entry_file(project, variant)?;

        let source = fs::read_to_string(&entry).map_err(|e| BuildError::io(&entry, e))?;
        let ctx = ResolutionContext::new(&project_dir, &variant_dir)?;
        let canonical_entry = entry
            .canonicalize()
            .map_err(|e| BuildError::io(&entry, e))?;

        let (script, issues) = self.inliner.inline(&ctx, &canonical_entry, &source);

        let entry_filename = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ResolvedVariant {
            project: project.to_string(),
            variant: variant.to_string(),
            entry_filename,
            script,
            issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_export_bare_value() {
        assert_eq!(split_export("export default 42;\n"), Some(("", "42")));
    }

    #[test]
    fn test_split_export_with_statements() {
        let text = "const a = 1;\nexport default { a };";
        assert_eq!(split_export(text), Some(("const a = 1;", "{ a }")));
    }

    #[test]
    fn test_split_export_last_marker_wins() {
        let text = "// export default old\nexport default newer;";
        assert_eq!(
            split_export(text),
            Some(("// export default old", "newer"))
        );
    }

    #[test]
    fn test_split_export_absent_or_empty() {
        assert_eq!(split_export("console.log(1);"), None);
        assert_eq!(split_export("doThing();\nexport default ;"), None);
    }

    #[test]
    fn test_classify_script() {
        assert_eq!(classify_script("export default 1;"), BindingValue::Expr("1".into()));
        assert_eq!(
            classify_script("run();"),
            BindingValue::Thunk("run();".into())
        );
        assert!(matches!(
            classify_script("const x = 2;\nexport default x;"),
            BindingValue::Prelude { .. }
        ));
    }

    #[test]
    fn test_splice_replaces_spans_only() {
        let scanner = ImportScanner::new(ImportKind::Markup, "html").unwrap();
        let source = "a;\nimport x from './x.html';\nb;\nimport y from './y.html'\nc;";
        let out = splice(source, scanner.scan(source), |i| format!("<{}>", i.name));
        assert_eq!(out, "a;\n<x>\nb;\n<y>\nc;");
    }
}
