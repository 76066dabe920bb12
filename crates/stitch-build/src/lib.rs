//! Stitch build core
//!
//! Turns a variant directory of loosely coupled fragments into one flat,
//! browser-executable script:
//! - Pattern-based import scanning for markup, stylesheet and script imports
//! - Recursive inlining with path confinement and cycle rejection
//! - Minification that never renames and falls back to its input
//! - A per-variant minified artifact cache
//! - The rebuild policy applied to filesystem events

pub mod cache;
pub mod codegen;
pub mod context;
pub mod error;
pub mod minify;
pub mod pipeline;
pub mod project;
pub mod resolver;
pub mod scanner;
pub mod style;
pub mod trigger;

// Re-export main types
pub use cache::ArtifactCache;
pub use codegen::{escape_template, unescape_template, Binding, BindingValue};
pub use context::{Located, ResolutionContext};
pub use error::{BuildError, BuildResult};
pub use minify::{minify_js, JsMinifier, Minifier, MinifyBackend, MinifyOptions};
pub use pipeline::{BuildReport, BuildStats, BuiltVariant, CompiledVariant, FailedVariant, Pipeline};
pub use project::{ProjectTree, VariantInfo};
pub use resolver::{
    split_export, FragmentSyntax, ImportIssue, Inliner, IssueKind, ResolvedVariant,
    VariantResolver, EXPORT_MARKER,
};
pub use scanner::{ImportKind, ImportRef, ImportScanner};
pub use style::{PassthroughStyle, SassCommand, StyleCompiler};
pub use trigger::{FsEvent, FsEventKind, RebuildScope, RebuildTrigger};
