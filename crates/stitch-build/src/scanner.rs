//! Pattern-based import scanning
//!
//! Recognises single-line statements of the form
//! `import <name> from '<path>'` (single or double quotes, optional trailing
//! semicolon) whose path ends with a given suffix. This is deliberately not a
//! JavaScript parser: imports inside strings or comments are still matched,
//! and statements split across lines are not.

use crate::error::BuildResult;
use regex::{CaptureMatches, Regex};
use std::ops::Range;

/// Fragment kind an import refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Markup,
    Style,
    Script,
    /// The reserved utility module, served from one shared file
    VirtualUtility,
}

/// One import statement found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef<'t> {
    /// Bound identifier
    pub name: &'t str,
    /// Target path exactly as written
    pub path: &'t str,
    pub kind: ImportKind,
    /// Exact matched statement
    pub statement: &'t str,
    /// Byte range of the statement in the scanned text
    pub span: Range<usize>,
}

/// Scanner for one fragment kind
#[derive(Debug, Clone)]
pub struct ImportScanner {
    pattern: Regex,
    kind: ImportKind,
    /// Specifier of the utility module, script scanners only
    utility: Option<String>,
}

impl ImportScanner {
    /// Scanner for imports whose path ends with `.{extension}`
    pub fn new(kind: ImportKind, extension: &str) -> BuildResult<Self> {
        let target = format!(r"[^'\x22\n]*\.{}", regex::escape(extension));
        Ok(Self {
            pattern: build_pattern(&target)?,
            kind,
            utility: None,
        })
    }

    /// Script scanner that also recognises the bare utility specifier
    pub fn with_utility(extension: &str, module: &str) -> BuildResult<Self> {
        let target = format!(
            r"[^'\x22\n]*\.{}|{}",
            regex::escape(extension),
            regex::escape(module)
        );
        Ok(Self {
            pattern: build_pattern(&target)?,
            kind: ImportKind::Script,
            utility: Some(module.to_string()),
        })
    }

    /// Scan `text` left to right.
    ///
    /// The returned iterator borrows the original text, so callers rewriting a
    /// working copy keep scanning the unmodified source.
    pub fn scan<'s, 't>(&'s self, text: &'t str) -> Imports<'s, 't> {
        Imports {
            matches: self.pattern.captures_iter(text),
            scanner: self,
        }
    }

    fn classify(&self, path: &str) -> ImportKind {
        match &self.utility {
            Some(module) if module == path => ImportKind::VirtualUtility,
            _ => self.kind,
        }
    }
}

/// Lazy sequence of imports, see [`ImportScanner::scan`]
pub struct Imports<'s, 't> {
    matches: CaptureMatches<'s, 't>,
    scanner: &'s ImportScanner,
}

impl<'s, 't> Iterator for Imports<'s, 't> {
    type Item = ImportRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.matches.next()?;
        let whole = caps.get(0)?;
        let name = caps.name("name")?.as_str();
        let path = caps
            .name("single")
            .or_else(|| caps.name("double"))?
            .as_str();

        Some(ImportRef {
            name,
            path,
            kind: self.scanner.classify(path),
            statement: whole.as_str(),
            span: whole.range(),
        })
    }
}

fn build_pattern(target: &str) -> BuildResult<Regex> {
    let source = format!(
        r#"\bimport[ \t]+(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)[ \t]+from[ \t]+(?:'(?P<single>{t})'|"(?P<double>{t})")[ \t]*;?"#,
        t = target
    );
    Ok(Regex::new(&source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_markup_import() {
        let scanner = ImportScanner::new(ImportKind::Markup, "html").unwrap();
        let text = "import h from './v1.html';\nconsole.log(h);";
        let found: Vec<_> = scanner.scan(text).collect();

        assert_eq!(
            found,
            vec![ImportRef {
                name: "h",
                path: "./v1.html",
                kind: ImportKind::Markup,
                statement: "import h from './v1.html';",
                span: 0..26,
            }]
        );
    }

    #[test]
    fn test_double_quotes_and_no_semicolon() {
        let scanner = ImportScanner::new(ImportKind::Style, "scss").unwrap();
        let found: Vec<_> = scanner.scan("import s from \"../theme.scss\"\n").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "../theme.scss");
        assert_eq!(found[0].statement, "import s from \"../theme.scss\"");
    }

    #[test]
    fn test_other_suffixes_ignored() {
        let scanner = ImportScanner::new(ImportKind::Markup, "html").unwrap();
        let text = "import a from './a.js';\nimport b from './b.scss';\nimport c from './c.htmlx';";
        assert_eq!(scanner.scan(text).count(), 0);
    }

    #[test]
    fn test_mismatched_quotes_ignored() {
        let scanner = ImportScanner::new(ImportKind::Markup, "html").unwrap();
        assert_eq!(scanner.scan("import a from './a.html\";").count(), 0);
    }

    #[test]
    fn test_utility_specifier_classified() {
        let scanner = ImportScanner::with_utility("js", "utils").unwrap();
        let text = "import u from 'utils';\nimport s from '../shared.js';\nimport x from 'utilsx';";
        let found: Vec<_> = scanner.scan(text).map(|i| (i.name, i.kind)).collect();
        assert_eq!(
            found,
            vec![
                ("u", ImportKind::VirtualUtility),
                ("s", ImportKind::Script)
            ]
        );
    }

    #[test]
    fn test_import_inside_identifier_ignored() {
        let scanner = ImportScanner::new(ImportKind::Script, "js").unwrap();
        let text = "reimport x from './a.js';\nfooimport y from './b.js';";
        assert_eq!(scanner.scan(text).count(), 0);

        let text = "run();import z from './c.js';";
        let found: Vec<_> = scanner.scan(text).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "z");
    }

    #[test]
    fn test_multiple_imports_in_order() {
        let scanner = ImportScanner::new(ImportKind::Script, "js").unwrap();
        let text = "import a from './a.js'; import $b from './b.js';";
        let names: Vec<_> = scanner.scan(text).map(|i| i.name).collect();
        assert_eq!(names, vec!["a", "$b"]);
    }

    #[test]
    fn test_multiline_statement_not_matched() {
        let scanner = ImportScanner::new(ImportKind::Script, "js").unwrap();
        assert_eq!(scanner.scan("import a\n  from './a.js';").count(), 0);
    }
}
