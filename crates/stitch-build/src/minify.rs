//! Script minification
//!
//! A single pass that strips comments and collapses whitespace. It never
//! renames bindings and never removes statements, so console output survives
//! minification untouched. String, template and regular expression literals
//! are copied verbatim.
//!
//! Newlines are kept wherever dropping one could change how automatic
//! semicolon insertion reads the code; only the obviously safe ones (after an
//! operator or opening bracket, before a closing bracket) are removed.
//!
//! Minification is best effort: [`Minifier::minify`] returns its input when
//! the backend fails.

use crate::error::{BuildError, BuildResult};
use tracing::warn;

/// Keywords after which `/` starts a regular expression
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// A newline directly after one of these never terminates a statement
const NO_NEWLINE_AFTER: &[char] = &[
    '{', '(', '[', ',', ';', ':', '=', '+', '-', '*', '/', '%', '&', '|', '^', '!', '~', '?', '<',
    '>', '.',
];

/// A newline directly before one of these never terminates a statement
const NO_NEWLINE_BEFORE: &[char] = &[')', ']', '}', ',', ';', '.'];

/// Minifier options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinifyOptions {
    /// Drop comments, except `/*! ... */` banners
    pub strip_comments: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            strip_comments: true,
        }
    }
}

/// Something that can minify script text
pub trait MinifyBackend {
    fn minify(&self, text: &str) -> BuildResult<String>;
}

/// Built-in script minifier
#[derive(Debug, Clone, Copy, Default)]
pub struct JsMinifier {
    options: MinifyOptions,
}

impl JsMinifier {
    pub fn new(options: MinifyOptions) -> Self {
        Self { options }
    }
}

impl MinifyBackend for JsMinifier {
    fn minify(&self, text: &str) -> BuildResult<String> {
        minify_js(text, &self.options)
    }
}

/// Best-effort minification front end
pub struct Minifier {
    backend: Box<dyn MinifyBackend>,
}

impl Minifier {
    pub fn new(backend: Box<dyn MinifyBackend>) -> Self {
        Self { backend }
    }

    /// Minify `text`, or return it unchanged if the backend fails
    pub fn minify(&self, text: &str) -> String {
        match self.backend.minify(text) {
            Ok(minified) => minified,
            Err(e) => {
                warn!(error = %e, "minification failed, using unminified script");
                text.to_string()
            }
        }
    }
}

impl Default for Minifier {
    fn default() -> Self {
        Self::new(Box::new(JsMinifier::default()))
    }
}

/// What the last emitted token was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Start,
    Word,
    Punct(char),
    /// String, template or regular expression literal
    Literal,
}

/// Whitespace seen since the last token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Gap {
    None,
    Space,
    Newline,
}

struct Writer {
    out: String,
    last: Last,
    last_word: String,
    gap: Gap,
    /// A kept line comment must be followed by a line break
    force_newline: bool,
}

impl Writer {
    fn new(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            last: Last::Start,
            last_word: String::new(),
            gap: Gap::None,
            force_newline: false,
        }
    }

    fn gap(&mut self, gap: Gap) {
        self.gap = self.gap.max(gap);
    }

    /// Emit whatever separator the pending gap requires before `next`
    fn flush_gap(&mut self, next: char) {
        let gap = std::mem::replace(&mut self.gap, Gap::None);
        if std::mem::take(&mut self.force_newline) {
            self.out.push('\n');
            return;
        }
        match gap {
            Gap::None => {}
            Gap::Space => {
                if self.needs_space(next) {
                    self.out.push(' ');
                }
            }
            Gap::Newline => {
                if self.needs_newline(next) {
                    self.out.push('\n');
                } else if self.needs_space(next) {
                    self.out.push(' ');
                }
            }
        }
    }

    fn needs_space(&self, next: char) -> bool {
        match self.last {
            Last::Start => false,
            Last::Word => {
                is_word_char(next)
                    || (next == '.' && self.last_word.chars().all(|c| c.is_ascii_digit()))
            }
            Last::Literal => is_word_char(next),
            Last::Punct(prev) => {
                (prev == '+' && next == '+')
                    || (prev == '-' && next == '-')
                    || (prev == '/' && (next == '/' || next == '*'))
            }
        }
    }

    fn needs_newline(&self, next: char) -> bool {
        if NO_NEWLINE_BEFORE.contains(&next) {
            return false;
        }
        match self.last {
            Last::Start => false,
            Last::Punct('+') if self.out.ends_with("++") => true,
            Last::Punct('-') if self.out.ends_with("--") => true,
            Last::Punct(prev) => !NO_NEWLINE_AFTER.contains(&prev),
            Last::Word | Last::Literal => true,
        }
    }

    /// Emit one character of ordinary code
    fn emit(&mut self, c: char) {
        self.flush_gap(c);
        self.out.push(c);
        if is_word_char(c) {
            if self.last != Last::Word {
                self.last_word.clear();
            }
            self.last_word.push(c);
            self.last = Last::Word;
        } else {
            self.last = Last::Punct(c);
        }
    }

    /// Emit the opening character of a literal
    fn begin_literal(&mut self, c: char) {
        self.flush_gap(c);
        self.out.push(c);
    }

    /// Append literal content verbatim
    fn raw(&mut self, c: char) {
        self.out.push(c);
    }

    fn end_literal(&mut self) {
        self.last = Last::Literal;
    }

    fn comment(&mut self, text: &str, line: bool) {
        self.flush_gap('/');
        self.out.push_str(text);
        if line {
            self.force_newline = true;
        }
    }

    fn regex_allowed(&self) -> bool {
        match self.last {
            Last::Start => true,
            Last::Punct(')') | Last::Punct(']') => false,
            // Postfix increment ends an operand
            Last::Punct('+') if self.out.ends_with("++") => false,
            Last::Punct('-') if self.out.ends_with("--") => false,
            Last::Punct(_) => true,
            Last::Word => REGEX_KEYWORDS.contains(&self.last_word.as_str()),
            Last::Literal => false,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\\'
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn unterminated(what: &str, at: usize) -> BuildError {
    BuildError::Minify(format!("unterminated {} starting at character {}", what, at))
}

/// Minify script text
pub fn minify_js(input: &str, options: &MinifyOptions) -> BuildResult<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut w = Writer::new(input.len());
    // Brace depth inside each open `${ ... }`
    let mut templates: Vec<u32> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                w.gap(if is_line_break(c) { Gap::Newline } else { Gap::Space });
                i += 1;
            }
            '"' | '\'' => i = copy_string(&chars, i, &mut w)?,
            '`' => {
                w.begin_literal('`');
                i = copy_template(&chars, i + 1, &mut w, &mut templates)?;
            }
            '/' => match chars.get(i + 1) {
                Some('/') => {
                    let end = chars[i..]
                        .iter()
                        .position(|&c| is_line_break(c))
                        .map_or(chars.len(), |p| i + p);
                    if !options.strip_comments {
                        let text: String = chars[i..end].iter().collect();
                        w.comment(&text, true);
                    }
                    i = end;
                }
                Some('*') => {
                    let end = find_block_end(&chars, i + 2).ok_or_else(|| unterminated("comment", i))?;
                    let banner = chars.get(i + 2) == Some(&'!');
                    if banner || !options.strip_comments {
                        let text: String = chars[i..end].iter().collect();
                        w.comment(&text, false);
                    } else if chars[i..end].iter().any(|&c| is_line_break(c)) {
                        w.gap(Gap::Newline);
                    } else {
                        w.gap(Gap::Space);
                    }
                    i = end;
                }
                _ if w.regex_allowed() => i = copy_regex(&chars, i, &mut w)?,
                _ => {
                    w.emit('/');
                    i += 1;
                }
            },
            '{' => {
                if let Some(depth) = templates.last_mut() {
                    *depth += 1;
                }
                w.emit('{');
                i += 1;
            }
            '}' => match templates.last_mut() {
                Some(0) => {
                    templates.pop();
                    w.gap = Gap::None;
                    w.raw('}');
                    i = copy_template(&chars, i + 1, &mut w, &mut templates)?;
                }
                Some(depth) => {
                    *depth -= 1;
                    w.emit('}');
                    i += 1;
                }
                None => {
                    w.emit('}');
                    i += 1;
                }
            },
            _ => {
                w.emit(c);
                i += 1;
            }
        }
    }

    if !templates.is_empty() {
        return Err(BuildError::Minify(
            "unterminated template expression".to_string(),
        ));
    }

    Ok(w.out)
}

/// Index just past the `*/` closing a block comment whose body starts at `from`
fn find_block_end(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1))
        .find(|&j| chars[j] == '*' && chars[j + 1] == '/')
        .map(|j| j + 2)
}

fn copy_string(chars: &[char], start: usize, w: &mut Writer) -> BuildResult<usize> {
    let quote = chars[start];
    w.begin_literal(quote);
    let mut j = start + 1;

    while let Some(&c) = chars.get(j) {
        w.raw(c);
        if c == '\\' {
            let escaped = chars.get(j + 1).ok_or_else(|| unterminated("string", start))?;
            w.raw(*escaped);
            j += 2;
            continue;
        }
        if c == quote {
            w.end_literal();
            return Ok(j + 1);
        }
        if c == '\n' || c == '\r' {
            break;
        }
        j += 1;
    }

    Err(unterminated("string", start))
}

/// Copy template text from `start` (just after a backtick or a closing `}`)
/// up to and including the closing backtick or the next `${`.
fn copy_template(
    chars: &[char],
    start: usize,
    w: &mut Writer,
    templates: &mut Vec<u32>,
) -> BuildResult<usize> {
    let mut j = start;

    while let Some(&c) = chars.get(j) {
        w.raw(c);
        match c {
            '\\' => {
                let escaped = chars.get(j + 1).ok_or_else(|| unterminated("template", start))?;
                w.raw(*escaped);
                j += 2;
            }
            '`' => {
                w.end_literal();
                return Ok(j + 1);
            }
            '$' if chars.get(j + 1) == Some(&'{') => {
                w.raw('{');
                templates.push(0);
                w.last = Last::Punct('{');
                return Ok(j + 2);
            }
            _ => j += 1,
        }
    }

    Err(unterminated("template", start))
}

fn copy_regex(chars: &[char], start: usize, w: &mut Writer) -> BuildResult<usize> {
    w.begin_literal('/');
    let mut j = start + 1;
    let mut in_class = false;

    while let Some(&c) = chars.get(j) {
        if is_line_break(c) {
            break;
        }
        w.raw(c);
        match c {
            '\\' => {
                let escaped = chars.get(j + 1).ok_or_else(|| unterminated("regex", start))?;
                w.raw(*escaped);
                j += 2;
                continue;
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                w.end_literal();
                return Ok(j + 1);
            }
            _ => {}
        }
        j += 1;
    }

    Err(unterminated("regex", start))
}
