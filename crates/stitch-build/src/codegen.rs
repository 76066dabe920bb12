//! Text generation for inlined imports
//!
//! Every replacement the inliners splice into a script is a [`Binding`]
//! rendered here, and every piece of file content embedded in a string goes
//! through [`escape_template`]. Nothing else in the crate builds code.

use std::fmt;

/// Escape text for embedding between backticks.
///
/// Backslashes, backticks and `${` are escaped; line feeds become `\n` and
/// carriage returns `\r`, so the literal stays on one line and CRLF text
/// keeps every byte.
pub fn escape_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }

    out
}

/// Inverse of [`escape_template`] for the escapes it produces.
pub fn unescape_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// Right-hand side of a generated `const` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingValue {
    /// Template literal over raw text (escaped on render)
    Text(String),
    /// Expression copied verbatim
    Expr(String),
    /// Statements that run before the exported expression is evaluated
    Prelude { statements: String, expr: String },
    /// Zero-argument function wrapping a whole file
    Thunk(String),
    Undefined,
    EmptyObject,
}

/// `const <name> = <value>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: BindingValue,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: BindingValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, BindingValue::Text(text.into()))
    }

    pub fn undefined(name: impl Into<String>) -> Self {
        Self::new(name, BindingValue::Undefined)
    }

    pub fn empty_object(name: impl Into<String>) -> Self {
        Self::new(name, BindingValue::EmptyObject)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "const {} = ", self.name)?;
        match &self.value {
            BindingValue::Text(text) => write!(f, "`{}`", escape_template(text))?,
            BindingValue::Expr(expr) => f.write_str(expr)?,
            BindingValue::Prelude { statements, expr } => {
                write!(f, "(() => {{\n{}\nreturn {};\n}})()", statements, expr)?
            }
            BindingValue::Thunk(body) => write!(f, "() => {{\n{}\n}}", body)?,
            BindingValue::Undefined => f.write_str("undefined")?,
            BindingValue::EmptyObject => f.write_str("{}")?,
        }
        f.write_str(";")
    }
}

/// Statement that appends a `<style>` element holding `name` to the document head
pub fn style_injection(name: &str) -> String {
    format!(
        "(() => {{ const el = document.createElement('style'); el.textContent = {}; document.head.appendChild(el); }})();",
        name
    )
}
