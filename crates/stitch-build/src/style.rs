//! External stylesheet compiler
//!
//! Stylesheet compilation is delegated: the inliner only needs something that
//! turns a file into CSS text or fails.

use crate::error::{BuildError, BuildResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Maps a stylesheet file to CSS text
pub trait StyleCompiler {
    fn compile(&self, path: &Path) -> BuildResult<String>;
}

/// Runs a Sass-compatible executable and captures its stdout
#[derive(Debug, Clone)]
pub struct SassCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl SassCommand {
    /// Invoke `program` as `program --no-source-map --style=expanded <path>`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![
                "--no-source-map".to_string(),
                "--style=expanded".to_string(),
            ],
        }
    }

    /// Replace the arguments placed before the stylesheet path
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for SassCommand {
    fn default() -> Self {
        Self::new(stitch_config::settings::DEFAULT_STYLE_COMPILER)
    }
}

impl StyleCompiler for SassCommand {
    fn compile(&self, path: &Path) -> BuildResult<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                BuildError::style_compile(
                    path,
                    format!("could not run {}: {}", self.program.display(), e),
                )
            })?
            .wait_with_output()
            .map_err(|e| BuildError::style_compile(path, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::style_compile(
                path,
                format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status.code().unwrap_or(1),
                    stderr.trim()
                ),
            ));
        }

        String::from_utf8(output.stdout).map_err(|e| BuildError::style_compile(path, e))
    }
}

/// Returns the stylesheet unchanged; for plain CSS trees and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughStyle;

impl StyleCompiler for PassthroughStyle {
    fn compile(&self, path: &Path) -> BuildResult<String> {
        std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))
    }
}
