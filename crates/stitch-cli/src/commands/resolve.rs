//! Resolve command - print one variant's flattened script

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, Write};
use stitch_build::{Pipeline, ResolvedVariant};
use stitch_config::Config;
use tracing::warn;

/// Resolve command arguments
pub struct ResolveArgs {
    pub project: String,
    pub variant: String,
    /// Print the minified script instead of the resolved one
    pub minify: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    #[serde(flatten)]
    resolved: &'a ResolvedVariant,
    output: &'a str,
    minified: bool,
}

/// Run the resolve command
pub fn run(config: &Config, args: ResolveArgs) -> Result<()> {
    let pipeline = Pipeline::from_config(config)
        .context("Failed to set up the build pipeline")?
        .with_minify(args.minify);

    let compiled = pipeline
        .compile(&args.project, &args.variant)
        .with_context(|| format!("Failed to resolve {}/{}", args.project, args.variant))?;

    if args.json {
        let output = ResolveOutput {
            resolved: &compiled.resolved,
            output: &compiled.output,
            minified: args.minify,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !compiled.resolved.issues.is_empty() {
        warn!(
            "{} import(s) in {}/{} were degraded",
            compiled.resolved.issues.len(),
            args.project,
            args.variant
        );
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(compiled.output.as_bytes())?;
    if !compiled.output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
