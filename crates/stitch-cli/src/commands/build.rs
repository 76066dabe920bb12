//! Build command - resolve, minify and store artifacts

use anyhow::{bail, Context, Result};
use colored::Colorize;
use stitch_build::{BuildReport, Pipeline};
use stitch_config::Config;

/// Build command arguments
#[derive(Debug, Default)]
pub struct BuildArgs {
    /// Project to build; all projects when absent
    pub project: Option<String>,
    /// Variant to build; all variants of `project` when absent
    pub variant: Option<String>,
    pub json: bool,
}

/// Run the build command
pub fn run(config: &Config, args: BuildArgs) -> Result<()> {
    let pipeline = Pipeline::from_config(config).context("Failed to set up the build pipeline")?;

    let report = match (&args.project, &args.variant) {
        (Some(project), Some(variant)) => pipeline.build_one(project, variant),
        (Some(project), None) => pipeline
            .build_project(project)
            .with_context(|| format!("Failed to build {}", project))?,
        (None, _) => pipeline.build_all().context("Failed to build projects")?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        bail!(
            "{} of {} variant(s) failed to build",
            report.stats.failed_variants,
            report.stats.total_variants
        );
    }

    Ok(())
}

/// Print a build report in the human-readable form
pub fn print_report(report: &BuildReport) {
    for built in &report.built {
        let issues = match built.issues {
            0 => String::new(),
            1 => ", 1 degraded import".to_string(),
            n => format!(", {} degraded imports", n),
        };
        println!(
            "{:>8} {}/{} -> {} ({} bytes{})",
            "Built".green().bold(),
            built.project,
            built.variant,
            built.artifact.display(),
            built.bytes,
            issues
        );
    }

    for failed in &report.failed {
        let name = if failed.variant.is_empty() {
            failed.project.clone()
        } else {
            format!("{}/{}", failed.project, failed.variant)
        };
        println!("{:>8} {}: {}", "Failed".red().bold(), name, failed.error);
    }

    let stats = &report.stats;
    if stats.total_variants == 0 {
        println!("Nothing to build");
        return;
    }
    println!(
        "Built {} of {} variant(s) in {:.2}s",
        stats.built_variants,
        stats.total_variants,
        stats.total_time.as_secs_f64()
    );
}
