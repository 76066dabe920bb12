//! List command - projects, their settings and variants

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use stitch_build::{ProjectTree, VariantInfo};
use stitch_config::{Config, ProjectSettings};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectListing {
    #[serde(flatten)]
    settings: ProjectSettings,
    variants: Vec<VariantInfo>,
}

/// Run the list command. With `url`, only enabled projects applying to that
/// URL are listed.
pub fn run(config: &Config, url: Option<&str>, json: bool) -> Result<()> {
    let listings = filter_by_url(collect(config)?, url);

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    if listings.is_empty() {
        match url {
            Some(url) => println!("No projects apply to {}", url),
            None => println!("No projects in {}", config.projects_dir().display()),
        }
        return Ok(());
    }

    for listing in &listings {
        println!(
            "{} {}",
            listing.settings.display_name.bold(),
            format!("({})", listing.settings.url_patterns.join(", ")).dimmed()
        );
        for variant in &listing.variants {
            let entry = match &variant.entry {
                Some(entry) => entry.normal(),
                None => "no entry script".yellow(),
            };
            let built = if variant.has_artifact {
                "built".green()
            } else {
                "not built".dimmed()
            };
            println!("  {:<16} {:<24} {}", variant.name, entry, built);
        }
    }

    Ok(())
}

fn collect(config: &Config) -> Result<Vec<ProjectListing>> {
    let tree = ProjectTree::new(config.projects_dir(), config.script_ext());
    let projects = tree.list_projects().context("Failed to list projects")?;

    projects
        .into_iter()
        .map(|project| {
            let variants = tree
                .describe_variants(&project)
                .with_context(|| format!("Failed to list variants of {}", project))?;
            Ok(ProjectListing {
                settings: ProjectSettings::for_project(&project),
                variants,
            })
        })
        .collect()
}

fn filter_by_url(listings: Vec<ProjectListing>, url: Option<&str>) -> Vec<ProjectListing> {
    let Some(url) = url else {
        return listings;
    };
    listings
        .into_iter()
        .filter(|listing| listing.settings.enabled && listing.settings.url_matches(url))
        .collect()
}
