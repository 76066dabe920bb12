use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod commands;
mod config;
mod logging;

/// Stitch compiles injection-script variants into single, flat scripts.
///
/// A projects directory holds one directory per project and one directory
/// per variant inside it. Each variant's entry script may import markup,
/// stylesheets and other scripts; stitch inlines them all, minifies the
/// result and writes `<variant>.min.js` beside the entry file.
///
/// EXAMPLES:
///     stitch list                    Show projects and variants
///     stitch resolve demo v1         Print the flattened script
///     stitch build                   Build every variant
///     stitch build demo              Build all variants of one project
///     stitch watch                   Rebuild on file changes
///
/// ENVIRONMENT VARIABLES:
///     STITCH_PROJECTS_DIR  Projects directory (overrides stitch.toml)
///     STITCH_SASS          Stylesheet compiler executable
///     STITCH_MINIFY        Set to '0' to store unminified artifacts
///     STITCH_DEBOUNCE_MS   Watch debounce window in milliseconds
///     STITCH_JSON          Set to '1' for JSON output by default
///     RUST_LOG             Log filter (default: info)
///     NO_COLOR             Set to disable colored output
#[derive(Parser)]
#[command(name = "stitch")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Projects directory (overrides stitch.toml and STITCH_PROJECTS_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    projects_dir: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet output (warnings and errors only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects and their variants
    ///
    /// EXAMPLES:
    ///     stitch list                  Human-readable listing
    ///     stitch list --json           Machine-readable listing
    ///     stitch list --url https://example.com/shop
    ///                                  Projects that apply to a page
    #[command(visible_alias = "ls")]
    List {
        /// Only show enabled projects whose URL patterns match this URL
        #[arg(long, value_name = "URL")]
        url: Option<String>,
        /// Output in JSON format
        #[arg(long, env = "STITCH_JSON")]
        json: bool,
    },

    /// Resolve one variant and print the flattened script
    ///
    /// Exits with status 2 when the project or variant does not exist.
    ///
    /// EXAMPLES:
    ///     stitch resolve demo v1              Print the resolved script
    ///     stitch resolve demo v1 --minify     Print the minified script
    ///     stitch resolve demo v1 --json       Include degraded imports
    #[command(visible_alias = "r")]
    Resolve {
        /// Project name
        project: String,
        /// Variant name
        variant: String,
        /// Minify the resolved script
        #[arg(long, short = 'm')]
        minify: bool,
        /// Output in JSON format
        #[arg(long, env = "STITCH_JSON")]
        json: bool,
    },

    /// Build minified artifacts
    ///
    /// Builds every variant, every variant of one project, or a single
    /// variant. A failing variant does not stop the others.
    ///
    /// EXAMPLES:
    ///     stitch build                 Build everything
    ///     stitch build demo            Build one project
    ///     stitch build demo v1         Build one variant
    ///     stitch build --json          Output the report as JSON
    #[command(visible_alias = "b")]
    Build {
        /// Project to build (defaults to all projects)
        project: Option<String>,
        /// Variant to build (defaults to all variants of the project)
        #[arg(requires = "project")]
        variant: Option<String>,
        /// Output in JSON format
        #[arg(long, env = "STITCH_JSON")]
        json: bool,
    },

    /// Watch the projects directory and rebuild on changes
    ///
    /// Builds everything once, then rebuilds the affected variants whenever
    /// a script, markup or stylesheet file is added or changed.
    ///
    /// EXAMPLES:
    ///     stitch watch                     Watch with the configured debounce
    ///     stitch watch --debounce-ms=500   Wider debounce window
    ///     stitch watch --no-initial-build  Skip the initial build
    #[command(visible_alias = "w")]
    Watch {
        /// Debounce window in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
        /// Skip building everything on startup
        #[arg(long)]
        no_initial_build: bool,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     stitch completions bash > ~/.bash_completions/stitch.bash
    ///     stitch completions zsh > ~/.zfunc/_stitch
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let cli_config = config::CliConfig::from_env();

    if cli_config.no_color {
        colored::control::set_override(false);
    }
    logging::init(cli.verbose, cli.quiet);

    match run(cli, &cli_config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(commands::exit_status(&e))
        }
    }
}

fn run(cli: Cli, cli_config: &config::CliConfig) -> Result<()> {
    let projects_dir = cli.projects_dir;
    let load_config = || config::load_project_config(projects_dir.as_deref());

    match cli.command {
        Commands::List { url, json } => {
            let json = json || cli_config.default_json;
            commands::list::run(&load_config()?, url.as_deref(), json)?;
        }
        Commands::Resolve {
            project,
            variant,
            minify,
            json,
        } => {
            let args = commands::resolve::ResolveArgs {
                project,
                variant,
                minify,
                json: json || cli_config.default_json,
            };
            commands::resolve::run(&load_config()?, args)?;
        }
        Commands::Build {
            project,
            variant,
            json,
        } => {
            let args = commands::build::BuildArgs {
                project,
                variant,
                json: json || cli_config.default_json,
            };
            commands::build::run(&load_config()?, args)?;
        }
        Commands::Watch {
            debounce_ms,
            no_initial_build,
        } => {
            let project_config = load_config()?;
            // Command-line flag overrides stitch.toml and STITCH_DEBOUNCE_MS
            let debounce_ms = debounce_ms.unwrap_or_else(|| project_config.file.debounce_ms());
            let args = commands::watch::WatchArgs {
                debounce: Duration::from_millis(debounce_ms),
                initial_build: !no_initial_build,
            };
            commands::watch::run(&project_config, args)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
