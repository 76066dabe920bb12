//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber.
///
/// `-v`/`-q` pick the level outright; otherwise `RUST_LOG` applies, falling
/// back to `info`.
pub fn init(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
