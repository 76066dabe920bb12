//! Watch mode - rebuild affected variants on file changes

use anyhow::{bail, Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use stitch_build::{FsEvent, FsEventKind, Pipeline, RebuildTrigger};
use stitch_config::Config;
use tracing::{debug, error};

use super::build::print_report;

/// Watch mode configuration
pub struct WatchArgs {
    /// Events arriving within this window are handled together
    pub debounce: Duration,
    /// Build everything before watching
    pub initial_build: bool,
}

/// Watch the projects directory until the process is stopped
pub fn run(config: &Config, args: WatchArgs) -> Result<()> {
    let projects_dir = config.projects_dir();
    if !projects_dir.is_dir() {
        bail!("Projects directory not found: {}", projects_dir.display());
    }

    let pipeline = Pipeline::from_config(config).context("Failed to set up the build pipeline")?;
    let trigger = RebuildTrigger::new(pipeline);

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(&projects_dir, RecursiveMode::Recursive)
        .context("Failed to start watching the projects directory")?;

    // The utility file may live outside the projects directory
    let utility_file = config.utility_file();
    if !utility_file.starts_with(&projects_dir) && utility_file.is_file() {
        watcher
            .watch(&utility_file, RecursiveMode::NonRecursive)
            .context("Failed to start watching the utility module")?;
    }

    println!("Watching {} for changes...", projects_dir.display());
    println!("Press Ctrl+C to stop\n");

    if args.initial_build {
        match trigger.pipeline().build_all() {
            Ok(report) => print_report(&report),
            Err(e) => error!(error = %e, "initial build failed"),
        }
    }

    while let Some(events) = next_batch(&rx, args.debounce) {
        if events.is_empty() {
            continue;
        }
        let report = trigger.handle_batch(&events);
        if report.stats.total_variants > 0 {
            print_report(&report);
        }
    }

    Ok(())
}

/// Block for the next event, then collect whatever else arrives within the
/// debounce window. `None` once the watcher is gone.
fn next_batch(
    rx: &Receiver<notify::Result<Event>>,
    debounce: Duration,
) -> Option<Vec<FsEvent>> {
    let mut events = Vec::new();
    accept(rx.recv().ok()?, &mut events);

    let deadline = Instant::now() + debounce;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(event) => accept(event, &mut events),
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Some(events)
}

fn accept(event: notify::Result<Event>, events: &mut Vec<FsEvent>) {
    match event {
        Ok(event) => events.extend(to_fs_events(event)),
        Err(e) => error!(error = %e, "watch error"),
    }
}

/// Map a notify event onto the add/change events the trigger understands
fn to_fs_events(event: Event) -> Vec<FsEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => FsEventKind::Add,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => FsEventKind::Change,
        other => {
            debug!(kind = ?other, "ignoring filesystem event");
            return Vec::new();
        }
    };

    event
        .paths
        .into_iter()
        .map(|path| FsEvent { kind, path })
        .collect()
}
