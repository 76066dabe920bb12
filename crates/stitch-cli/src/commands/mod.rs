pub mod build;
pub mod list;
pub mod resolve;
pub mod watch;

use stitch_build::BuildError;

/// Exit status for a failed command: 2 when the requested project or
/// variant does not exist, 1 for everything else.
pub fn exit_status(error: &anyhow::Error) -> u8 {
    let not_found = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<BuildError>())
        .any(BuildError::is_not_found);
    if not_found {
        2
    } else {
        1
    }
}
