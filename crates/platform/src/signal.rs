//! Termination signal handling.
//!
//! The first SIGINT or SIGTERM only raises a shared flag so the engine can
//! stop scheduling nodes and report a partial summary. A second signal while
//! the flag is still raised terminates the process immediately.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::PlatformError;

/// Exit status used when a repeated signal aborts the process.
pub const SIGNAL_EXIT_STATUS: i32 = 20;

/// Registers `flag` to be raised on SIGINT or SIGTERM.
#[cfg(unix)]
pub fn install_termination_flag(flag: &Arc<AtomicBool>) -> Result<(), PlatformError> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::flag;

    for signal in [SIGINT, SIGTERM] {
        // Order matters: the shutdown check must run before the flag is set.
        flag::register_conditional_shutdown(signal, SIGNAL_EXIT_STATUS, Arc::clone(flag))
            .map_err(|error| PlatformError::os("install signal handler", error))?;
        flag::register(signal, Arc::clone(flag))
            .map_err(|error| PlatformError::os("install signal handler", error))?;
    }
    tracing::trace!(target: "acl_cutover::exit", "termination handlers installed");
    Ok(())
}

/// Registers `flag` to be raised on SIGINT or SIGTERM.
#[cfg(not(unix))]
pub fn install_termination_flag(_flag: &Arc<AtomicBool>) -> Result<(), PlatformError> {
    Ok(())
}
