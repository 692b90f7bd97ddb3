#![deny(missing_docs)]

//! Process-level plumbing for acl-cutover.
//!
//! [`ElevationGuard`] raises privileges for the duration of a scope through a
//! [`PrivilegeElevator`] and lowers them on every exit path.
//! [`install_termination_flag`] turns SIGINT and SIGTERM into a cancellation
//! flag.

mod elevation;
mod error;
mod signal;

#[cfg(unix)]
pub use elevation::EffectiveUidElevator;
pub use elevation::{ElevationGuard, FlagElevator, PrivilegeElevator, UnsupportedElevator};
pub use error::PlatformError;
pub use signal::{SIGNAL_EXIT_STATUS, install_termination_flag};
