//! Constants shared across the CLI front-end.

/// Environment variable consulted for the administrative identity when
/// neither `--admin-identity` nor the profile supplies one.
pub const ADMIN_IDENTITY_ENV: &str = "ACL_CUTOVER_ADMIN_IDENTITY";

/// Program name used in help output and diagnostics.
pub(super) const PROGRAM_NAME: &str = logging::PROGRAM_PREFIX;

/// Worker threads used when neither `--jobs` nor the profile sets a count.
pub(super) const DEFAULT_JOBS: usize = 1;
