#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front-end of `acl-cutover`. It recognises the
//! `owner`, `migrate` and `cleanup` subcommands together with their shared
//! options, resolves them against an optional JSON profile and the
//! environment, and hands the resulting
//! [`MigrationContext`](engine::MigrationContext) to [`engine::run_opening`].
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for
//! standard output and error. Everything the process environment supplies
//! (the security descriptor provider, privilege elevation, environment
//! variables, signal handling and the log destination) is reached through
//! the [`Host`] trait; [`run`] uses [`SystemHost`] while tests substitute
//! their own implementation through [`run_with_host`].
//!
//! # Invariants
//!
//! - `run` never panics; failures surface as non-zero exit codes.
//! - Per-node failures are warnings: a run that visits every node exits `0`
//!   regardless of how many nodes failed.
//! - Flags given on the command line always win over profile values, which
//!   win over environment fallbacks.
//!
//! # Errors
//!
//! Usage errors exit with `1`. An unavailable security descriptor provider
//! exits with `2`, an unusable root with `3` and a cancelled run with `20`.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["acl-cutover", "--help"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(String::from_utf8_lossy(&stdout).contains("migrate"));
//! ```

mod frontend;

pub use frontend::{
    ADMIN_IDENTITY_ENV, Host, ProfileError, SettingsError, SystemHost, exit_code_from, run,
    run_with_host,
};

/// Argument parsing entry points for integration tests.
///
/// Not part of the stable API.
#[doc(hidden)]
pub mod test_utils {
    pub use crate::frontend::{ParsedArgs, Profile, parse_args};
}
