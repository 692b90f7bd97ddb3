use std::path::PathBuf;

use engine::Mode;

/// Parsed command-line arguments.
///
/// Holds exactly what was given on the command line. Profile values and
/// environment fallbacks are merged in later, so every optional field
/// stays `None` (or `false`) unless the matching flag was passed.
///
/// **Warning**: This type is exposed via `cli::test_utils` for integration
/// tests only. It is not part of the stable public API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Selected subcommand.
    pub mode: Mode,
    /// `--path`.
    pub root: PathBuf,
    /// `--legacy-domain`.
    pub legacy_domain: Option<String>,
    /// `--new-domain`; never set for `cleanup`.
    pub new_domain: Option<String>,
    /// `--admin-identity`, unparsed.
    pub admin_identity: Option<String>,
    /// Number of `-v` flags.
    pub verbose: u8,
    /// `--info` values in the order given.
    pub info: Vec<String>,
    /// `--debug` values in the order given.
    pub debug: Vec<String>,
    /// `--dry-run`.
    pub dry_run: bool,
    /// `--jobs`.
    pub jobs: Option<usize>,
    /// `--node-timeout` in seconds.
    pub node_timeout: Option<u64>,
    /// `--revoke-escalation`.
    pub revoke_escalation: bool,
    /// `--json`.
    pub json: bool,
    /// `--config`.
    pub config: Option<PathBuf>,
}
