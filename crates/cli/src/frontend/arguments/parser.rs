use std::ffi::OsString;
use std::path::PathBuf;

use clap::ArgMatches;
use engine::Mode;

use super::ParsedArgs;
use crate::frontend::command_builder::clap_command;

/// Parses `args` (including the program name) into [`ParsedArgs`].
///
/// Help and version requests come back as a [`clap::Error`] whose kind is
/// `DisplayHelp` or `DisplayVersion`.
pub fn parse_args<I, T>(args: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = clap_command().try_get_matches_from(args)?;
    let (mode, sub) = match matches.subcommand() {
        Some(("owner", sub)) => (Mode::Ownership, sub),
        Some(("migrate", sub)) => (Mode::Migrate, sub),
        Some(("cleanup", sub)) => (Mode::Cleanup, sub),
        _ => {
            return Err(clap_command().error(
                clap::error::ErrorKind::MissingSubcommand,
                "a subcommand is required: owner, migrate or cleanup",
            ));
        }
    };

    Ok(ParsedArgs {
        mode,
        root: sub.get_one::<PathBuf>("path").cloned().unwrap_or_default(),
        legacy_domain: string(sub, "legacy-domain"),
        new_domain: string(sub, "new-domain"),
        admin_identity: string(sub, "admin-identity"),
        verbose: sub.get_count("verbose"),
        info: strings(sub, "info"),
        debug: strings(sub, "debug"),
        dry_run: sub.get_flag("dry-run"),
        jobs: sub.get_one::<usize>("jobs").copied(),
        node_timeout: sub.get_one::<u64>("node-timeout").copied(),
        revoke_escalation: sub.get_flag("revoke-escalation"),
        json: sub.get_flag("json"),
        config: sub.get_one::<PathBuf>("config").cloned(),
    })
}

// `new-domain` is not defined for every subcommand.
fn string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.try_get_one::<String>(id).ok().flatten().cloned()
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
