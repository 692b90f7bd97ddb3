use std::path::PathBuf;

use clap::{Arg, ArgAction, Command as ClapCommand, value_parser};

use super::defaults::PROGRAM_NAME;

const AFTER_HELP: &str = "\
Per-node failures are reported as warnings and do not change the exit status.
Exit status: 0 success, 1 usage error, 2 provider unavailable,
3 root cannot be enumerated, 20 interrupted.";

pub(crate) fn clap_command() -> ClapCommand {
    ClapCommand::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Migrate file ownership and ACL entries from a legacy directory domain")
        .after_help(AFTER_HELP)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            mode_command(
                "owner",
                "Hand each top-level folder and its direct children to the same-named account",
            )
            .arg(new_domain_arg()),
        )
        .subcommand(
            mode_command(
                "migrate",
                "Add a new-domain copy of every explicit legacy-domain entry",
            )
            .arg(new_domain_arg()),
        )
        .subcommand(mode_command(
            "cleanup",
            "Remove explicit legacy-domain entries and purge unresolvable ones",
        ))
}

fn mode_command(name: &'static str, about: &'static str) -> ClapCommand {
    ClapCommand::new(name)
        .about(about)
        .arg(
            Arg::new("path")
                .long("path")
                .value_name("ROOT")
                .help("Root of the tree to process")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("legacy-domain")
                .long("legacy-domain")
                .value_name("DOMAIN")
                .help("Domain whose entries are migrated or removed"),
        )
        .arg(
            Arg::new("admin-identity")
                .long("admin-identity")
                .value_name("IDENTITY")
                .help("Identity granted full control to retry denied operations"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("info")
                .long("info")
                .value_name("FLAGS")
                .help("Fine-grained informational verbosity (name, skip, stats, misc)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .value_name("FLAGS")
                .help("Fine-grained debug verbosity (acl, own, walk, escalate, purge, exit)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Report planned changes without applying them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .short('j')
                .value_name("N")
                .help("Number of nodes processed concurrently")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("node-timeout")
                .long("node-timeout")
                .value_name("SECS")
                .help("Time budget per node; 0 disables the budget")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("revoke-escalation")
                .long("revoke-escalation")
                .help("Remove the administrative entry again after a successful retry")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the run summary as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON profile supplying defaults for these options")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn new_domain_arg() -> Arg {
    Arg::new("new-domain")
        .long("new-domain")
        .value_name("DOMAIN")
        .help("Domain that replaces the legacy one")
}
