use std::ffi::OsString;

use logging::DiagnosticEvent;
use metadata::{AccessMask, Ace, Operation};
use test_support::TestDir;

use super::common::*;
use crate::frontend::ADMIN_IDENTITY_ENV;

fn args(subcommand: &str, dir: &TestDir, extra: &[&str]) -> Vec<OsString> {
    let mut args = vec![
        OsString::from("acl-cutover"),
        OsString::from(subcommand),
        OsString::from("--path"),
        root_arg(dir),
        OsString::from("--legacy-domain"),
        OsString::from("DomainA"),
    ];
    args.extend(extra.iter().map(OsString::from));
    args
}

fn legacy_host() -> MemoryHost {
    let host = MemoryHost::new();
    host.provider
        .add_principal(&id("DomainA\\jdoe"))
        .add_principal(&id("DomainB\\jdoe"))
        .add_principal(&id("DomainB\\admin"));
    host
}

#[test]
fn migrate_adds_new_domain_entries() {
    let host = legacy_host();
    let dir = tree(&host, &["jdoe"], &["jdoe/notes.txt"]);
    let notes = dir.join("jdoe/notes.txt");
    host.provider
        .push_ace(&notes, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL));

    let (code, stdout, stderr) =
        run_with_args(&host, args("migrate", &dir, &["--new-domain", "DomainB"]));

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.starts_with("migrate summary:"));
    assert!(stdout.contains("entries added:  1"));
    assert_eq!(
        host.provider.entries(&notes),
        vec![
            Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL),
            Ace::allow(id("DomainB\\jdoe"), AccessMask::FULL_CONTROL),
        ]
    );
}

#[test]
fn json_summary_reports_counters() {
    let host = legacy_host();
    let dir = tree(&host, &["jdoe"], &[]);
    host.provider
        .push_ace(dir.join("jdoe"), Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL));

    let (code, stdout, _) = run_with_args(&host, args("cleanup", &dir, &["--json"]));

    assert_eq!(code, 0);
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("json summary");
    assert_eq!(summary["mode"], "cleanup");
    assert_eq!(summary["nodes_visited"], 2);
    assert_eq!(summary["matches"], 1);
    assert_eq!(summary["removals"], 1);
    assert_eq!(summary["failures"], 0);
    assert!(host.provider.entries(&dir.join("jdoe")).is_empty());
}

#[test]
fn owner_hands_top_folders_to_the_new_domain() {
    let host = legacy_host();
    let dir = tree(&host, &["jdoe", "jdoe/Documents", "jdoe/Documents/deep"], &[]);

    let (code, _, _) = run_with_args(&host, args("owner", &dir, &["--new-domain", "DomainB"]));

    assert_eq!(code, 0);
    assert_eq!(host.provider.owner(&dir.join("jdoe")), Some(id("DomainB\\jdoe")));
    assert_eq!(
        host.provider.owner(&dir.join("jdoe/Documents")),
        Some(id("DomainB\\jdoe"))
    );
    assert_eq!(host.provider.owner(&dir.join("jdoe/Documents/deep")), None);
}

#[test]
fn dry_run_leaves_descriptors_alone() {
    let host = legacy_host();
    let dir = tree(&host, &["jdoe"], &[]);
    host.provider
        .push_ace(dir.join("jdoe"), Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL));

    let (code, stdout, _) = run_with_args(&host, args("cleanup", &dir, &["--dry-run"]));

    assert_eq!(code, 0);
    assert!(stdout.starts_with("cleanup summary (dry run):"));
    assert_eq!(host.provider.write_count(), 0);
    assert_eq!(host.provider.entries(&dir.join("jdoe")).len(), 1);
}

#[test]
fn node_failures_are_warnings_and_exit_zero() {
    let host = legacy_host();
    let dir = tree(&host, &[], &["a.txt", "b.txt"]);
    for name in ["a.txt", "b.txt"] {
        host.provider
            .push_ace(dir.join(name), Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL));
    }
    host.provider.fail_always(dir.join("a.txt"), Operation::AddAce);

    logging::drain_events();
    let (code, stdout, _) = run_with_args(
        &host,
        args("migrate", &dir, &["--new-domain", "DomainB", "--json"]),
    );
    let events = logging::drain_events();

    assert_eq!(code, 0);
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("json summary");
    assert_eq!(summary["failures"], 1);
    assert_eq!(summary["additions"], 1);
    assert!(events.iter().any(|event| matches!(event, DiagnosticEvent::Warning { message }
        if message.contains("a.txt"))));
}

#[test]
fn admin_identity_from_environment_enables_escalation() {
    let host = legacy_host().with_var(ADMIN_IDENTITY_ENV, "DomainB\\admin");
    let dir = tree(&host, &[], &["locked.txt"]);
    let locked = dir.join("locked.txt");
    host.provider
        .push_ace(&locked, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL))
        .lock(&locked, id("DomainB\\admin"));

    let (code, stdout, _) = run_with_args(
        &host,
        args("migrate", &dir, &["--new-domain", "DomainB", "--json"]),
    );

    assert_eq!(code, 0);
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("json summary");
    assert_eq!(summary["escalations"], 1);
    assert_eq!(summary["additions"], 1);
    assert_eq!(summary["failures"], 0);
    assert_eq!(host.provider.call_count(&locked, Operation::AddAce), 3);
}

#[test]
fn revoke_escalation_removes_the_admin_entry() {
    let host = legacy_host();
    let dir = tree(&host, &[], &["locked.txt"]);
    let locked = dir.join("locked.txt");
    host.provider
        .push_ace(&locked, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL))
        .lock(&locked, id("DomainB\\admin"));

    let (code, _, _) = run_with_args(
        &host,
        args(
            "migrate",
            &dir,
            &[
                "--new-domain",
                "DomainB",
                "--admin-identity",
                "DomainB\\admin",
                "--revoke-escalation",
            ],
        ),
    );

    assert_eq!(code, 0);
    let entries = host.provider.entries(&locked);
    assert!(entries.iter().all(|ace| ace.identity != id("DomainB\\admin")));
    assert!(entries.iter().any(|ace| ace.identity == id("DomainB\\jdoe")));
}

#[test]
fn profile_drives_the_run() {
    let host = legacy_host();
    let dir = tree(&host, &["jdoe"], &[]);
    host.provider
        .push_ace(dir.join("jdoe"), Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL));
    let profiles = TestDir::new().expect("temp dir");
    let profile = profiles
        .write_file(
            "profile.json",
            br#"{"legacy_domain": "DomainA", "new_domain": "DomainB", "dry_run": true}"#,
        )
        .expect("write profile");

    let (code, stdout, stderr) = run_with_args(
        &host,
        [
            OsString::from("acl-cutover"),
            OsString::from("migrate"),
            OsString::from("--path"),
            root_arg(&dir),
            OsString::from("--config"),
            profile.into_os_string(),
            OsString::from("--json"),
        ],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("json summary");
    assert_eq!(summary["dry_run"], true);
    assert_eq!(summary["additions"], 1);
    assert_eq!(host.provider.write_count(), 0);
}

#[cfg(feature = "parallel")]
#[test]
fn jobs_spread_nodes_over_workers() {
    let host = legacy_host();
    let names: Vec<String> = (0..16).map(|index| format!("file-{index}.txt")).collect();
    let files: Vec<&str> = names.iter().map(String::as_str).collect();
    let dir = tree(&host, &[], &files);
    for name in &files {
        host.provider
            .push_ace(dir.join(name), Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL));
    }

    let (code, stdout, _) = run_with_args(
        &host,
        args("migrate", &dir, &["--new-domain", "DomainB", "--jobs", "4", "--json"]),
    );

    assert_eq!(code, 0);
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("json summary");
    assert_eq!(summary["nodes_visited"], 17);
    assert_eq!(summary["additions"], 16);
}
