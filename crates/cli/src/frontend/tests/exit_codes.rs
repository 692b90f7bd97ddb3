use super::common::*;
use std::ffi::OsString;

#[test]
fn unknown_option_exits_with_usage_status() {
    let (code, _, stderr) = run_with_args(
        &MemoryHost::new(),
        ["acl-cutover", "cleanup", "--path", "/srv", "--bogus"],
    );

    assert_eq!(code, 1);
    assert!(stderr.contains("--bogus"));
}

#[test]
fn missing_legacy_domain_exits_with_usage_status() {
    let (code, stdout, stderr) =
        run_with_args(&MemoryHost::new(), ["acl-cutover", "cleanup", "--path", "/srv"]);

    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("acl-cutover: error:"));
    assert!(stderr.contains("--legacy-domain"));
}

#[test]
fn unavailable_provider_exits_with_status_2() {
    let host = MemoryHost::new().unavailable();
    let dir = tree(&host, &[], &[]);

    let (code, stdout, stderr) = run_with_args(
        &host,
        [
            OsString::from("acl-cutover"),
            OsString::from("cleanup"),
            OsString::from("--path"),
            root_arg(&dir),
            OsString::from("--legacy-domain"),
            OsString::from("DomainA"),
        ],
    );

    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.contains("provider unavailable"));
    assert!(host.provider.calls().is_empty());
}

#[test]
fn missing_root_exits_with_status_3() {
    let (code, _, stderr) = run_with_args(
        &MemoryHost::new(),
        [
            "acl-cutover",
            "migrate",
            "--path",
            "/nonexistent/acl-cutover/root",
            "--legacy-domain",
            "DomainA",
            "--new-domain",
            "DomainB",
        ],
    );

    assert_eq!(code, 3);
    assert!(stderr.contains("/nonexistent/acl-cutover/root"));
}

#[test]
fn interrupted_run_exits_with_status_20() {
    let host = MemoryHost::new().interrupted();
    let dir = tree(&host, &["a", "b"], &[]);

    let (code, stdout, _) = run_with_args(
        &host,
        [
            OsString::from("acl-cutover"),
            OsString::from("cleanup"),
            OsString::from("--path"),
            root_arg(&dir),
            OsString::from("--legacy-domain"),
            OsString::from("DomainA"),
        ],
    );

    assert_eq!(code, 20);
    assert!(stdout.contains("cancelled before completion"));
    assert!(host.provider.calls().is_empty());
}
