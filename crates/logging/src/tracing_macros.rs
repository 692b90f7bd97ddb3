//! crates/logging/src/tracing_macros.rs
//! Convenience macros for cutover-specific tracing.
//!
//! These macros wrap the standard tracing macros with the targets that
//! [`CutoverLayer`](crate::CutoverLayer) maps onto info and debug flags.
//! Crates invoking them must depend on `tracing` directly.

/// Emit a directory enumeration trace.
///
/// # Example
/// ```ignore
/// trace_walk!("found {} entries in {:?}", count, path);
/// ```
#[macro_export]
macro_rules! trace_walk {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acl_cutover::walk", $($arg)*);
    };
}

/// Emit a security descriptor read/write trace.
///
/// # Example
/// ```ignore
/// trace_acl!("read {} explicit entries from {:?}", count, path);
/// ```
#[macro_export]
macro_rules! trace_acl {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acl_cutover::acl", $($arg)*);
    };
}

/// Emit an ownership change trace.
///
/// # Example
/// ```ignore
/// trace_own!("chown {:?} to uid {}", path, uid);
/// ```
#[macro_export]
macro_rules! trace_own {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acl_cutover::own", $($arg)*);
    };
}

/// Emit an escalation cycle trace.
///
/// # Example
/// ```ignore
/// trace_escalate!("granting {} full control on {:?}", admin, path);
/// ```
#[macro_export]
macro_rules! trace_escalate {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acl_cutover::escalate", $($arg)*);
    };
}

/// Emit an orphan purge trace.
///
/// # Example
/// ```ignore
/// trace_purge!("removing orphaned {} from {:?}", identity, path);
/// ```
#[macro_export]
macro_rules! trace_purge {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acl_cutover::purge", $($arg)*);
    };
}

/// Emit a per-node action line.
///
/// # Example
/// ```ignore
/// trace_name!("{}: owner -> {}", path.display(), identity);
/// ```
#[macro_export]
macro_rules! trace_name {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "acl_cutover::name", $($arg)*);
    };
}

/// Emit a skipped-node line.
///
/// # Example
/// ```ignore
/// trace_skip!("{}: no legacy entries", path.display());
/// ```
#[macro_export]
macro_rules! trace_skip {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "acl_cutover::skip", $($arg)*);
    };
}

/// Emit a statistics trace.
///
/// # Example
/// ```ignore
/// trace_stats!("visited {} nodes", count);
/// ```
#[macro_export]
macro_rules! trace_stats {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "acl_cutover::stats", $($arg)*);
    };
}

/// Emit an exit/cleanup trace.
///
/// # Example
/// ```ignore
/// trace_exit!("exiting with code {}", code);
/// ```
#[macro_export]
macro_rules! trace_exit {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acl_cutover::exit", $($arg)*);
    };
}
