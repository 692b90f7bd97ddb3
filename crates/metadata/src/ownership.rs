#![allow(unsafe_code)]

/// Wraps a raw uid for `chownat`.
///
/// Raw values come from the name service and are never the `-1` sentinel.
#[cfg(unix)]
pub(crate) fn uid_from_raw(raw: rustix::process::RawUid) -> rustix::fs::Uid {
    unsafe { rustix::fs::Uid::from_raw(raw) }
}
