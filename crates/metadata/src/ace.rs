//! crates/metadata/src/ace.rs
//!
//! Access control entries in a backend-neutral shape.

use std::fmt;
use std::ops::BitOr;

use crate::Identity;

/// Access rights bitmask.
///
/// Bit positions follow the NFSv4 access mask, which shares its layout with
/// the Windows `ACCESS_MASK` for the standard and specific rights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccessMask(u32);

impl AccessMask {
    /// Read data from file / list directory.
    pub const READ_DATA: u32 = 0x0001;
    /// Write data to file / create file in directory.
    pub const WRITE_DATA: u32 = 0x0002;
    /// Append data to file / create subdirectory.
    pub const APPEND_DATA: u32 = 0x0004;
    /// Read named attributes.
    pub const READ_NAMED_ATTRS: u32 = 0x0008;
    /// Write named attributes.
    pub const WRITE_NAMED_ATTRS: u32 = 0x0010;
    /// Execute file / search directory.
    pub const EXECUTE: u32 = 0x0020;
    /// Delete a file within a directory.
    pub const DELETE_CHILD: u32 = 0x0040;
    /// Read file attributes.
    pub const READ_ATTRIBUTES: u32 = 0x0080;
    /// Write file attributes.
    pub const WRITE_ATTRIBUTES: u32 = 0x0100;
    /// Delete the object itself.
    pub const DELETE: u32 = 0x10000;
    /// Read the ACL.
    pub const READ_ACL: u32 = 0x20000;
    /// Write the ACL.
    pub const WRITE_ACL: u32 = 0x40000;
    /// Change owner.
    pub const WRITE_OWNER: u32 = 0x80000;
    /// Synchronize.
    pub const SYNCHRONIZE: u32 = 0x100000;

    /// Every right above.
    pub const FULL_CONTROL: Self = Self(0x1F01FF);

    /// Creates a mask from raw value.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw mask value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is present.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AccessMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for AccessMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::FULL_CONTROL {
            f.write_str("FullControl")
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

/// Whether an entry grants or denies its rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AceType {
    /// Access allowed.
    Allow,
    /// Access denied.
    Deny,
}

impl fmt::Display for AceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        })
    }
}

/// Which kinds of children inherit an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InheritanceFlags(u32);

impl InheritanceFlags {
    /// No inheritance.
    pub const NONE: Self = Self(0);
    /// Files inherit the entry.
    pub const OBJECT_INHERIT: Self = Self(0x0001);
    /// Subdirectories inherit the entry.
    pub const CONTAINER_INHERIT: Self = Self(0x0002);

    const MASK: u32 = 0x0003;

    /// Creates flags from raw value, discarding unknown bits.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value & Self::MASK)
    }

    /// Returns the raw flags value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Checks if every bit of `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for InheritanceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// How an inheritable entry propagates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PropagationFlags(u32);

impl PropagationFlags {
    /// Default propagation.
    pub const NONE: Self = Self(0);
    /// Children inherit the entry but do not pass it on.
    pub const NO_PROPAGATE_INHERIT: Self = Self(0x0004);
    /// The entry does not apply to the object it is set on.
    pub const INHERIT_ONLY: Self = Self(0x0008);

    const MASK: u32 = 0x000C;

    /// Creates flags from raw value, discarding unknown bits.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value & Self::MASK)
    }

    /// Returns the raw flags value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Checks if every bit of `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for PropagationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A single access control entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ace {
    /// Principal the entry applies to.
    pub identity: Identity,
    /// Rights granted or denied.
    pub mask: AccessMask,
    /// Allow or deny.
    pub ace_type: AceType,
    /// Child kinds that inherit the entry.
    pub inheritance: InheritanceFlags,
    /// Propagation behaviour of inherited copies.
    pub propagation: PropagationFlags,
    /// Whether the principal names a group rather than a user.
    pub group: bool,
    /// Whether the entry was inherited from a parent.
    pub inherited: bool,
}

impl Ace {
    /// Creates an explicit, non-inheritable allow entry.
    pub fn allow(identity: Identity, mask: AccessMask) -> Self {
        Self {
            identity,
            mask,
            ace_type: AceType::Allow,
            inheritance: InheritanceFlags::NONE,
            propagation: PropagationFlags::NONE,
            group: false,
            inherited: false,
        }
    }

    /// Creates an explicit, non-inheritable deny entry.
    pub fn deny(identity: Identity, mask: AccessMask) -> Self {
        Self {
            ace_type: AceType::Deny,
            ..Self::allow(identity, mask)
        }
    }

    /// Sets the inheritance flags.
    #[must_use]
    pub fn with_inheritance(mut self, inheritance: InheritanceFlags) -> Self {
        self.inheritance = inheritance;
        self
    }

    /// Sets the propagation flags.
    #[must_use]
    pub fn with_propagation(mut self, propagation: PropagationFlags) -> Self {
        self.propagation = propagation;
        self
    }

    /// Marks the entry as inherited.
    #[must_use]
    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    /// Returns a copy naming `identity`, with every other attribute kept.
    #[must_use]
    pub fn for_identity(&self, identity: Identity) -> Self {
        Self {
            identity,
            inherited: false,
            ..self.clone()
        }
    }

    /// Returns `true` when `other` differs from `self` at most in its rights.
    pub fn same_slot(&self, other: &Self) -> bool {
        self.identity.same_principal(&other.identity)
            && self.ace_type == other.ace_type
            && self.inheritance == other.inheritance
            && self.propagation == other.propagation
            && self.group == other.group
    }
}

impl fmt::Display for Ace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.ace_type, self.identity, self.mask)?;
        if self.inherited {
            f.write_str(" (inherited)")?;
        }
        Ok(())
    }
}

/// Inserts `ace` as an explicit entry in canonical position.
///
/// An explicit entry occupying the same slot has its rights merged instead.
/// Deny entries land ahead of explicit allow entries and every new entry
/// precedes the inherited ones. Returns `false` when the list was already
/// complete.
pub(crate) fn insert_canonical(entries: &mut Vec<Ace>, ace: &Ace) -> bool {
    let mut ace = ace.clone();
    ace.inherited = false;

    if let Some(existing) = entries
        .iter_mut()
        .find(|entry| !entry.inherited && entry.same_slot(&ace))
    {
        if existing.mask.contains(ace.mask) {
            return false;
        }
        existing.mask = existing.mask | ace.mask;
        return true;
    }

    let position = match ace.ace_type {
        AceType::Deny => entries
            .iter()
            .position(|entry| entry.inherited || entry.ace_type == AceType::Allow),
        AceType::Allow => entries.iter().position(|entry| entry.inherited),
    }
    .unwrap_or(entries.len());

    entries.insert(position, ace);
    true
}

/// Removes every explicit entry naming `identity`, returning how many went.
pub(crate) fn remove_explicit(entries: &mut Vec<Ace>, identity: &Identity) -> usize {
    let before = entries.len();
    entries.retain(|entry| entry.inherited || !entry.identity.same_principal(identity));
    before - entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> Identity {
        Identity::parse(text).unwrap()
    }

    #[test]
    fn full_control_contains_every_right() {
        let read = AccessMask::from_raw(AccessMask::READ_DATA | AccessMask::READ_ACL);
        assert!(AccessMask::FULL_CONTROL.contains(read));
        assert!(!read.contains(AccessMask::FULL_CONTROL));
        assert_eq!(AccessMask::FULL_CONTROL.to_string(), "FullControl");
    }

    #[test]
    fn flags_discard_foreign_bits() {
        assert_eq!(InheritanceFlags::from_raw(0xFF).as_raw(), 0x3);
        assert_eq!(PropagationFlags::from_raw(0xFF).as_raw(), 0xC);
        let both = InheritanceFlags::OBJECT_INHERIT | InheritanceFlags::CONTAINER_INHERIT;
        assert!(both.contains(InheritanceFlags::CONTAINER_INHERIT));
    }

    #[test]
    fn allow_goes_after_explicit_and_before_inherited() {
        let mut entries = vec![
            Ace::deny(id("A\\x"), AccessMask::from_raw(AccessMask::WRITE_DATA)),
            Ace::allow(id("A\\y"), AccessMask::FULL_CONTROL),
            Ace::allow(id("A\\z"), AccessMask::FULL_CONTROL).inherited(),
        ];
        assert!(insert_canonical(
            &mut entries,
            &Ace::allow(id("B\\y"), AccessMask::FULL_CONTROL)
        ));

        let names: Vec<String> = entries.iter().map(|e| e.identity.to_string()).collect();
        assert_eq!(names, ["A\\x", "A\\y", "B\\y", "A\\z"]);
    }

    #[test]
    fn deny_goes_ahead_of_allow() {
        let mut entries = vec![Ace::allow(id("A\\y"), AccessMask::FULL_CONTROL)];
        insert_canonical(
            &mut entries,
            &Ace::deny(id("B\\y"), AccessMask::from_raw(AccessMask::DELETE)),
        );
        assert_eq!(entries[0].ace_type, AceType::Deny);
    }

    #[test]
    fn same_slot_merges_rights() {
        let read = AccessMask::from_raw(AccessMask::READ_DATA);
        let write = AccessMask::from_raw(AccessMask::WRITE_DATA);
        let mut entries = vec![Ace::allow(id("A\\y"), read)];

        assert!(insert_canonical(&mut entries, &Ace::allow(id("a\\Y"), write)));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mask, read | write);

        assert!(!insert_canonical(&mut entries, &Ace::allow(id("A\\y"), read)));
    }

    #[test]
    fn inherited_entries_are_never_merged_or_removed() {
        let mut entries = vec![Ace::allow(id("A\\y"), AccessMask::FULL_CONTROL).inherited()];
        assert!(insert_canonical(
            &mut entries,
            &Ace::allow(id("A\\y"), AccessMask::FULL_CONTROL)
        ));
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].inherited);

        assert_eq!(remove_explicit(&mut entries, &id("A\\y")), 1);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].inherited);
    }
}
