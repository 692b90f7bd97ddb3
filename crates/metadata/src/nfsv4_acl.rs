//! crates/metadata/src/nfsv4_acl.rs
//!
//! NFSv4 ACL wire format.
//!
//! On Linux the NFS client exposes a file's ACL as the XDR-encoded
//! `fattr4_acl` in the `system.nfs4_acl` extended attribute:
//!
//! - ACE count (4 bytes, big-endian)
//! - for each ACE: type, flags and mask (4 bytes each, big-endian), then the
//!   `who` principal as a length-prefixed UTF-8 string padded to 4 bytes
//!
//! Allow and deny entries convert to [`Ace`] values. Audit and alarm entries
//! have no counterpart there and are carried through edits untouched.
//! Entries that survive an edit are written back in their stored form, so
//! the original `who` spelling and any flag bits without an [`Ace`]
//! counterpart are kept; only new entries are rendered from scratch.

use crate::ace::{AccessMask, Ace, AceType, InheritanceFlags, PropagationFlags};
use crate::{Identity, IdentityParseError};

/// The extended attribute name for NFSv4 ACLs.
pub const NFS4_ACL_XATTR: &str = "system.nfs4_acl";

/// Raw ACE type: access allowed.
pub const ACE4_ACCESS_ALLOWED: u32 = 0;
/// Raw ACE type: access denied.
pub const ACE4_ACCESS_DENIED: u32 = 1;
/// Raw ACE type: system audit.
pub const ACE4_SYSTEM_AUDIT: u32 = 2;
/// Raw ACE type: system alarm.
pub const ACE4_SYSTEM_ALARM: u32 = 3;

/// Principal is a group.
pub const ACE4_IDENTIFIER_GROUP: u32 = 0x0040;
/// ACE was inherited from parent.
pub const ACE4_INHERITED_ACE: u32 = 0x0080;

/// Error decoding an ACL attribute.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The buffer ended inside a field.
    #[error("ACL truncated at byte {0}")]
    Truncated(usize),
    /// The ACE type is not one of the four defined values.
    #[error("invalid NFSv4 ACE type: {0}")]
    AceType(u32),
    /// The principal is not valid UTF-8.
    #[error("ACE principal is not valid UTF-8")]
    Utf8,
    /// Bytes remained after the declared number of entries.
    #[error("{0} trailing byte(s) after the last ACE")]
    Trailing(usize),
    /// The principal could not be parsed as an identity.
    #[error(transparent)]
    Identity(#[from] IdentityParseError),
}

/// A single NFSv4 ACE as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfs4Ace {
    /// Raw ACE type.
    pub ace_type: u32,
    /// Raw flags (inheritance, audit, group, inherited).
    pub flags: u32,
    /// Raw access mask.
    pub mask: u32,
    /// Principal identifier.
    pub who: String,
}

impl Nfs4Ace {
    fn from_ace(ace: &Ace) -> Self {
        let mut flags = ace.inheritance.as_raw() | ace.propagation.as_raw();
        if ace.group {
            flags |= ACE4_IDENTIFIER_GROUP;
        }
        if ace.inherited {
            flags |= ACE4_INHERITED_ACE;
        }
        Self {
            ace_type: match ace.ace_type {
                AceType::Allow => ACE4_ACCESS_ALLOWED,
                AceType::Deny => ACE4_ACCESS_DENIED,
            },
            flags,
            mask: ace.mask.as_raw(),
            who: ace.identity.to_nfs4_who(),
        }
    }

    fn to_ace(&self) -> Result<Option<Ace>, WireError> {
        let ace_type = match self.ace_type {
            ACE4_ACCESS_ALLOWED => AceType::Allow,
            ACE4_ACCESS_DENIED => AceType::Deny,
            _ => return Ok(None),
        };
        Ok(Some(Ace {
            identity: Identity::parse(&self.who)?,
            mask: AccessMask::from_raw(self.mask),
            ace_type,
            inheritance: InheritanceFlags::from_raw(self.flags),
            propagation: PropagationFlags::from_raw(self.flags),
            group: self.flags & ACE4_IDENTIFIER_GROUP != 0,
            inherited: self.flags & ACE4_INHERITED_ACE != 0,
        }))
    }
}

/// An NFSv4 ACL in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nfs4Acl {
    /// The stored entries.
    pub aces: Vec<Nfs4Ace>,
}

/// Access entries of an ACL plus the audit/alarm entries kept alongside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitAcl {
    /// Allow and deny entries, inherited ones included.
    pub entries: Vec<Ace>,
    /// Audit and alarm entries.
    pub passthrough: Vec<Nfs4Ace>,
    /// Stored form of each decoded access entry.
    stored: Vec<(Ace, Nfs4Ace)>,
}

impl Nfs4Acl {
    /// Decodes the attribute value.
    pub fn from_bytes(data: &[u8]) -> Result<Self, WireError> {
        let mut cursor = Cursor { data, offset: 0 };
        let count = cursor.u32()? as usize;
        // Each ACE needs at least 16 bytes; cap the reservation accordingly.
        let mut aces = Vec::with_capacity(count.min(data.len() / 16));

        for _ in 0..count {
            let ace_type = cursor.u32()?;
            if ace_type > ACE4_SYSTEM_ALARM {
                return Err(WireError::AceType(ace_type));
            }
            let flags = cursor.u32()?;
            let mask = cursor.u32()?;
            let who = cursor.string()?;
            aces.push(Nfs4Ace {
                ace_type,
                flags,
                mask,
                who,
            });
        }

        let remaining = data.len() - cursor.offset;
        if remaining != 0 {
            return Err(WireError::Trailing(remaining));
        }
        Ok(Self { aces })
    }

    /// Encodes the attribute value.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(self.aces.len() as u32).to_be_bytes());

        for ace in &self.aces {
            data.extend_from_slice(&ace.ace_type.to_be_bytes());
            data.extend_from_slice(&ace.flags.to_be_bytes());
            data.extend_from_slice(&ace.mask.to_be_bytes());

            let who = ace.who.as_bytes();
            data.extend_from_slice(&(who.len() as u32).to_be_bytes());
            data.extend_from_slice(who);
            data.extend(std::iter::repeat_n(0u8, padding(who.len())));
        }

        data
    }

    /// Separates access entries from audit/alarm entries.
    pub fn split(&self) -> Result<SplitAcl, WireError> {
        let mut split = SplitAcl::default();
        for raw in &self.aces {
            match raw.to_ace()? {
                Some(ace) => {
                    split.stored.push((ace.clone(), raw.clone()));
                    split.entries.push(ace);
                }
                None => split.passthrough.push(raw.clone()),
            }
        }
        Ok(split)
    }

    /// Rebuilds an ACL from access entries and passthrough entries.
    ///
    /// An entry that matches a decoded one in everything but its rights
    /// reuses the stored form with the new mask.
    pub fn join(split: &SplitAcl) -> Self {
        let mut unused: Vec<&(Ace, Nfs4Ace)> = split.stored.iter().collect();
        let aces = split
            .entries
            .iter()
            .map(|ace| {
                let stored = unused
                    .iter()
                    .position(|(decoded, _)| differs_only_in_mask(decoded, ace))
                    .map(|index| unused.remove(index));
                match stored {
                    Some((_, raw)) => Nfs4Ace {
                        mask: ace.mask.as_raw(),
                        ..raw.clone()
                    },
                    None => Nfs4Ace::from_ace(ace),
                }
            })
            .chain(split.passthrough.iter().cloned())
            .collect();
        Self { aces }
    }
}

fn differs_only_in_mask(stored: &Ace, ace: &Ace) -> bool {
    stored.identity == ace.identity
        && stored.ace_type == ace.ace_type
        && stored.inheritance == ace.inheritance
        && stored.propagation == ace.propagation
        && stored.group == ace.group
        && stored.inherited == ace.inherited
}

const fn padding(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl Cursor<'_> {
    fn take(&mut self, len: usize) -> Result<&[u8], WireError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(WireError::Truncated(self.offset))?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn string(&mut self) -> Result<String, WireError> {
        let len = self.u32()? as usize;
        let text = std::str::from_utf8(self.take(len)?)
            .map_err(|_| WireError::Utf8)?
            .to_owned();
        self.take(padding(len))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Nfs4Acl {
        Nfs4Acl {
            aces: vec![
                Nfs4Ace {
                    ace_type: ACE4_ACCESS_DENIED,
                    flags: ACE4_IDENTIFIER_GROUP,
                    mask: 0x2,
                    who: "staff@DomainA".to_owned(),
                },
                Nfs4Ace {
                    ace_type: ACE4_ACCESS_ALLOWED,
                    flags: 0x3,
                    mask: 0x1F01FF,
                    who: "jdoe@DomainA".to_owned(),
                },
                Nfs4Ace {
                    ace_type: ACE4_SYSTEM_AUDIT,
                    flags: 0x20,
                    mask: 0x1,
                    who: "EVERYONE@".to_owned(),
                },
                Nfs4Ace {
                    ace_type: ACE4_ACCESS_ALLOWED,
                    flags: ACE4_INHERITED_ACE,
                    mask: 0x1,
                    who: "u".to_owned(),
                },
            ],
        }
    }

    #[test]
    fn empty_acl_is_a_bare_count() {
        let bytes = Nfs4Acl::default().to_bytes();
        assert_eq!(bytes, [0, 0, 0, 0]);
        assert_eq!(Nfs4Acl::from_bytes(&bytes).unwrap(), Nfs4Acl::default());
    }

    #[test]
    fn principals_are_padded_to_four_bytes() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(Nfs4Acl::from_bytes(&bytes).unwrap(), sample());
    }

    #[test]
    fn truncated_and_trailing_data_are_rejected() {
        let bytes = sample().to_bytes();
        assert!(matches!(
            Nfs4Acl::from_bytes(&bytes[..bytes.len() - 1]),
            Err(WireError::Truncated(_))
        ));

        let mut longer = bytes;
        longer.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(Nfs4Acl::from_bytes(&longer), Err(WireError::Trailing(4)));
    }

    #[test]
    fn unknown_ace_type_is_rejected() {
        let mut acl = sample();
        acl.aces[0].ace_type = 9;
        assert_eq!(
            Nfs4Acl::from_bytes(&acl.to_bytes()),
            Err(WireError::AceType(9))
        );
    }

    #[test]
    fn split_maps_flags_onto_aces() {
        let split = sample().split().unwrap();
        assert_eq!(split.entries.len(), 3);
        assert_eq!(split.passthrough.len(), 1);

        let deny = &split.entries[0];
        assert_eq!(deny.ace_type, AceType::Deny);
        assert!(deny.group);
        assert_eq!(deny.identity, Identity::new("DomainA", "staff"));

        let allow = &split.entries[1];
        assert_eq!(allow.mask, AccessMask::FULL_CONTROL);
        assert_eq!(
            allow.inheritance,
            InheritanceFlags::OBJECT_INHERIT | InheritanceFlags::CONTAINER_INHERIT
        );
        assert_eq!(allow.propagation, PropagationFlags::NONE);

        assert!(split.entries[2].inherited);
    }

    #[test]
    fn join_preserves_every_stored_bit() {
        let acl = sample();
        let rebuilt = Nfs4Acl::join(&acl.split().unwrap());
        // Audit entries move to the end; access entries keep their order.
        let mut expected = acl.aces.clone();
        let audit = expected.remove(2);
        expected.push(audit);
        assert_eq!(rebuilt.aces, expected);
    }

    #[test]
    fn untouched_entries_keep_their_stored_form() {
        let other = Nfs4Ace {
            ace_type: ACE4_ACCESS_ALLOWED,
            // 0x100 has no counterpart on Ace.
            flags: 0x100 | 0x1,
            mask: 0x1,
            who: "OTHER\\bob".to_owned(),
        };
        let acl = Nfs4Acl {
            aces: vec![other.clone()],
        };
        let mut split = Nfs4Acl::from_bytes(&acl.to_bytes()).unwrap().split().unwrap();
        crate::ace::insert_canonical(
            &mut split.entries,
            &Ace::allow(Identity::new("DomainB", "jdoe"), AccessMask::FULL_CONTROL),
        );

        let rebuilt = Nfs4Acl::join(&split);
        assert_eq!(rebuilt.aces.len(), 2);
        assert_eq!(rebuilt.aces[0], other);
        assert_eq!(rebuilt.aces[1].who, "jdoe@DomainB");
    }

    #[test]
    fn merged_rights_keep_the_stored_principal() {
        let acl = Nfs4Acl {
            aces: vec![Nfs4Ace {
                ace_type: ACE4_ACCESS_ALLOWED,
                flags: ACE4_IDENTIFIER_GROUP,
                mask: 0x1,
                who: "OTHER\\admins".to_owned(),
            }],
        };
        let mut split = acl.split().unwrap();
        let mut grant = Ace::allow(Identity::new("OTHER", "admins"), AccessMask::FULL_CONTROL);
        grant.group = true;
        assert!(crate::ace::insert_canonical(&mut split.entries, &grant));

        let rebuilt = Nfs4Acl::join(&split);
        assert_eq!(rebuilt.aces.len(), 1);
        assert_eq!(rebuilt.aces[0].who, "OTHER\\admins");
        assert_eq!(rebuilt.aces[0].flags, ACE4_IDENTIFIER_GROUP);
        assert_eq!(rebuilt.aces[0].mask, AccessMask::FULL_CONTROL.as_raw());
    }

    #[test]
    fn group_entries_carry_the_group_flag() {
        let mut admins = Ace::allow(Identity::new("DomainB", "FileAdmins"), AccessMask::FULL_CONTROL);
        admins.group = true;
        let split = SplitAcl {
            entries: vec![admins],
            ..SplitAcl::default()
        };
        let rebuilt = Nfs4Acl::join(&split);
        assert_eq!(rebuilt.aces[0].flags & ACE4_IDENTIFIER_GROUP, ACE4_IDENTIFIER_GROUP);
    }
}
