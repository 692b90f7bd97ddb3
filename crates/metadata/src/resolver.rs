//! crates/metadata/src/resolver.rs
//!
//! Mapping identities onto local principals.

use std::collections::HashMap;

use crate::{Ace, Identity, MetadataError};

/// A principal an identity resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Principal {
    /// A user account.
    User(u32),
    /// A group.
    Group(u32),
    /// `OWNER@`, `GROUP@` or `EVERYONE@`.
    Special,
}

/// Resolves identities to principals.
pub trait PrincipalResolver: Send + Sync {
    /// Returns the principal `identity` names, or `None` when it is orphaned.
    fn resolve(&self, identity: &Identity) -> Option<Principal>;

    /// Returns `true` when `identity` names some principal.
    fn resolves(&self, identity: &Identity) -> bool {
        self.resolve(identity).is_some()
    }
}

impl<R: PrincipalResolver + ?Sized> PrincipalResolver for &R {
    fn resolve(&self, identity: &Identity) -> Option<Principal> {
        (**self).resolve(identity)
    }
}

/// Returns `ace` with its group marker taken from the principal it names.
pub(crate) fn resolved_ace<R>(resolver: &R, ace: &Ace) -> Result<Ace, MetadataError>
where
    R: PrincipalResolver + ?Sized,
{
    let mut ace = ace.clone();
    match resolver.resolve(&ace.identity) {
        None => return Err(MetadataError::unresolved(&ace.identity)),
        Some(Principal::User(_)) => ace.group = false,
        Some(Principal::Group(_)) => ace.group = true,
        Some(Principal::Special) => {}
    }
    Ok(ace)
}

/// Returns the uid of the user `identity` names.
pub(crate) fn owner_uid<R>(resolver: &R, identity: &Identity) -> Result<u32, MetadataError>
where
    R: PrincipalResolver + ?Sized,
{
    match resolver.resolve(identity) {
        Some(Principal::User(uid)) => Ok(uid),
        Some(Principal::Group(_) | Principal::Special) => Err(MetadataError::NotAUser {
            identity: identity.clone(),
        }),
        None => Err(MetadataError::unresolved(identity)),
    }
}

/// Fixed directory of principals keyed by identity.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    principals: HashMap<String, Principal>,
}

impl StaticResolver {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `identity` as `principal`.
    pub fn insert(&mut self, identity: &Identity, principal: Principal) {
        self.principals.insert(identity.lookup_key(), principal);
    }

    /// Forgets `identity`, turning its entries into orphans.
    pub fn remove(&mut self, identity: &Identity) {
        self.principals.remove(&identity.lookup_key());
    }
}

impl PrincipalResolver for StaticResolver {
    fn resolve(&self, identity: &Identity) -> Option<Principal> {
        if identity.is_special() {
            return Some(Principal::Special);
        }
        self.principals.get(&identity.lookup_key()).copied()
    }
}

/// Resolver backed by the system name service (`getpwnam` / `getgrnam`).
///
/// Qualified identities are looked up as `DOMAIN\name`, then `name@domain`,
/// then the bare `name`, matching the forms winbind and sssd expose. Bare
/// security identifiers never resolve.
#[cfg(unix)]
#[derive(Clone, Copy, Debug, Default)]
pub struct NssResolver;

#[cfg(unix)]
impl NssResolver {
    fn candidates(identity: &Identity) -> Vec<String> {
        match identity.domain() {
            Some(domain) => vec![
                format!("{domain}\\{}", identity.name()),
                format!("{}@{domain}", identity.name()),
                identity.name().to_owned(),
            ],
            None => vec![identity.name().to_owned()],
        }
    }
}

#[cfg(unix)]
impl PrincipalResolver for NssResolver {
    fn resolve(&self, identity: &Identity) -> Option<Principal> {
        use nix::unistd::{Group, User};

        if identity.is_special() {
            return Some(Principal::Special);
        }
        if identity.is_sid() {
            return None;
        }

        for candidate in Self::candidates(identity) {
            if let Ok(Some(user)) = User::from_name(&candidate) {
                return Some(Principal::User(user.uid.as_raw()));
            }
            if let Ok(Some(group)) = Group::from_name(&candidate) {
                return Some(Principal::Group(group.gid.as_raw()));
            }
        }
        None
    }
}
