//! crates/metadata/src/memory.rs
//!
//! In-process descriptor table.
//!
//! [`MemoryProvider`] keeps an owner and an ordered entry list per path and
//! enforces a simple access model: a node can be *locked* against a
//! principal, after which every mutation fails with
//! [`MetadataError::AccessDenied`] unless the node carries an explicit
//! full-control allow entry for that principal or the provider is running
//! privileged. The privileged flag is shared through
//! [`MemoryProvider::privileged_handle`] so an elevator can toggle it.
//!
//! Faults can be injected per path and operation, and every call is
//! recorded for later inspection.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ace::{AccessMask, AceType, insert_canonical, remove_explicit};
use crate::resolver::{Principal, PrincipalResolver, StaticResolver, owner_uid, resolved_ace};
use crate::{Ace, Identity, MetadataError, SecurityProvider};

/// Provider operations, used for fault injection and call accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`SecurityProvider::explicit_aces`].
    ReadAces,
    /// [`SecurityProvider::set_owner`].
    SetOwner,
    /// [`SecurityProvider::add_ace`].
    AddAce,
    /// [`SecurityProvider::remove_ace`].
    RemoveAce,
    /// [`SecurityProvider::orphaned_aces`].
    ReadOrphans,
}

/// One recorded provider call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderCall {
    /// Operation invoked.
    pub operation: Operation,
    /// Node it targeted.
    pub path: PathBuf,
    /// Identity argument, for mutations.
    pub identity: Option<Identity>,
    /// Whether the call succeeded.
    pub succeeded: bool,
}

#[derive(Clone, Debug, Default)]
struct Descriptor {
    owner: Option<Identity>,
    entries: Vec<Ace>,
    locked_for: Option<Identity>,
}

#[derive(Clone, Copy, Debug)]
struct Fault {
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<PathBuf, Descriptor>,
    resolver: StaticResolver,
    faults: HashMap<(PathBuf, Operation), Fault>,
    calls: Vec<ProviderCall>,
    next_uid: u32,
    writes: usize,
}

/// Descriptor table held in memory.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    state: Mutex<State>,
    privileged: Arc<AtomicBool>,
}

impl MemoryProvider {
    /// Creates an empty table with no known principals.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a user principal.
    pub fn add_principal(&self, identity: &Identity) -> &Self {
        let mut state = self.state();
        state.next_uid += 1;
        let uid = 10_000 + state.next_uid;
        state.resolver.insert(identity, Principal::User(uid));
        drop(state);
        self
    }

    /// Registers a group principal.
    pub fn add_group(&self, identity: &Identity) -> &Self {
        let mut state = self.state();
        state.next_uid += 1;
        let gid = 20_000 + state.next_uid;
        state.resolver.insert(identity, Principal::Group(gid));
        drop(state);
        self
    }

    /// Forgets a principal, turning its entries into orphans.
    pub fn remove_principal(&self, identity: &Identity) {
        self.state().resolver.remove(identity);
    }

    /// Adds a node with an empty descriptor if it does not exist yet.
    pub fn add_node(&self, path: impl Into<PathBuf>) -> &Self {
        self.state().nodes.entry(path.into()).or_default();
        self
    }

    /// Appends `ace` verbatim to the node's entry list, creating the node.
    ///
    /// No ordering or resolution rules apply, so fixtures can hold inherited
    /// and orphaned entries.
    pub fn push_ace(&self, path: impl Into<PathBuf>, ace: Ace) -> &Self {
        self.state()
            .nodes
            .entry(path.into())
            .or_default()
            .entries
            .push(ace);
        self
    }

    /// Sets the owner without any checks, creating the node.
    pub fn put_owner(&self, path: impl Into<PathBuf>, owner: Identity) -> &Self {
        self.state().nodes.entry(path.into()).or_default().owner = Some(owner);
        self
    }

    /// Locks the node so that only `principal` (via a full-control entry) or
    /// a privileged caller may modify it.
    pub fn lock(&self, path: impl Into<PathBuf>, principal: Identity) -> &Self {
        self.state().nodes.entry(path.into()).or_default().locked_for = Some(principal);
        self
    }

    /// Makes every call of `operation` on `path` fail with access denied.
    pub fn fail_always(&self, path: impl Into<PathBuf>, operation: Operation) -> &Self {
        self.state()
            .faults
            .insert((path.into(), operation), Fault { remaining: None });
        self
    }

    /// Makes the next `times` calls of `operation` on `path` fail with access
    /// denied.
    pub fn fail_times(&self, path: impl Into<PathBuf>, operation: Operation, times: usize) -> &Self {
        self.state().faults.insert(
            (path.into(), operation),
            Fault {
                remaining: Some(times),
            },
        );
        self
    }

    /// Shared flag that bypasses locks while set.
    pub fn privileged_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.privileged)
    }

    /// Full entry list of `path`, inherited entries included.
    pub fn entries(&self, path: &Path) -> Vec<Ace> {
        self.state()
            .nodes
            .get(path)
            .map(|node| node.entries.clone())
            .unwrap_or_default()
    }

    /// Current owner of `path`.
    pub fn owner(&self, path: &Path) -> Option<Identity> {
        self.state().nodes.get(path).and_then(|node| node.owner.clone())
    }

    /// Every call recorded so far.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state().calls.clone()
    }

    /// Number of recorded calls of `operation` on `path`.
    pub fn call_count(&self, path: &Path, operation: Operation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation == operation && call.path == path)
            .count()
    }

    /// Number of descriptor writes that changed something, across all nodes.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn call<T>(
        &self,
        operation: Operation,
        path: &Path,
        identity: Option<&Identity>,
        body: impl FnOnce(&mut State, bool) -> Result<T, MetadataError>,
    ) -> Result<T, MetadataError> {
        let privileged = self.privileged.load(Ordering::SeqCst);
        let mut state = self.state();

        let result = match inject_fault(&mut state, path, operation) {
            Some(error) => Err(error),
            None => body(&mut state, privileged),
        };

        state.calls.push(ProviderCall {
            operation,
            path: path.to_path_buf(),
            identity: identity.cloned(),
            succeeded: result.is_ok(),
        });
        result
    }
}

fn label(operation: Operation) -> &'static str {
    match operation {
        Operation::ReadAces => "read ACL of",
        Operation::SetOwner => "set owner of",
        Operation::AddAce => "add ACE to",
        Operation::RemoveAce => "remove ACE from",
        Operation::ReadOrphans => "read ACL of",
    }
}

fn inject_fault(state: &mut State, path: &Path, operation: Operation) -> Option<MetadataError> {
    let key = (path.to_path_buf(), operation);
    let fault = state.faults.get_mut(&key)?;
    match &mut fault.remaining {
        None => {}
        Some(0) => return None,
        Some(remaining) => *remaining -= 1,
    }
    Some(MetadataError::access_denied(label(operation), path))
}

fn node<'a>(
    state: &'a mut State,
    path: &Path,
    operation: Operation,
) -> Result<&'a mut Descriptor, MetadataError> {
    state.nodes.get_mut(path).ok_or_else(|| {
        MetadataError::io(
            label(operation),
            path,
            io::Error::from(io::ErrorKind::NotFound),
        )
    })
}

fn check_write(
    descriptor: &Descriptor,
    privileged: bool,
    path: &Path,
    operation: Operation,
) -> Result<(), MetadataError> {
    let Some(principal) = &descriptor.locked_for else {
        return Ok(());
    };
    let granted = descriptor.entries.iter().any(|entry| {
        entry.ace_type == AceType::Allow
            && entry.identity.same_principal(principal)
            && entry.mask.contains(AccessMask::FULL_CONTROL)
    });
    if privileged || granted {
        Ok(())
    } else {
        Err(MetadataError::access_denied(label(operation), path))
    }
}

impl SecurityProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn explicit_aces(&self, path: &Path) -> Result<Vec<Ace>, MetadataError> {
        self.call(Operation::ReadAces, path, None, |state, _| {
            let descriptor = node(state, path, Operation::ReadAces)?;
            Ok(descriptor
                .entries
                .iter()
                .filter(|ace| !ace.inherited)
                .cloned()
                .collect())
        })
    }

    fn set_owner(&self, path: &Path, identity: &Identity) -> Result<(), MetadataError> {
        self.call(Operation::SetOwner, path, Some(identity), |state, privileged| {
            owner_uid(&state.resolver, identity)?;
            let descriptor = node(state, path, Operation::SetOwner)?;
            check_write(descriptor, privileged, path, Operation::SetOwner)?;
            descriptor.owner = Some(identity.clone());
            state.writes += 1;
            Ok(())
        })
    }

    fn add_ace(&self, path: &Path, ace: &Ace) -> Result<(), MetadataError> {
        self.call(
            Operation::AddAce,
            path,
            Some(&ace.identity),
            |state, privileged| {
                let ace = resolved_ace(&state.resolver, ace)?;
                let descriptor = node(state, path, Operation::AddAce)?;
                check_write(descriptor, privileged, path, Operation::AddAce)?;
                let changed = insert_canonical(&mut descriptor.entries, &ace);
                state.writes += usize::from(changed);
                Ok(())
            },
        )
    }

    fn remove_ace(&self, path: &Path, identity: &Identity) -> Result<usize, MetadataError> {
        self.call(
            Operation::RemoveAce,
            path,
            Some(identity),
            |state, privileged| {
                let descriptor = node(state, path, Operation::RemoveAce)?;
                let matching = descriptor
                    .entries
                    .iter()
                    .any(|entry| !entry.inherited && entry.identity.same_principal(identity));
                if !matching {
                    return Ok(0);
                }
                check_write(descriptor, privileged, path, Operation::RemoveAce)?;
                let removed = remove_explicit(&mut descriptor.entries, identity);
                state.writes += 1;
                Ok(removed)
            },
        )
    }

    fn orphaned_aces(&self, path: &Path) -> Result<Vec<Ace>, MetadataError> {
        self.call(Operation::ReadOrphans, path, None, |state, _| {
            let entries = node(state, path, Operation::ReadOrphans)?.entries.clone();
            Ok(entries
                .into_iter()
                .filter(|ace| !ace.inherited && !state.resolver.resolves(&ace.identity))
                .collect())
        })
    }
}
