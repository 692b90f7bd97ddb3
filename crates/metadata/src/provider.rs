//! The security descriptor accessor seam.

use std::path::Path;
use std::sync::Arc;

use crate::{Ace, Identity, MetadataError};

/// Reads and writes the owner and explicit entries of one node at a time.
///
/// Every method acts on the live descriptor. Multi-step sequences are not
/// transactional; callers re-read after each mutation.
pub trait SecurityProvider: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Explicit entries of `path`, in stored order. Inherited entries are
    /// never returned.
    fn explicit_aces(&self, path: &Path) -> Result<Vec<Ace>, MetadataError>;

    /// Makes `identity` the owner of `path`.
    fn set_owner(&self, path: &Path, identity: &Identity) -> Result<(), MetadataError>;

    /// Adds `ace` as an explicit entry in canonical position, merging rights
    /// into an existing entry for the same principal, type and flags.
    fn add_ace(&self, path: &Path, ace: &Ace) -> Result<(), MetadataError>;

    /// Removes every explicit entry naming `identity` and returns how many
    /// were removed. Nothing is written when none match.
    fn remove_ace(&self, path: &Path, identity: &Identity) -> Result<usize, MetadataError>;

    /// Explicit entries whose identity resolves to no principal.
    fn orphaned_aces(&self, path: &Path) -> Result<Vec<Ace>, MetadataError>;

    /// Replaces every explicit entry naming `identity` with `entries`.
    ///
    /// The default removes, then adds each entry back in canonical position.
    fn replace_aces(
        &self,
        path: &Path,
        identity: &Identity,
        entries: &[Ace],
    ) -> Result<(), MetadataError> {
        self.remove_ace(path, identity)?;
        entries.iter().try_for_each(|ace| self.add_ace(path, ace))
    }
}

impl<P: SecurityProvider + ?Sized> SecurityProvider for Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn explicit_aces(&self, path: &Path) -> Result<Vec<Ace>, MetadataError> {
        (**self).explicit_aces(path)
    }

    fn set_owner(&self, path: &Path, identity: &Identity) -> Result<(), MetadataError> {
        (**self).set_owner(path, identity)
    }

    fn add_ace(&self, path: &Path, ace: &Ace) -> Result<(), MetadataError> {
        (**self).add_ace(path, ace)
    }

    fn remove_ace(&self, path: &Path, identity: &Identity) -> Result<usize, MetadataError> {
        (**self).remove_ace(path, identity)
    }

    fn orphaned_aces(&self, path: &Path) -> Result<Vec<Ace>, MetadataError> {
        (**self).orphaned_aces(path)
    }

    fn replace_aces(
        &self,
        path: &Path,
        identity: &Identity,
        entries: &[Ace],
    ) -> Result<(), MetadataError> {
        (**self).replace_aces(path, identity, entries)
    }
}
