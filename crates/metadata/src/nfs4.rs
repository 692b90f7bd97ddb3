//! crates/metadata/src/nfs4.rs
//!
//! [`SecurityProvider`] over NFSv4 ACLs on Linux.
//!
//! Entries are read from and written to the `system.nfs4_acl` extended
//! attribute. Ownership changes resolve the identity to a uid and `chown`
//! the node without following symlinks.

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use logging::trace_acl;
use logging::trace_own;
use rustix::fs::{AtFlags, CWD, chownat};

use crate::ace::{insert_canonical, remove_explicit};
use crate::nfsv4_acl::{NFS4_ACL_XATTR, Nfs4Acl, SplitAcl};
use crate::ownership::uid_from_raw;
use crate::resolver::{NssResolver, PrincipalResolver, owner_uid, resolved_ace};
use crate::{Ace, Identity, MetadataError, SecurityProvider};

/// NFSv4 ACL provider.
#[derive(Debug)]
pub struct Nfs4Provider<R = NssResolver> {
    resolver: R,
}

impl Nfs4Provider<NssResolver> {
    /// Opens the provider for the tree rooted at `root`, resolving principals
    /// through the system name service.
    pub fn open(root: &Path) -> Result<Self, MetadataError> {
        Self::with_resolver(root, NssResolver)
    }
}

impl<R: PrincipalResolver> Nfs4Provider<R> {
    /// Opens the provider with a custom resolver.
    ///
    /// Fails with [`MetadataError::Unsupported`] when `root` does not expose
    /// an NFSv4 ACL.
    pub fn with_resolver(root: &Path, resolver: R) -> Result<Self, MetadataError> {
        match xattr::get(root, OsStr::new(NFS4_ACL_XATTR)) {
            Ok(Some(_)) => Ok(Self { resolver }),
            Ok(None) => Err(MetadataError::Unsupported {
                operation: "read NFSv4 ACL",
                path: root.to_path_buf(),
            }),
            Err(error) if error.raw_os_error() == Some(libc::ENODATA) => {
                Err(MetadataError::Unsupported {
                    operation: "read NFSv4 ACL",
                    path: root.to_path_buf(),
                })
            }
            Err(error) => Err(MetadataError::io("read NFSv4 ACL", root, error)),
        }
    }

    fn read(&self, path: &Path) -> Result<SplitAcl, MetadataError> {
        let data = xattr::get(path, OsStr::new(NFS4_ACL_XATTR))
            .map_err(|error| MetadataError::io("read NFSv4 ACL", path, error))?
            .ok_or_else(|| {
                MetadataError::io(
                    "read NFSv4 ACL",
                    path,
                    io::Error::from_raw_os_error(libc::ENODATA),
                )
            })?;

        let split = Nfs4Acl::from_bytes(&data)
            .and_then(|acl| acl.split())
            .map_err(|error| MetadataError::Parse {
                path: path.to_path_buf(),
                reason: error.to_string(),
            })?;
        trace_acl!(
            "read {} entries ({} passthrough) from {:?}",
            split.entries.len(),
            split.passthrough.len(),
            path
        );
        Ok(split)
    }

    fn write(&self, path: &Path, split: &SplitAcl) -> Result<(), MetadataError> {
        let data = Nfs4Acl::join(split).to_bytes();
        trace_acl!("writing {} entries to {:?}", split.entries.len(), path);
        xattr::set(path, OsStr::new(NFS4_ACL_XATTR), &data)
            .map_err(|error| MetadataError::io("write NFSv4 ACL", path, error))
    }
}

impl<R: PrincipalResolver> SecurityProvider for Nfs4Provider<R> {
    fn name(&self) -> &'static str {
        "nfs4"
    }

    fn explicit_aces(&self, path: &Path) -> Result<Vec<Ace>, MetadataError> {
        let split = self.read(path)?;
        Ok(split
            .entries
            .into_iter()
            .filter(|ace| !ace.inherited)
            .collect())
    }

    fn set_owner(&self, path: &Path, identity: &Identity) -> Result<(), MetadataError> {
        let uid = owner_uid(&self.resolver, identity)?;
        trace_own!("chown {:?} to {} (uid {})", path, identity, uid);
        chownat(
            CWD,
            path,
            Some(uid_from_raw(uid)),
            None,
            AtFlags::SYMLINK_NOFOLLOW,
        )
        .map_err(|error| MetadataError::io("set owner of", path, io::Error::from(error)))
    }

    fn add_ace(&self, path: &Path, ace: &Ace) -> Result<(), MetadataError> {
        let ace = resolved_ace(&self.resolver, ace)?;
        let mut split = self.read(path)?;
        if insert_canonical(&mut split.entries, &ace) {
            self.write(path, &split)?;
        }
        Ok(())
    }

    fn remove_ace(&self, path: &Path, identity: &Identity) -> Result<usize, MetadataError> {
        let mut split = self.read(path)?;
        let removed = remove_explicit(&mut split.entries, identity);
        if removed > 0 {
            self.write(path, &split)?;
        }
        Ok(removed)
    }

    fn orphaned_aces(&self, path: &Path) -> Result<Vec<Ace>, MetadataError> {
        Ok(self
            .explicit_aces(path)?
            .into_iter()
            .filter(|ace| !self.resolver.resolves(&ace.identity))
            .collect())
    }

    fn replace_aces(
        &self,
        path: &Path,
        identity: &Identity,
        entries: &[Ace],
    ) -> Result<(), MetadataError> {
        let mut split = self.read(path)?;
        let mut changed = remove_explicit(&mut split.entries, identity) > 0;
        for ace in entries {
            changed |= insert_canonical(&mut split.entries, ace);
        }
        if changed {
            self.write(path, &split)?;
        }
        Ok(())
    }
}
