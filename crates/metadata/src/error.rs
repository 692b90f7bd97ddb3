//! Error type for security descriptor operations.

use std::io;
use std::path::{Path, PathBuf};

use crate::Identity;

/// Error produced when reading or writing a security descriptor fails.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The caller lacks the rights needed for the operation.
    #[error("access denied: cannot {operation} '{}'", path.display())]
    AccessDenied {
        /// Operation being performed.
        operation: &'static str,
        /// Node the operation targeted.
        path: PathBuf,
    },

    /// The identity does not resolve to any principal.
    #[error("identity '{identity}' does not resolve to a principal")]
    UnresolvedIdentity {
        /// The unresolvable identity.
        identity: Identity,
    },

    /// The identity resolves, but to a principal that cannot own files.
    #[error("identity '{identity}' is not a user and cannot own files")]
    NotAUser {
        /// The group or special identity.
        identity: Identity,
    },

    /// Any other I/O failure.
    #[error("failed to {operation} '{}': {source}", path.display())]
    Io {
        /// Operation being performed.
        operation: &'static str,
        /// Node the operation targeted.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The stored descriptor could not be decoded.
    #[error("malformed ACL on '{}': {reason}", path.display())]
    Parse {
        /// Node whose descriptor is malformed.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The filesystem does not support the operation.
    #[error("cannot {operation} '{}': not supported by this filesystem", path.display())]
    Unsupported {
        /// Operation being performed.
        operation: &'static str,
        /// Node the operation targeted.
        path: PathBuf,
    },
}

impl MetadataError {
    /// Classifies an I/O error raised while performing `operation` on `path`.
    pub fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::PermissionDenied {
            return Self::AccessDenied { operation, path };
        }
        if source.kind() == io::ErrorKind::Unsupported
            || source.raw_os_error() == Some(libc::EOPNOTSUPP)
            || source.raw_os_error() == Some(libc::ENOTSUP)
        {
            return Self::Unsupported { operation, path };
        }
        Self::Io {
            operation,
            path,
            source,
        }
    }

    /// Creates an [`MetadataError::AccessDenied`].
    pub fn access_denied(operation: &'static str, path: &Path) -> Self {
        Self::AccessDenied {
            operation,
            path: path.to_path_buf(),
        }
    }

    /// Creates an [`MetadataError::UnresolvedIdentity`].
    pub fn unresolved(identity: &Identity) -> Self {
        Self::UnresolvedIdentity {
            identity: identity.clone(),
        }
    }

    /// Returns `true` when the failure lies with the identity rather than the
    /// node, so no privilege on the node can cure it.
    pub const fn is_identity_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedIdentity { .. } | Self::NotAUser { .. }
        )
    }

    /// Returns `true` for [`MetadataError::AccessDenied`].
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Returns `true` for [`MetadataError::UnresolvedIdentity`].
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedIdentity { .. })
    }

    /// Path involved in the failure, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::AccessDenied { path, .. }
            | Self::Io { path, .. }
            | Self::Parse { path, .. }
            | Self::Unsupported { path, .. } => Some(path),
            Self::UnresolvedIdentity { .. } | Self::NotAUser { .. } => None,
        }
    }
}
