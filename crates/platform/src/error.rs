//! Errors raised by platform operations.

use std::io;

/// Error produced by privilege or signal operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The process has no way to gain the requested privileges.
    #[error("cannot elevate privileges: real uid {real_uid} is not root")]
    NotPermitted {
        /// Real uid of the process.
        real_uid: u32,
    },

    /// A system call failed.
    #[error("failed to {operation}: {source}")]
    Os {
        /// Operation being performed.
        operation: &'static str,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The elevator refused the request.
    #[error("privilege elevation refused: {0}")]
    Refused(String),

    /// Privilege elevation is not available on this platform.
    #[error("privilege elevation is not supported on this platform")]
    Unsupported,
}

impl PlatformError {
    /// Wraps an OS error raised during `operation`.
    pub fn os(operation: &'static str, source: impl Into<io::Error>) -> Self {
        Self::Os {
            operation,
            source: source.into(),
        }
    }
}
