//! Fatal errors of a cutover run.
//!
//! Per-node problems never surface here; they are reported through
//! [`NodeFailure`](crate::outcome::NodeFailure) values instead.

use std::path::PathBuf;

use metadata::MetadataError;
use walk::WalkError;

use crate::context::ContextError;
use crate::drivers::Mode;
use crate::exit_code::{ExitCode, HasExitCode};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort a run before or instead of traversal.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The run options are invalid.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The mode needs a new domain and none was given.
    #[error("{mode} requires a new domain")]
    MissingNewDomain {
        /// The selected mode.
        mode: Mode,
    },

    /// The security descriptor provider could not be opened.
    #[error("security descriptor provider unavailable for '{}': {source}", root.display())]
    ProviderUnavailable {
        /// Root the provider was opened for.
        root: PathBuf,
        /// Why opening failed.
        #[source]
        source: MetadataError,
    },

    /// The enumeration root could not be inspected or listed.
    #[error(transparent)]
    Enumeration(#[from] WalkError),
}

impl EngineError {
    /// Wraps a provider error raised while opening the provider for `root`.
    pub fn provider_unavailable(root: impl Into<PathBuf>, source: MetadataError) -> Self {
        Self::ProviderUnavailable {
            root: root.into(),
            source,
        }
    }
}

impl HasExitCode for EngineError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Context(_) | Self::MissingNewDomain { .. } => ExitCode::Syntax,
            Self::ProviderUnavailable { .. } => ExitCode::ProviderUnavailable,
            Self::Enumeration(_) => ExitCode::FileSelect,
        }
    }
}
