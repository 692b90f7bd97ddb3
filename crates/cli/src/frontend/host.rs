//! Process-level services the front-end depends on.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use logging::LayerSink;
use metadata::{MetadataError, SecurityProvider};
use platform::{PlatformError, PrivilegeElevator};

/// Everything a run needs from its surroundings.
///
/// [`SystemHost`] talks to the real system. Tests implement this trait to
/// run the front-end against an in-memory descriptor table.
pub trait Host {
    /// Opens the security descriptor provider for the tree at `root`.
    fn open_provider(&self, root: &Path) -> Result<Arc<dyn SecurityProvider>, MetadataError>;

    /// Returns the privilege elevator used for escalation.
    fn elevator(&self) -> Box<dyn PrivilegeElevator>;

    /// Reads an environment variable.
    fn var(&self, name: &str) -> Option<String>;

    /// Arranges for `flag` to be raised when the process is asked to stop.
    fn watch_termination(&self, flag: &Arc<AtomicBool>) -> Result<(), PlatformError>;

    /// Destination of log events.
    fn log_sink(&self) -> LayerSink {
        LayerSink::Stderr
    }
}

/// [`Host`] backed by the running system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    #[cfg(all(target_os = "linux", feature = "nfs4"))]
    fn open_provider(&self, root: &Path) -> Result<Arc<dyn SecurityProvider>, MetadataError> {
        Ok(Arc::new(metadata::Nfs4Provider::open(root)?))
    }

    #[cfg(not(all(target_os = "linux", feature = "nfs4")))]
    fn open_provider(&self, root: &Path) -> Result<Arc<dyn SecurityProvider>, MetadataError> {
        Err(MetadataError::Unsupported {
            operation: "open a security descriptor provider for",
            path: root.to_path_buf(),
        })
    }

    #[cfg(unix)]
    fn elevator(&self) -> Box<dyn PrivilegeElevator> {
        Box::new(platform::EffectiveUidElevator::new())
    }

    #[cfg(not(unix))]
    fn elevator(&self) -> Box<dyn PrivilegeElevator> {
        Box::new(platform::UnsupportedElevator)
    }

    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }

    fn watch_termination(&self, flag: &Arc<AtomicBool>) -> Result<(), PlatformError> {
        platform::install_termination_flag(flag)
    }
}
