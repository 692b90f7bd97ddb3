use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logging::LayerSink;
use metadata::{Identity, MemoryProvider, MetadataError, SecurityProvider};
use platform::{FlagElevator, PlatformError, PrivilegeElevator};
use test_support::TestDir;

use crate::frontend::{Host, run_with_host};

/// Host backed by an in-memory descriptor table.
pub(crate) struct MemoryHost {
    pub(crate) provider: Arc<MemoryProvider>,
    vars: HashMap<String, String>,
    unavailable: bool,
    interrupted: bool,
}

impl MemoryHost {
    pub(crate) fn new() -> Self {
        Self {
            provider: Arc::new(MemoryProvider::new()),
            vars: HashMap::new(),
            unavailable: false,
            interrupted: false,
        }
    }

    pub(crate) fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Every provider open fails.
    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// The termination flag is raised as soon as it is watched.
    pub(crate) fn interrupted(mut self) -> Self {
        self.interrupted = true;
        self
    }
}

impl Host for MemoryHost {
    fn open_provider(&self, root: &Path) -> Result<Arc<dyn SecurityProvider>, MetadataError> {
        if self.unavailable {
            return Err(MetadataError::Unsupported {
                operation: "read NFSv4 ACL",
                path: root.to_path_buf(),
            });
        }
        Ok(self.provider.clone())
    }

    fn elevator(&self) -> Box<dyn PrivilegeElevator> {
        Box::new(FlagElevator::new(self.provider.privileged_handle()))
    }

    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn watch_termination(&self, flag: &Arc<AtomicBool>) -> Result<(), PlatformError> {
        if self.interrupted {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn log_sink(&self) -> LayerSink {
        LayerSink::Capture
    }
}

pub(crate) fn id(text: &str) -> Identity {
    Identity::parse(text).expect("identity")
}

/// Creates directories and files under a fresh temp dir and registers every
/// created path (and the root) with the host's provider.
pub(crate) fn tree(host: &MemoryHost, dirs: &[&str], files: &[&str]) -> TestDir {
    let dir = TestDir::new().expect("temp dir");
    host.provider.add_node(dir.path());
    for relative in dirs {
        let path = dir.mkdir(relative).expect("mkdir");
        host.provider.add_node(path);
    }
    for relative in files {
        let path = dir.write_file(relative, b"data").expect("write");
        host.provider.add_node(path);
    }
    dir
}

/// Runs the front-end and returns the status with captured output.
pub(crate) fn run_with_args<I, T>(host: &MemoryHost, args: I) -> (i32, String, String)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run_with_host(args, &mut stdout, &mut stderr, host);
    (
        code,
        String::from_utf8(stdout).expect("utf-8 stdout"),
        String::from_utf8(stderr).expect("utf-8 stderr"),
    )
}

pub(crate) fn root_arg(dir: &TestDir) -> OsString {
    dir.path().as_os_str().to_owned()
}
