use crate::error::WalkError;
use crate::walker::{EnumerationMode, Walker};
use std::path::PathBuf;

/// Configures a node enumeration rooted at a specific path.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: PathBuf,
    mode: EnumerationMode,
}

impl WalkBuilder {
    /// Creates a new builder that will enumerate the provided root path.
    ///
    /// The default mode is [`EnumerationMode::Recursive`].
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            mode: EnumerationMode::Recursive,
        }
    }

    /// Selects the traversal shape.
    #[must_use]
    pub const fn mode(mut self, mode: EnumerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builds a [`Walker`] using the configured options.
    ///
    /// Fails when the root cannot be inspected, when its listing cannot be
    /// read, or when a two-level enumeration is requested on a non-directory.
    pub fn build(self) -> Result<Walker, WalkError> {
        Walker::new(self.root, self.mode)
    }
}
