use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Whether a node is a regular file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Anything that is not a directory (symlinks are never yielded).
    File,
    /// A directory.
    Directory,
}

/// Position of a node relative to the enumeration root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// A node visited on its own before any descendant: the root in recursive
    /// mode, or a direct child of the root in two-level mode.
    TopLevel,
    /// Any node reached while descending below a top-level node.
    Descendant,
}

/// One step of an enumeration.
///
/// Nodes are transient: they describe what the walker saw at the moment it
/// inspected the path and are never cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FsNode {
    pub(crate) path: PathBuf,
    pub(crate) kind: NodeKind,
    pub(crate) tier: Tier,
    pub(crate) depth: usize,
    pub(crate) anchor: OsString,
}

impl FsNode {
    /// Creates a node by hand. Mostly useful for tests of consumers.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: NodeKind, tier: Tier, anchor: impl Into<OsString>) -> Self {
        Self {
            path: path.into(),
            kind,
            tier,
            depth: 0,
            anchor: anchor.into(),
        }
    }

    /// Absolute path of the node.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File or directory.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Top-level or descendant.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Depth relative to the root (the root itself is `0`).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` for directories.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    /// Name of the top-level folder this node belongs to.
    ///
    /// In two-level mode this is the per-user folder name: the node's own
    /// name for top-level nodes, the parent's name for its children. In
    /// recursive mode every node is anchored at the root's final component.
    #[must_use]
    pub fn anchor(&self) -> &OsStr {
        &self.anchor
    }
}
