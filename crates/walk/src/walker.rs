use crate::error::WalkError;
use crate::node::{FsNode, NodeKind, Tier};
use logging::trace_walk;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

/// Shape of the traversal performed by a [`Walker`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnumerationMode {
    /// Directories directly under the root and their direct children; nothing
    /// deeper. Files directly under the root are not yielded.
    TwoLevel,
    /// The root once, then every descendant at unbounded depth.
    #[default]
    Recursive,
}

impl EnumerationMode {
    /// Returns `true` when a directory found at `depth` should be opened.
    const fn descends_at(self, depth: usize) -> bool {
        match self {
            Self::TwoLevel => depth < 2,
            Self::Recursive => true,
        }
    }

    /// Tier assigned to a non-root node found at `depth`.
    const fn tier_at(self, depth: usize) -> Tier {
        match self {
            Self::TwoLevel if depth == 1 => Tier::TopLevel,
            _ => Tier::Descendant,
        }
    }
}

/// Depth-first, pre-order iterator over filesystem nodes.
pub struct Walker {
    mode: EnumerationMode,
    pending_root: Option<FsNode>,
    pending_error: Option<WalkError>,
    stack: Vec<DirectoryState>,
}

impl Walker {
    pub(crate) fn new(root: PathBuf, mode: EnumerationMode) -> Result<Self, WalkError> {
        let root = absolutize(root)?;
        trace_walk!("enumerating {:?} ({:?})", root, mode);

        let metadata = fs::symlink_metadata(&root)
            .map_err(|error| WalkError::root_metadata(root.clone(), error))?;
        let is_dir = metadata.file_type().is_dir();
        let root_name = root.file_name().map(OsString::from).unwrap_or_default();

        let mut walker = Self {
            mode,
            pending_root: None,
            pending_error: None,
            stack: Vec::new(),
        };

        match mode {
            EnumerationMode::TwoLevel => {
                if !is_dir {
                    return Err(WalkError::not_a_directory(root));
                }
                walker.stack.push(DirectoryState::new(root, 0, None)?);
            }
            EnumerationMode::Recursive => {
                let kind = if is_dir {
                    NodeKind::Directory
                } else {
                    NodeKind::File
                };
                if is_dir {
                    walker
                        .stack
                        .push(DirectoryState::new(root.clone(), 0, Some(root_name.clone()))?);
                }
                walker.pending_root = Some(FsNode {
                    path: root,
                    kind,
                    tier: Tier::TopLevel,
                    depth: 0,
                    anchor: root_name,
                });
            }
        }

        Ok(walker)
    }

    fn prepare_node(
        &mut self,
        full_path: PathBuf,
        name: OsString,
        depth: usize,
        anchor: Option<OsString>,
    ) -> Result<Option<FsNode>, WalkError> {
        let metadata = fs::symlink_metadata(&full_path)
            .map_err(|error| WalkError::metadata(full_path.clone(), error))?;
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            trace_walk!("skipping symlink {:?}", full_path);
            return Ok(None);
        }
        if self.mode == EnumerationMode::TwoLevel && depth == 1 && !file_type.is_dir() {
            trace_walk!("skipping {:?}: not a folder", full_path);
            return Ok(None);
        }

        let anchor = anchor.unwrap_or(name);
        let kind = if file_type.is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        };

        if kind == NodeKind::Directory && self.mode.descends_at(depth) {
            match DirectoryState::new(full_path.clone(), depth, Some(anchor.clone())) {
                Ok(state) => self.stack.push(state),
                // Report the node first; the listing failure follows it.
                Err(error) => self.pending_error = Some(error),
            }
        }

        Ok(Some(FsNode {
            path: full_path,
            kind,
            tier: self.mode.tier_at(depth),
            depth,
            anchor,
        }))
    }
}

impl Iterator for Walker {
    type Item = Result<FsNode, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.pending_root.take() {
            return Some(Ok(root));
        }

        if let Some(error) = self.pending_error.take() {
            return Some(Err(error));
        }

        loop {
            let (full_path, name, depth, anchor) = {
                let state = self.stack.last_mut()?;

                match state.next_name() {
                    Some(Ok(name)) => (
                        state.fs_path.join(&name),
                        name,
                        state.depth + 1,
                        state.anchor.clone(),
                    ),
                    Some(Err(error)) => return Some(Err(error)),
                    None => {
                        self.stack.pop();
                        continue;
                    }
                }
            };

            match self.prepare_node(full_path, name, depth, anchor) {
                Ok(Some(node)) => return Some(Ok(node)),
                Ok(None) => {}
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

#[derive(Debug)]
struct DirectoryState {
    fs_path: PathBuf,
    entries: Vec<Result<OsString, WalkError>>,
    index: usize,
    depth: usize,
    anchor: Option<OsString>,
}

impl DirectoryState {
    fn new(fs_path: PathBuf, depth: usize, anchor: Option<OsString>) -> Result<Self, WalkError> {
        let read_dir =
            fs::read_dir(&fs_path).map_err(|error| WalkError::read_dir(fs_path.clone(), error))?;

        let mut names = Vec::new();
        let mut failures = Vec::new();
        for entry in read_dir {
            match entry {
                Ok(entry) => names.push(entry.file_name()),
                Err(error) => failures.push(WalkError::read_dir_entry(fs_path.clone(), error)),
            }
        }
        names.sort();

        trace_walk!("found {} entries in {:?}", names.len(), fs_path);

        let entries = failures
            .into_iter()
            .map(Err)
            .chain(names.into_iter().map(Ok))
            .collect();

        Ok(Self {
            fs_path,
            entries,
            index: 0,
            depth,
            anchor,
        })
    }

    fn next_name(&mut self) -> Option<Result<OsString, WalkError>> {
        if self.index < self.entries.len() {
            let slot = std::mem::replace(&mut self.entries[self.index], Ok(OsString::new()));
            self.index += 1;
            Some(slot)
        } else {
            None
        }
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf, WalkError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = env::current_dir().map_err(WalkError::current_dir)?;
        Ok(cwd.join(path))
    }
}
