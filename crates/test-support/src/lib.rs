#![deny(unsafe_code)]

//! Shared test utilities for the acl-cutover workspace.
//!
//! [`TestDir`] owns a temporary directory that is removed on drop, and
//! [`FileTree`] describes a set of files and directories to materialise
//! inside it. Both are used by the walker, provider and engine suites so
//! fixtures read the same everywhere.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary directory that is cleaned up when dropped.
#[derive(Debug)]
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a fresh temporary directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Root of the temporary directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Joins a relative path onto the root.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn write_file(&self, relative: impl AsRef<Path>, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Creates `relative` and any missing parents.
    pub fn mkdir(&self, relative: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = self.join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Reads the file at `relative`.
    pub fn read_file(&self, relative: impl AsRef<Path>) -> io::Result<Vec<u8>> {
        fs::read(self.join(relative))
    }

    /// Reports whether `relative` exists.
    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.join(relative).exists()
    }
}

#[derive(Clone, Debug)]
enum TreeEntry {
    File { path: PathBuf, contents: Vec<u8> },
    Dir { path: PathBuf },
}

/// Declarative description of a directory tree.
#[derive(Clone, Debug, Default)]
pub struct FileTree {
    entries: Vec<TreeEntry>,
}

impl FileTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text file.
    pub fn text_file(&mut self, relative: impl Into<PathBuf>, contents: &str) -> &mut Self {
        self.entries.push(TreeEntry::File {
            path: relative.into(),
            contents: contents.as_bytes().to_vec(),
        });
        self
    }

    /// Adds an (initially empty) directory.
    pub fn dir(&mut self, relative: impl Into<PathBuf>) -> &mut Self {
        self.entries.push(TreeEntry::Dir {
            path: relative.into(),
        });
        self
    }

    /// Materialises the tree inside `dir`.
    pub fn create_in(&self, dir: &TestDir) -> io::Result<()> {
        self.create_at(dir.path())
    }

    /// Materialises the tree below an arbitrary base path.
    pub fn create_at(&self, base: &Path) -> io::Result<()> {
        for entry in &self.entries {
            match entry {
                TreeEntry::File { path, contents } => {
                    let full = base.join(path);
                    if let Some(parent) = full.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(full, contents)?;
                }
                TreeEntry::Dir { path } => fs::create_dir_all(base.join(path))?,
            }
        }
        Ok(())
    }

    /// Relative paths of every file and directory entry, in insertion order.
    pub fn paths(&self) -> Vec<&Path> {
        self.entries
            .iter()
            .map(|entry| match entry {
                TreeEntry::File { path, .. } | TreeEntry::Dir { path } => path.as_path(),
            })
            .collect()
    }
}
