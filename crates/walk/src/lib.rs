#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` produces the lazy, ordered sequence of filesystem nodes that the
//! cutover engine visits. Two shapes of traversal are supported:
//!
//! - [`EnumerationMode::TwoLevel`] yields the direct children of the root
//!   (treated as per-user top folders) and, for each directory among them,
//!   its direct children. Anything deeper is never reported.
//! - [`EnumerationMode::Recursive`] yields the root itself once as the
//!   top-level node and then every descendant at unbounded depth.
//!
//! # Design
//!
//! - [`WalkBuilder`] configures the root and the enumeration mode.
//! - [`Walker`] implements [`Iterator`] and yields `Result<FsNode, WalkError>`
//!   values in depth-first pre-order. Directory contents are read one
//!   directory at a time and sorted lexicographically, so the tree is never
//!   held in memory as a whole and the order is stable across filesystems.
//! - [`FsNode`] records the node's path, [`NodeKind`], [`Tier`] and the name
//!   of its top-level anchor folder.
//!
//! # Invariants
//!
//! - The root is yielded at most once and never revisited while descending.
//! - A failure to inspect one entry or read one directory is yielded as an
//!   `Err` item and enumeration continues with the remaining siblings and
//!   subtrees. Only an unusable root fails [`WalkBuilder::build`].
//! - Symbolic links are never followed and never yielded.
//!
//! # Examples
//!
//! ```
//! use walk::{EnumerationMode, Tier, WalkBuilder};
//! use std::fs;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let root = temp.path().join("Files");
//! fs::create_dir_all(root.join("jdoe/Documents/deep"))?;
//!
//! let nodes: Vec<_> = WalkBuilder::new(&root)
//!     .mode(EnumerationMode::TwoLevel)
//!     .build()?
//!     .collect::<Result<_, _>>()?;
//!
//! assert_eq!(nodes.len(), 2);
//! assert_eq!(nodes[0].tier(), Tier::TopLevel);
//! assert_eq!(nodes[1].anchor(), "jdoe");
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod builder;
mod error;
mod node;
mod walker;

pub use builder::WalkBuilder;
pub use error::{WalkError, WalkErrorKind};
pub use node::{FsNode, NodeKind, Tier};
pub use walker::{EnumerationMode, Walker};
