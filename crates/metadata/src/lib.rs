#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `metadata` reads and writes the parts of a node's security descriptor
//! that a domain cutover touches: the owner and the explicit access control
//! entries. It also reports explicit entries whose identity no longer
//! resolves to any principal.
//!
//! # Design
//!
//! - [`SecurityProvider`] is the seam the engine drives. It works on one node
//!   at a time and never returns inherited entries.
//! - [`Identity`] keeps the domain qualifier apart from the relative name,
//!   and [`Ace`] is a fixed, backend-neutral entry shape.
//! - [`PrincipalResolver`] decides whether an identity names a principal.
//!   [`NssResolver`] asks the system name service.
//! - `Nfs4Provider` (Linux, `nfs4` feature) stores entries in the
//!   `system.nfs4_acl` extended attribute. [`MemoryProvider`] keeps them in
//!   memory with access locks and fault injection.
//!
//! # Invariants
//!
//! - Added entries are inserted in canonical order: explicit deny, explicit
//!   allow, then inherited entries. An explicit entry with the same
//!   principal, type and flags absorbs the new rights instead.
//! - Removing an identity with no explicit entries writes nothing.
//!
//! # Examples
//!
//! ```
//! use metadata::{AccessMask, Ace, Identity, MemoryProvider, SecurityProvider};
//! use std::path::Path;
//!
//! let provider = MemoryProvider::new();
//! let jdoe = Identity::parse("DomainB\\jdoe").unwrap();
//! provider.add_principal(&jdoe).add_node("/srv/files/jdoe");
//!
//! let path = Path::new("/srv/files/jdoe");
//! provider.add_ace(path, &Ace::allow(jdoe.clone(), AccessMask::FULL_CONTROL)).unwrap();
//! assert_eq!(provider.explicit_aces(path).unwrap()[0].identity, jdoe);
//! ```

mod ace;
mod error;
mod identity;
mod memory;
#[cfg(all(target_os = "linux", feature = "nfs4"))]
mod nfs4;
pub mod nfsv4_acl;
#[cfg(all(target_os = "linux", feature = "nfs4"))]
mod ownership;
mod provider;
mod resolver;

pub use ace::{AccessMask, Ace, AceType, InheritanceFlags, PropagationFlags};
pub use error::MetadataError;
pub use identity::{Identity, IdentityParseError};
pub use memory::{MemoryProvider, Operation, ProviderCall};
#[cfg(all(target_os = "linux", feature = "nfs4"))]
pub use nfs4::Nfs4Provider;
pub use provider::SecurityProvider;
#[cfg(unix)]
pub use resolver::NssResolver;
pub use resolver::{Principal, PrincipalResolver, StaticResolver};
