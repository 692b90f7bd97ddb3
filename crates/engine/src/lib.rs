#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` carries out a directory-domain cutover on a filesystem tree. It
//! walks the tree with [`walk`], reads and rewrites security descriptors
//! through a [`metadata::SecurityProvider`], and recovers denied mutations
//! with a one-shot escalate-and-retry cycle backed by [`platform`]'s scoped
//! elevation.
//!
//! # Modes
//!
//! - [`Mode::Ownership`] gives every per-user top folder and its direct
//!   children to the new-domain account named after the folder.
//! - [`Mode::Migrate`] adds a new-domain copy of every explicit legacy entry
//!   and leaves the legacy entry in place.
//! - [`Mode::Cleanup`] purges orphaned entries, then removes the legacy ones.
//!
//! # Invariants
//!
//! - Inherited entries are never read or mutated.
//! - Entries qualified by any domain other than the legacy one are never
//!   touched.
//! - A failed mutation is retried at most once, after an administrative
//!   full-control grant; without an administrative identity it is not
//!   retried at all.
//! - A per-node failure is reported and never stops the walk.
//!
//! # Examples
//!
//! ```
//! use engine::{CancellationToken, MigrationContext, Mode, run};
//! use metadata::{AccessMask, Ace, Identity, MemoryProvider};
//! use platform::FlagElevator;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let root = temp.path().join("jdoe");
//! std::fs::create_dir(&root)?;
//!
//! let provider = MemoryProvider::new();
//! let legacy = Identity::new("DomainA", "jdoe");
//! provider
//!     .add_principal(&legacy)
//!     .add_principal(&Identity::new("DomainB", "jdoe"))
//!     .push_ace(&root, Ace::allow(legacy, AccessMask::FULL_CONTROL));
//! let elevator = FlagElevator::new(provider.privileged_handle());
//!
//! let context = MigrationContext::builder("DomainA").new_domain("DomainB").build()?;
//! let summary = run(Mode::Migrate, &root, &context, &provider, &elevator, &CancellationToken::new())?;
//! assert_eq!(summary.additions, 1);
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

pub mod cancel;
pub mod context;
pub mod drivers;
pub mod error;
pub mod escalation;
pub mod exit_code;
pub mod mapper;
pub mod outcome;
pub mod purge;
pub mod runner;
pub mod timeout;

pub use cancel::CancellationToken;
pub use context::{ContextError, MigrationContext, MigrationContextBuilder};
pub use drivers::{Mode, NodeProcessor};
pub use error::{EngineError, EngineResult};
pub use escalation::{Escalated, EscalationController, EscalationPolicy};
pub use exit_code::{ExitCode, HasExitCode};
pub use outcome::{
    Action, FailureKind, FailureRecord, NodeFailure, NodeReport, OperationOutcome, OutcomeResult,
    Summary,
};
pub use purge::purge_orphans;
pub use runner::{run, run_opening};
