#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` owns the verbosity model of the cutover tool. Diagnostics are
//! grouped into info categories ([`InfoFlag`]) for user-facing output and
//! debug categories ([`DebugFlag`]) for internals, each with an independent
//! level. `-v` counts, `--info` tokens and `--debug` tokens all resolve into
//! one [`VerbosityConfig`].
//!
//! # Design
//!
//! - [`VerbosityConfig::from_verbose_level`] maps a `-v` count to flag
//!   levels; [`VerbosityConfig::apply_info_flag`] and
//!   [`VerbosityConfig::apply_debug_flag`] refine individual flags.
//! - A thread-local copy of the configuration answers [`info_gte`] and
//!   [`debug_gte`]; a thread-local buffer collects [`DiagnosticEvent`]s for
//!   tests.
//! - With the `tracing` feature, `CutoverLayer` routes events emitted by
//!   the `trace_*!` macros (or plain tracing macros with an
//!   `acl_cutover::<flag>` target) through the same flags.
//!
//! # Examples
//!
//! ```
//! use logging::{DebugFlag, InfoFlag, VerbosityConfig};
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_debug_flag("escalate2").unwrap();
//!
//! assert_eq!(config.info.get(InfoFlag::Name), 1);
//! assert_eq!(config.debug.get(DebugFlag::Escalate), 2);
//! ```

mod config;
mod levels;
mod thread_local;
#[cfg(feature = "tracing")]
mod tracing_bridge;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{DebugFlag, DebugLevels, InfoFlag, InfoLevels};
pub use thread_local::{
    DiagnosticEvent, apply_debug_flag, apply_info_flag, current, debug_gte, drain_events,
    emit_debug, emit_error, emit_info, emit_warning, info_gte, init,
};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{CutoverLayer, LayerSink, PROGRAM_PREFIX, dispatch, init_tracing};
