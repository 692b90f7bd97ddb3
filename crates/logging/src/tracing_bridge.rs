//! crates/logging/src/tracing_bridge.rs
//! Bridge between the tracing crate and the cutover verbosity system.
//!
//! [`CutoverLayer`] is a tracing-subscriber layer that maps event targets to
//! info and debug flags and filters them against its own
//! [`VerbosityConfig`]. Filtering never consults thread-local state, so the
//! same layer works unchanged on worker threads. `WARN` and `ERROR` events
//! bypass the flag system and are always written.
//!
//! ```rust,ignore
//! use logging::{LayerSink, VerbosityConfig, dispatch};
//!
//! let dispatch = dispatch(VerbosityConfig::from_verbose_level(2), LayerSink::Stderr);
//! tracing::dispatcher::with_default(&dispatch, || {
//!     tracing::info!(target: "acl_cutover::name", "owner set");
//! });
//! ```

use super::config::VerbosityConfig;
use super::levels::{DebugFlag, InfoFlag};
use super::thread_local::{emit_debug, emit_error, emit_info, emit_warning};
use std::fmt::Write as _;
use std::io::Write as _;
use tracing::{Dispatch, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Prefix used for warning and error lines.
pub const PROGRAM_PREFIX: &str = "acl-cutover";

/// Destination of events accepted by a [`CutoverLayer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayerSink {
    /// Render each event as one line on standard error.
    #[default]
    Stderr,
    /// Push each event into the calling thread's diagnostic buffer.
    Capture,
}

/// A tracing layer that bridges tracing events to the info/debug flags.
pub struct CutoverLayer {
    config: VerbosityConfig,
    sink: LayerSink,
}

enum Category {
    Info(InfoFlag, u8),
    Debug(DebugFlag, u8),
}

impl CutoverLayer {
    /// Create a new layer with the given verbosity configuration and sink.
    #[must_use]
    pub const fn new(config: VerbosityConfig, sink: LayerSink) -> Self {
        Self { config, sink }
    }

    /// Map a tracing target to an info flag.
    fn target_to_info_flag(target: &str) -> Option<InfoFlag> {
        match target_suffix(target)? {
            "name" => Some(InfoFlag::Name),
            "skip" => Some(InfoFlag::Skip),
            "stats" => Some(InfoFlag::Stats),
            "misc" => Some(InfoFlag::Misc),
            _ => None,
        }
    }

    /// Map a tracing target to a debug flag.
    fn target_to_debug_flag(target: &str) -> Option<DebugFlag> {
        // Only the last path segment counts so "unknown" never matches "own".
        match target_suffix(target)? {
            "acl" => Some(DebugFlag::Acl),
            "escalate" | "escalation" => Some(DebugFlag::Escalate),
            "exit" => Some(DebugFlag::Exit),
            "own" | "ownership" => Some(DebugFlag::Own),
            "purge" => Some(DebugFlag::Purge),
            "walk" => Some(DebugFlag::Walk),
            _ => None,
        }
    }

    /// Map a tracing level to the flag level an info event requires.
    const fn info_level(level: &Level) -> u8 {
        match *level {
            Level::ERROR | Level::WARN | Level::INFO => 1,
            Level::DEBUG => 2,
            Level::TRACE => 3,
        }
    }

    /// Map a tracing level to the flag level a debug event requires.
    const fn debug_level(level: &Level) -> u8 {
        match *level {
            Level::TRACE => 2,
            _ => 1,
        }
    }

    fn categorize(&self, target: &str, level: &Level) -> Option<Category> {
        if let Some(flag) = Self::target_to_debug_flag(target) {
            let required = Self::debug_level(level);
            return (self.config.debug.get(flag) >= required)
                .then_some(Category::Debug(flag, required));
        }
        let flag = Self::target_to_info_flag(target)?;
        let required = Self::info_level(level);
        (self.config.info.get(flag) >= required).then_some(Category::Info(flag, required))
    }

    fn write_line(line: &str) {
        // Write failures are ignored.
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = writeln!(handle, "{line}");
    }
}

/// Last `::`-separated segment of a target.
fn target_suffix(target: &str) -> Option<&str> {
    target.rsplit("::").next().filter(|segment| !segment.is_empty())
}

impl<S> Layer<S> for CutoverLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = metadata.level();

        if *level == Level::ERROR || *level == Level::WARN {
            let message = MessageVisitor::collect(event);
            let is_error = *level == Level::ERROR;
            match self.sink {
                LayerSink::Capture if is_error => emit_error(message),
                LayerSink::Capture => emit_warning(message),
                LayerSink::Stderr => {
                    let severity = if is_error { "error" } else { "warning" };
                    Self::write_line(&format!("{PROGRAM_PREFIX}: {severity}: {message}"));
                }
            }
            return;
        }

        let Some(category) = self.categorize(metadata.target(), level) else {
            return;
        };
        let message = MessageVisitor::collect(event);

        match (self.sink, category) {
            (LayerSink::Capture, Category::Info(flag, required)) => {
                emit_info(flag, required, message);
            }
            (LayerSink::Capture, Category::Debug(flag, required)) => {
                emit_debug(flag, required, message);
            }
            (LayerSink::Stderr, Category::Info(..)) => Self::write_line(&message),
            (LayerSink::Stderr, Category::Debug(flag, _)) => {
                Self::write_line(&format!("[{}] {message}", flag.name()));
            }
        }
    }
}

/// Visitor that renders the message followed by any structured fields.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn collect(event: &tracing::Event<'_>) -> String {
        let mut visitor = Self::default();
        event.record(&mut visitor);
        visitor.message.push_str(&visitor.fields);
        visitor.message
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

/// Build a dispatcher that routes events through a [`CutoverLayer`].
///
/// The dispatcher can be installed with
/// [`tracing::dispatcher::with_default`] for the duration of one run and
/// cloned into worker threads.
pub fn dispatch(config: VerbosityConfig, sink: LayerSink) -> Dispatch {
    Dispatch::new(tracing_subscriber::registry().with(CutoverLayer::new(config, sink)))
}

/// Install a global subscriber for the process.
///
/// Also initializes the calling thread's verbosity configuration. Returns
/// `false` if a global subscriber was already installed.
pub fn init_tracing(config: VerbosityConfig) -> bool {
    super::thread_local::init(config.clone());

    tracing_subscriber::registry()
        .with(CutoverLayer::new(config, LayerSink::Stderr))
        .try_init()
        .is_ok()
}
