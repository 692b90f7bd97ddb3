//! crates/logging/src/thread_local.rs
//! Thread-local storage for verbosity configuration and event collection.

use super::config::VerbosityConfig;
use super::levels::{DebugFlag, InfoFlag};
use std::cell::RefCell;

thread_local! {
    static VERBOSITY: RefCell<VerbosityConfig> = RefCell::new(VerbosityConfig::default());
    #[allow(clippy::missing_const_for_thread_local)]
    static EVENTS: RefCell<Vec<DiagnosticEvent>> = RefCell::new(Vec::new());
}

/// Diagnostic event collected during execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// Info-level diagnostic event.
    Info {
        /// The info flag category.
        flag: InfoFlag,
        /// The verbosity level.
        level: u8,
        /// The diagnostic message.
        message: String,
    },
    /// Debug-level diagnostic event.
    Debug {
        /// The debug flag category.
        flag: DebugFlag,
        /// The verbosity level.
        level: u8,
        /// The diagnostic message.
        message: String,
    },
    /// Warning that is reported regardless of verbosity.
    Warning {
        /// The diagnostic message.
        message: String,
    },
    /// Error that is reported regardless of verbosity.
    Error {
        /// The diagnostic message.
        message: String,
    },
}

impl DiagnosticEvent {
    /// Message carried by the event.
    pub fn message(&self) -> &str {
        match self {
            Self::Info { message, .. }
            | Self::Debug { message, .. }
            | Self::Warning { message }
            | Self::Error { message } => message,
        }
    }
}

/// Initialize verbosity configuration for the current thread.
pub fn init(config: VerbosityConfig) {
    VERBOSITY.with(|v| {
        *v.borrow_mut() = config;
    });
}

/// Snapshot of the current thread's configuration.
pub fn current() -> VerbosityConfig {
    VERBOSITY.with(|v| v.borrow().clone())
}

/// Check if the info flag is at or above the specified level.
pub fn info_gte(flag: InfoFlag, level: u8) -> bool {
    VERBOSITY.with(|v| v.borrow().info.get(flag) >= level)
}

/// Check if the debug flag is at or above the specified level.
pub fn debug_gte(flag: DebugFlag, level: u8) -> bool {
    VERBOSITY.with(|v| v.borrow().debug.get(flag) >= level)
}

/// Emit an info diagnostic event.
pub fn emit_info(flag: InfoFlag, level: u8, message: String) {
    push(DiagnosticEvent::Info {
        flag,
        level,
        message,
    });
}

/// Emit a debug diagnostic event.
pub fn emit_debug(flag: DebugFlag, level: u8, message: String) {
    push(DiagnosticEvent::Debug {
        flag,
        level,
        message,
    });
}

/// Emit a warning event.
pub fn emit_warning(message: String) {
    push(DiagnosticEvent::Warning { message });
}

/// Emit an error event.
pub fn emit_error(message: String) {
    push(DiagnosticEvent::Error { message });
}

fn push(event: DiagnosticEvent) {
    EVENTS.with(|e| e.borrow_mut().push(event));
}

/// Drain all collected events, clearing the internal buffer.
pub fn drain_events() -> Vec<DiagnosticEvent> {
    EVENTS.with(|e| e.borrow_mut().drain(..).collect())
}

/// Apply an info flag token to the current configuration.
pub fn apply_info_flag(token: &str) -> Result<(), String> {
    VERBOSITY.with(|v| v.borrow_mut().apply_info_flag(token))
}

/// Apply a debug flag token to the current configuration.
pub fn apply_debug_flag(token: &str) -> Result<(), String> {
    VERBOSITY.with(|v| v.borrow_mut().apply_debug_flag(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_check() {
        let mut config = VerbosityConfig::default();
        config.info.name = 2;
        config.debug.escalate = 3;

        init(config);

        assert!(info_gte(InfoFlag::Name, 1));
        assert!(info_gte(InfoFlag::Name, 2));
        assert!(!info_gte(InfoFlag::Name, 3));

        assert!(debug_gte(DebugFlag::Escalate, 1));
        assert!(debug_gte(DebugFlag::Escalate, 3));
        assert!(!debug_gte(DebugFlag::Escalate, 4));
    }

    #[test]
    fn test_emit_and_drain() {
        init(VerbosityConfig::default());
        drain_events();

        emit_info(InfoFlag::Name, 1, "owner set".to_string());
        emit_debug(DebugFlag::Acl, 2, "read 3 entries".to_string());
        emit_warning("access denied".to_string());

        let events = drain_events();
        assert_eq!(
            events,
            vec![
                DiagnosticEvent::Info {
                    flag: InfoFlag::Name,
                    level: 1,
                    message: "owner set".to_string(),
                },
                DiagnosticEvent::Debug {
                    flag: DebugFlag::Acl,
                    level: 2,
                    message: "read 3 entries".to_string(),
                },
                DiagnosticEvent::Warning {
                    message: "access denied".to_string(),
                },
            ]
        );
        assert_eq!(events[2].message(), "access denied");

        assert!(drain_events().is_empty());
    }

    #[test]
    fn apply_tokens_to_current_thread() {
        init(VerbosityConfig::default());
        apply_info_flag("skip2").unwrap();
        apply_debug_flag("purge").unwrap();
        assert!(info_gte(InfoFlag::Skip, 2));
        assert!(debug_gte(DebugFlag::Purge, 1));
        assert!(apply_debug_flag("not_a_flag").is_err());
        assert_eq!(current().info.skip, 2);
    }

    #[test]
    fn default_config_is_silent() {
        init(VerbosityConfig::default());
        assert!(!debug_gte(DebugFlag::Acl, 1));
        assert!(debug_gte(DebugFlag::Acl, 0));
        assert!(!info_gte(InfoFlag::Name, 1));
    }

    #[test]
    fn reinit_overwrites_config() {
        init(VerbosityConfig::from_verbose_level(4));
        assert!(debug_gte(DebugFlag::Walk, 2));

        init(VerbosityConfig::default());
        assert!(!debug_gte(DebugFlag::Walk, 1));
    }
}
