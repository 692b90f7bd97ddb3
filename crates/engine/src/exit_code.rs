//! Process exit codes.
//!
//! Only fatal conditions produce a non-zero status. Per-node failures are
//! reported as warnings and never change the exit code.
//!
//! # Examples
//!
//! ```
//! use engine::exit_code::ExitCode;
//!
//! assert_eq!(ExitCode::ProviderUnavailable.as_i32(), 2);
//! assert_eq!(ExitCode::from_i32(20), Some(ExitCode::Signal));
//! ```

use std::fmt;

/// Exit codes returned by a cutover run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// The run completed, possibly with per-node warnings.
    Ok = 0,

    /// Syntax or usage error.
    ///
    /// Returned when command-line arguments, the configuration profile or
    /// the resulting run options are invalid.
    Syntax = 1,

    /// The security descriptor provider could not be obtained.
    ProviderUnavailable = 2,

    /// The enumeration root could not be inspected or listed.
    FileSelect = 3,

    /// The run was cancelled by SIGINT or SIGTERM.
    Signal = 20,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::ProviderUnavailable => "security descriptor provider unavailable",
            Self::FileSelect => "errors selecting input files, dirs",
            Self::Signal => "received SIGINT or SIGTERM",
        }
    }

    /// Returns `true` if this represents a successful exit.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Creates an exit code from an i32 value.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Syntax),
            2 => Some(Self::ProviderUnavailable),
            3 => Some(Self::FileSelect),
            20 => Some(Self::Signal),
            _ => None,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

/// Errors that know which exit code they terminate the process with.
pub trait HasExitCode {
    /// Exit code for this error.
    fn exit_code(&self) -> ExitCode;
}
