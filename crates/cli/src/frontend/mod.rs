//! Argument handling and run orchestration for the `acl-cutover` binary.

mod arguments;
mod command_builder;
mod defaults;
mod execution;
mod host;
mod output;
mod profile;
mod settings;

#[cfg(test)]
pub(crate) mod tests;

use std::ffi::OsString;
use std::io::Write;

use clap::error::ErrorKind;
use engine::{ExitCode, HasExitCode};

pub use arguments::{ParsedArgs, parse_args};
pub use defaults::ADMIN_IDENTITY_ENV;
use defaults::PROGRAM_NAME;
pub use host::{Host, SystemHost};
pub use profile::{Profile, ProfileError};
use settings::Settings;
pub use settings::SettingsError;

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Runs the CLI against the real system.
///
/// Returns the process exit code. Help and version requests print to
/// `stdout` and return `0`; every other diagnostic goes to `stderr`.
pub fn run<I, T, Out, Err>(args: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    Out: Write + ?Sized,
    Err: Write + ?Sized,
{
    run_with_host(args, stdout, stderr, &SystemHost)
}

/// Runs the CLI with the services supplied by `host`.
pub fn run_with_host<I, T, Out, Err, H>(
    args: I,
    stdout: &mut Out,
    stderr: &mut Err,
    host: &H,
) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    Out: Write + ?Sized,
    Err: Write + ?Sized,
    H: Host + ?Sized,
{
    let parsed = match parse_args(args) {
        Ok(parsed) => parsed,
        Err(error) => return report_parse_error(&error, stdout, stderr),
    };

    let settings = match Settings::resolve(parsed, host) {
        Ok(settings) => settings,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: error: {error}");
            return error.exit_code().as_i32();
        }
    };

    execution::execute(&settings, host, stdout, stderr)
}

/// Converts a status returned by [`run`] into a process exit code.
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

fn report_parse_error<Out, Err>(error: &clap::Error, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write + ?Sized,
    Err: Write + ?Sized,
{
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(stdout, "{}", error.render());
            ExitCode::Ok.as_i32()
        }
        _ => {
            let _ = write!(stderr, "{}", error.render());
            ExitCode::Syntax.as_i32()
        }
    }
}
