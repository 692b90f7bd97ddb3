use std::io::Write;

use engine::{CancellationToken, ExitCode, HasExitCode};

use super::defaults::PROGRAM_NAME;
use super::host::Host;
use super::output::write_summary;
use super::settings::Settings;

/// Runs the resolved invocation and returns the process status.
pub(crate) fn execute<H, Out, Err>(
    settings: &Settings,
    host: &H,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32
where
    H: Host + ?Sized,
    Out: Write + ?Sized,
    Err: Write + ?Sized,
{
    logging::init(settings.verbosity.clone());
    let dispatch = logging::dispatch(settings.verbosity.clone(), host.log_sink());
    tracing::dispatcher::with_default(&dispatch, || run_mode(settings, host, stdout, stderr))
}

fn run_mode<H, Out, Err>(settings: &Settings, host: &H, stdout: &mut Out, stderr: &mut Err) -> i32
where
    H: Host + ?Sized,
    Out: Write + ?Sized,
    Err: Write + ?Sized,
{
    let cancel = CancellationToken::new();
    if let Err(error) = host.watch_termination(cancel.flag()) {
        tracing::warn!("cannot watch for termination signals: {error}");
    }
    let elevator = host.elevator();

    let summary = match engine::run_opening(
        settings.mode,
        &settings.root,
        &settings.context,
        |root| host.open_provider(root),
        &*elevator,
        &cancel,
    ) {
        Ok(summary) => summary,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: error: {error}");
            return error.exit_code().as_i32();
        }
    };

    if let Err(error) = write_summary(stdout, &summary, settings.json) {
        tracing::error!("cannot write summary: {error}");
    }

    if summary.cancelled {
        ExitCode::Signal.as_i32()
    } else {
        ExitCode::Ok.as_i32()
    }
}
