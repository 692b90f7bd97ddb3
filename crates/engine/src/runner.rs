//! Drives a mode over an enumerated tree.
//!
//! Nodes are processed one at a time by default. With the `parallel`
//! feature and more than one job, nodes are handed to a rayon pool; the
//! enumeration itself stays sequential and is pulled by the workers. The
//! cancellation token is checked before each node is taken.

use std::path::Path;

use logging::trace_exit;
use metadata::{MetadataError, SecurityProvider};
use platform::PrivilegeElevator;
use walk::{WalkBuilder, Walker};

use crate::cancel::CancellationToken;
use crate::context::MigrationContext;
use crate::drivers::{Mode, NodeProcessor};
use crate::error::{EngineError, EngineResult};
use crate::outcome::Summary;

/// Runs `mode` over the tree rooted at `root`.
///
/// Only an unusable root or an invalid context fails the run; every
/// per-node problem is folded into the returned [`Summary`].
pub fn run<P, E>(
    mode: Mode,
    root: &Path,
    context: &MigrationContext,
    provider: &P,
    elevator: &E,
    cancel: &CancellationToken,
) -> EngineResult<Summary>
where
    P: SecurityProvider + ?Sized,
    E: PrivilegeElevator + ?Sized,
{
    let processor = NodeProcessor::new(mode, context, provider, elevator)?;
    let walker = WalkBuilder::new(root)
        .mode(mode.enumeration_mode())
        .build()?;
    Ok(execute(&processor, root, walker, cancel))
}

/// Runs `mode` over `root` with a provider opened by `open`.
///
/// The root is inspected before `open` is called, so a missing root is
/// reported as [`EngineError::Enumeration`] even when no provider could be
/// obtained for it. A provider failure becomes
/// [`EngineError::ProviderUnavailable`].
pub fn run_opening<P, E, F>(
    mode: Mode,
    root: &Path,
    context: &MigrationContext,
    open: F,
    elevator: &E,
    cancel: &CancellationToken,
) -> EngineResult<Summary>
where
    P: SecurityProvider,
    E: PrivilegeElevator + ?Sized,
    F: FnOnce(&Path) -> Result<P, MetadataError>,
{
    if mode.requires_new_domain() && context.new_domain().is_none() {
        return Err(EngineError::MissingNewDomain { mode });
    }
    let walker = WalkBuilder::new(root)
        .mode(mode.enumeration_mode())
        .build()?;
    let provider = open(root).map_err(|source| EngineError::provider_unavailable(root, source))?;
    let processor = NodeProcessor::new(mode, context, &provider, elevator)?;
    Ok(execute(&processor, root, walker, cancel))
}

fn execute<P, E>(
    processor: &NodeProcessor<'_, P, E>,
    root: &Path,
    walker: Walker,
    cancel: &CancellationToken,
) -> Summary
where
    P: SecurityProvider + ?Sized,
    E: PrivilegeElevator + ?Sized,
{
    let mode = processor.mode();
    let context = processor.context();
    tracing::info!(
        target: "acl_cutover::misc",
        "{} {} via {} (legacy domain {})",
        mode,
        root.display(),
        processor.provider_name(),
        context.legacy_domain()
    );

    let mut summary = Summary::new(mode, context.dry_run());
    dispatch(processor, walker, context.jobs(), cancel, &mut summary);

    summary.cancelled = cancel.is_cancelled();
    summary.finish();
    trace_exit!(
        "{} finished: {} nodes, {} failures{}",
        mode,
        summary.nodes_visited,
        summary.failures,
        if summary.cancelled { ", cancelled" } else { "" }
    );
    summary
}

#[cfg(feature = "parallel")]
fn dispatch<P, E>(
    processor: &NodeProcessor<'_, P, E>,
    walker: Walker,
    jobs: usize,
    cancel: &CancellationToken,
    summary: &mut Summary,
) where
    P: SecurityProvider + ?Sized,
    E: PrivilegeElevator + ?Sized,
{
    if jobs > 1 {
        parallel::run(processor, walker, jobs, cancel, summary);
    } else {
        run_sequential(processor, walker, cancel, summary);
    }
}

#[cfg(not(feature = "parallel"))]
fn dispatch<P, E>(
    processor: &NodeProcessor<'_, P, E>,
    walker: Walker,
    jobs: usize,
    cancel: &CancellationToken,
    summary: &mut Summary,
) where
    P: SecurityProvider + ?Sized,
    E: PrivilegeElevator + ?Sized,
{
    if jobs > 1 {
        tracing::info!(
            target: "acl_cutover::misc",
            "built without parallel support; ignoring --jobs {jobs}"
        );
    }
    run_sequential(processor, walker, cancel, summary);
}

fn run_sequential<P, E>(
    processor: &NodeProcessor<'_, P, E>,
    mut walker: Walker,
    cancel: &CancellationToken,
    summary: &mut Summary,
) where
    P: SecurityProvider + ?Sized,
    E: PrivilegeElevator + ?Sized,
{
    while !cancel.is_cancelled() {
        let Some(item) = walker.next() else {
            break;
        };
        match item {
            Ok(node) => summary.record(&processor.process(&node)),
            Err(error) => {
                tracing::warn!("{error}");
                summary.record_walk_error(&error);
            }
        }
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    use std::sync::{Mutex, PoisonError};

    use metadata::SecurityProvider;
    use platform::PrivilegeElevator;
    use rayon::iter::{ParallelBridge, ParallelIterator};
    use tracing::Dispatch;
    use walk::Walker;

    use super::run_sequential;
    use crate::cancel::CancellationToken;
    use crate::drivers::NodeProcessor;
    use crate::outcome::Summary;

    pub(super) fn run<P, E>(
        processor: &NodeProcessor<'_, P, E>,
        walker: Walker,
        jobs: usize,
        cancel: &CancellationToken,
        summary: &mut Summary,
    ) where
        P: SecurityProvider + ?Sized,
        E: PrivilegeElevator + ?Sized,
    {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|index| format!("acl-cutover-{index}"))
            .build()
        {
            Ok(pool) => pool,
            Err(error) => {
                tracing::warn!("cannot start {jobs} workers ({error}); processing sequentially");
                run_sequential(processor, walker, cancel, summary);
                return;
            }
        };

        // Workers log through the caller's subscriber.
        let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
        let shared = Mutex::new(summary);

        pool.install(|| {
            walker
                .take_while(|_| !cancel.is_cancelled())
                .par_bridge()
                .for_each(|item| {
                    tracing::dispatcher::with_default(&dispatch, || match item {
                        Ok(node) => {
                            let report = processor.process(&node);
                            shared
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .record(&report);
                        }
                        Err(error) => {
                            tracing::warn!("{error}");
                            shared
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .record_walk_error(&error);
                        }
                    });
                });
        });
    }
}
