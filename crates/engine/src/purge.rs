//! Removal of entries whose identity no longer resolves.

use std::collections::HashMap;
use std::path::Path;

use logging::trace_purge;
use metadata::SecurityProvider;
use platform::PrivilegeElevator;

use crate::escalation::EscalationController;
use crate::outcome::{Action, FailureKind, NodeFailure, OperationOutcome, OutcomeResult};

/// Removes every orphaned entry of `path`.
///
/// Each distinct orphaned identity is removed with a single
/// [`SecurityProvider::remove_ace`] call, and one outcome is produced per
/// orphaned entry. A failure to list orphans yields a single read failure.
/// Nothing here stops the caller from processing the node further.
pub fn purge_orphans<P, E>(
    provider: &P,
    controller: &EscalationController<'_, P, E>,
    path: &Path,
    dry_run: bool,
) -> Vec<OperationOutcome>
where
    P: SecurityProvider + ?Sized,
    E: PrivilegeElevator + ?Sized,
{
    let orphans = match controller.unelevated(|| provider.orphaned_aces(path)) {
        Ok(orphans) => orphans,
        Err(error) => {
            return vec![OperationOutcome::failed(NodeFailure::from_metadata(
                FailureKind::Read,
                &error,
            ))];
        }
    };

    if orphans.is_empty() {
        return Vec::new();
    }
    trace_purge!("{:?}: {} orphaned entries", path, orphans.len());

    let mut outcomes = Vec::with_capacity(orphans.len());
    let mut handled: HashMap<String, OutcomeResult> = HashMap::new();

    for orphan in &orphans {
        let key = orphan.identity.lookup_key();
        if let Some(result) = handled.get(&key) {
            // Removed together with the first entry of this identity.
            outcomes.push(OperationOutcome::new(
                Some(&orphan.identity),
                false,
                Action::Purge,
                result.clone(),
            ));
            continue;
        }

        let (result, escalated) = if dry_run {
            trace_purge!("{:?}: would purge {}", path, orphan.identity);
            (OutcomeResult::Planned, false)
        } else {
            let escalated = controller.apply_with_escalation(path, FailureKind::Remove, |path| {
                provider.remove_ace(path, &orphan.identity)
            });
            if let Ok(removed) = &escalated.result {
                trace_purge!("{:?}: purged {} ({} entries)", path, orphan.identity, removed);
            }
            (
                OutcomeResult::from(escalated.result.map(|_| ())),
                escalated.escalated,
            )
        };

        handled.insert(key, result.clone());
        outcomes.push(
            OperationOutcome::new(Some(&orphan.identity), false, Action::Purge, result)
                .escalated(escalated),
        );
    }

    outcomes
}
