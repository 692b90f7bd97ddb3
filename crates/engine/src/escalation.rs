//! Escalate-and-retry recovery for denied mutations.
//!
//! A mutation that fails is retried exactly once after the administrative
//! identity has been granted full control on the node under a scoped
//! elevation. The cycle runs as an explicit state machine:
//!
//! ```text
//! Attempt --ok--> Done
//!    |
//!   err
//!    v
//! Escalate --grant failed / no admin--> Fail
//!    |
//!  granted
//!    v
//!  Retry --ok--> Done
//!    |
//!   err --> Fail
//! ```
//!
//! Elevation is process-wide, so a process-wide lock orders it against
//! everything else: plain attempts and reads hold it shared, and an
//! escalation cycle holds it exclusively from the grant until the retry and
//! any revocation have finished.
//!
//! Under [`EscalationPolicy::Revoke`] the administrative identity's explicit
//! entries are put back exactly as they were before the grant.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use logging::trace_escalate;
use metadata::{
    AccessMask, Ace, AceType, Identity, InheritanceFlags, MetadataError, PropagationFlags,
    SecurityProvider,
};
use platform::{ElevationGuard, PrivilegeElevator};
use serde::{Deserialize, Serialize};

use crate::outcome::{FailureKind, NodeFailure};

static ESCALATION_LOCK: RwLock<()> = RwLock::new(());

/// What happens to the administrative grant once the retry has run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationPolicy {
    /// The grant stays on the node.
    #[default]
    Retain,
    /// The grant is undone after the retry, whatever its result.
    Revoke,
}

impl EscalationPolicy {
    /// Parses `retain` or `revoke`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "retain" => Some(Self::Retain),
            "revoke" => Some(Self::Revoke),
            _ => None,
        }
    }
}

/// Result of [`EscalationController::apply_with_escalation`].
#[derive(Debug)]
pub struct Escalated<T> {
    /// Value of the successful attempt, or the failure to report.
    pub result: Result<T, NodeFailure>,
    /// Whether the escalation branch was entered.
    pub escalated: bool,
    /// Number of retries performed (zero or one).
    pub retries: usize,
}

enum State<T> {
    Attempt,
    Escalate(MetadataError),
    Retry,
    Done(T),
    Fail(NodeFailure),
}

/// Wraps provider mutations with one escalate-and-retry cycle.
pub struct EscalationController<'a, P: ?Sized, E: ?Sized> {
    provider: &'a P,
    elevator: &'a E,
    admin: Option<&'a Identity>,
    policy: EscalationPolicy,
}

impl<'a, P, E> EscalationController<'a, P, E>
where
    P: SecurityProvider + ?Sized,
    E: PrivilegeElevator + ?Sized,
{
    /// Creates a controller. Without `admin`, failures are final.
    pub const fn new(
        provider: &'a P,
        elevator: &'a E,
        admin: Option<&'a Identity>,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            provider,
            elevator,
            admin,
            policy,
        }
    }

    /// Runs `read` while no escalation cycle holds raised privileges.
    pub fn unelevated<T>(&self, read: impl FnOnce() -> T) -> T {
        let _shared = ESCALATION_LOCK.read().unwrap_or_else(PoisonError::into_inner);
        read()
    }

    /// Runs `operation` on `path`, escalating once on failure.
    ///
    /// `kind` classifies a failure that happens without escalation. A failure
    /// that lies with the identity (unresolvable, or not a user) is never
    /// escalated, since no privilege on the node cures it.
    pub fn apply_with_escalation<T>(
        &self,
        path: &Path,
        kind: FailureKind,
        mut operation: impl FnMut(&Path) -> Result<T, MetadataError>,
    ) -> Escalated<T> {
        let mut escalated = false;
        let mut retries = 0;
        let mut prior = None;
        let mut lock = None;
        let mut state = State::Attempt;

        loop {
            state = match state {
                State::Attempt => match self.unelevated(|| operation(path)) {
                    Ok(value) => State::Done(value),
                    Err(error) => State::Escalate(error),
                },
                State::Escalate(error) => match self.admin {
                    Some(admin) if !error.is_identity_error() => {
                        lock = Some(ESCALATION_LOCK.write().unwrap_or_else(PoisonError::into_inner));
                        escalated = true;
                        trace_escalate!("{:?}: {}; granting {} full control", path, error, admin);
                        match self.grant(path, admin) {
                            Ok(entries) => {
                                prior = Some(entries);
                                State::Retry
                            }
                            Err(reason) => State::Fail(NodeFailure::new(
                                FailureKind::EscalationGrant,
                                format!("{error}; escalation to {admin} failed: {reason}"),
                            )),
                        }
                    }
                    _ => State::Fail(NodeFailure::from_metadata(kind, &error)),
                },
                State::Retry => {
                    retries += 1;
                    match operation(path) {
                        Ok(value) => State::Done(value),
                        Err(error) if error.is_identity_error() => {
                            State::Fail(NodeFailure::from_metadata(kind, &error))
                        }
                        Err(error) => State::Fail(NodeFailure::new(
                            FailureKind::EscalationRetry,
                            format!("still failing after escalation: {error}"),
                        )),
                    }
                }
                State::Done(value) => {
                    self.finish(path, prior.take());
                    drop(lock);
                    return Escalated {
                        result: Ok(value),
                        escalated,
                        retries,
                    };
                }
                State::Fail(failure) => {
                    self.finish(path, prior.take());
                    drop(lock);
                    return Escalated {
                        result: Err(failure),
                        escalated,
                        retries,
                    };
                }
            };
        }
    }

    /// Grants `admin` full control and returns the explicit entries it held
    /// before.
    fn grant(&self, path: &Path, admin: &Identity) -> Result<Vec<Ace>, String> {
        let elevation =
            ElevationGuard::acquire(self.elevator).map_err(|error| error.to_string())?;
        let granted = self.provider.explicit_aces(path).and_then(|entries| {
            let prior: Vec<Ace> = entries
                .into_iter()
                .filter(|entry| entry.identity.same_principal(admin))
                .collect();
            self.provider
                .add_ace(path, &Ace::allow(admin.clone(), AccessMask::FULL_CONTROL))
                .map(|()| prior)
        });
        let released = elevation.release();

        let prior = granted.map_err(|error| error.to_string())?;
        released.map_err(|error| format!("granted, but {error}"))?;
        Ok(prior)
    }

    fn finish(&self, path: &Path, prior: Option<Vec<Ace>>) {
        if self.policy != EscalationPolicy::Revoke {
            return;
        }
        let (Some(admin), Some(prior)) = (self.admin, prior) else {
            return;
        };
        if prior.iter().any(covers_grant) {
            trace_escalate!("{:?}: {} already held full control; nothing to revoke", path, admin);
            return;
        }

        let revoked = ElevationGuard::acquire(self.elevator)
            .map_err(|error| error.to_string())
            .and_then(|elevation| {
                let restored = self.provider.replace_aces(path, admin, &prior);
                let released = elevation.release();
                restored.map_err(|error| error.to_string())?;
                released.map_err(|error| error.to_string())
            });

        match revoked {
            Ok(()) => {
                trace_escalate!(
                    "{:?}: revoked {} ({} earlier entries restored)",
                    path,
                    admin,
                    prior.len()
                );
            }
            Err(reason) => {
                tracing::warn!("failed to revoke {} on {}: {}", admin, path.display(), reason);
            }
        }
    }
}

/// Whether `entry` already is the entry a grant would add.
fn covers_grant(entry: &Ace) -> bool {
    entry.ace_type == AceType::Allow
        && entry.inheritance == InheritanceFlags::NONE
        && entry.propagation == PropagationFlags::NONE
        && entry.mask.contains(AccessMask::FULL_CONTROL)
}
