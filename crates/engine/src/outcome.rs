//! Per-node outcomes and the run summary.

use std::fmt;
use std::path::{Path, PathBuf};

use metadata::{Identity, MetadataError};
use serde::Serialize;

use crate::drivers::Mode;

/// Mutation performed (or planned) for one entry or node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Nothing was changed.
    None,
    /// A remapped entry was added.
    Add,
    /// Legacy entries were removed.
    Remove,
    /// The owner was replaced.
    OwnerSet,
    /// Entries of an unresolvable identity were removed.
    Purge,
}

/// Classification of a per-node failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Reading the node's entries failed.
    Read,
    /// Setting the owner failed.
    Owner,
    /// Adding an entry failed.
    Add,
    /// Removing an entry failed.
    Remove,
    /// The administrative grant (or the elevation around it) failed.
    EscalationGrant,
    /// The operation failed again after a successful grant.
    EscalationRetry,
    /// The target identity resolves to no principal.
    UnresolvedIdentity,
    /// The node's time budget ran out.
    Timeout,
    /// The node could not be enumerated.
    Walk,
}

impl FailureKind {
    /// Short label used in warnings and the JSON summary.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Owner => "owner",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::EscalationGrant => "escalation-grant",
            Self::EscalationRetry => "escalation-retry",
            Self::UnresolvedIdentity => "unresolved-identity",
            Self::Timeout => "timeout",
            Self::Walk => "walk",
        }
    }

    /// Informational kinds are logged but not counted as failures.
    pub const fn is_informational(self) -> bool {
        matches!(self, Self::UnresolvedIdentity)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A failure caught at the node boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} failed: {reason}")]
pub struct NodeFailure {
    /// What failed.
    pub kind: FailureKind,
    /// Human-readable cause.
    pub reason: String,
}

impl NodeFailure {
    /// Creates a failure of `kind`.
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// Converts a provider error raised by an operation of `kind`.
    ///
    /// Unresolvable identities are reclassified as informational.
    pub fn from_metadata(kind: FailureKind, error: &MetadataError) -> Self {
        let kind = if error.is_unresolved() {
            FailureKind::UnresolvedIdentity
        } else {
            kind
        };
        Self::new(kind, error.to_string())
    }
}

/// Whether an outcome was applied, only planned, or failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum OutcomeResult {
    /// The action was applied, or nothing needed to change.
    Success,
    /// Dry run: the action would have been applied.
    Planned,
    /// The action failed.
    Failure(NodeFailure),
}

impl OutcomeResult {
    /// Returns the failure, if any.
    pub const fn failure(&self) -> Option<&NodeFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Success | Self::Planned => None,
        }
    }

    const fn is_effective(&self) -> bool {
        matches!(self, Self::Success | Self::Planned)
    }
}

impl From<Result<(), NodeFailure>> for OutcomeResult {
    fn from(result: Result<(), NodeFailure>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// Outcome of one step on one node: an entry evaluation, an ownership
/// change, a purge, or a node-level failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    /// Identity the step concerned, in display form.
    pub identity: Option<String>,
    /// Whether the step was driven by a legacy-domain match.
    pub matched: bool,
    /// What was done.
    pub action: Action,
    /// Whether the escalate-and-retry cycle ran.
    pub escalated: bool,
    /// How it ended.
    pub result: OutcomeResult,
}

impl OperationOutcome {
    /// An outcome for `identity`.
    pub fn new(identity: Option<&Identity>, matched: bool, action: Action, result: OutcomeResult) -> Self {
        Self {
            identity: identity.map(ToString::to_string),
            matched,
            action,
            escalated: false,
            result,
        }
    }

    /// A node-level failure not tied to an identity.
    pub fn failed(failure: NodeFailure) -> Self {
        Self::new(None, false, Action::None, OutcomeResult::Failure(failure))
    }

    /// Marks whether escalation ran.
    #[must_use]
    pub const fn escalated(mut self, escalated: bool) -> Self {
        self.escalated = escalated;
        self
    }
}

/// Everything that happened on one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeReport {
    /// Path of the node.
    pub path: PathBuf,
    /// Whether the node was a top-level node.
    pub top_level: bool,
    /// Outcomes in the order the steps ran.
    pub outcomes: Vec<OperationOutcome>,
}

impl NodeReport {
    /// An empty report for `path`.
    pub fn new(path: &Path, top_level: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            top_level,
            outcomes: Vec::new(),
        }
    }

    /// Appends an outcome.
    pub fn push(&mut self, outcome: OperationOutcome) {
        self.outcomes.push(outcome);
    }

    /// Failures recorded for this node, informational ones included.
    pub fn failures(&self) -> impl Iterator<Item = &NodeFailure> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.failure())
    }
}

/// A failure attributed to a path, as listed in the summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Node the failure happened on.
    pub path: PathBuf,
    /// Identity involved, when there is one.
    pub identity: Option<String>,
    /// The failure.
    #[serde(flatten)]
    pub failure: NodeFailure,
}

/// Aggregated counters for a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Mode that ran.
    pub mode: Mode,
    /// Whether mutations were only planned.
    pub dry_run: bool,
    /// Nodes processed.
    pub nodes_visited: usize,
    /// Enumeration errors.
    pub walk_errors: usize,
    /// Entries qualified by the legacy domain.
    pub matches: usize,
    /// Remapped entries added.
    pub additions: usize,
    /// Legacy entries removed.
    pub removals: usize,
    /// Owners replaced.
    pub owner_changes: usize,
    /// Orphaned entries removed.
    pub orphans_purged: usize,
    /// Escalate-and-retry cycles run.
    pub escalations: usize,
    /// Failed steps, walk errors and timeouts included.
    pub failures: usize,
    /// Nodes whose time budget ran out.
    pub timeouts: usize,
    /// Steps skipped because an identity did not resolve.
    pub unresolved: usize,
    /// Whether the run stopped early on a signal.
    pub cancelled: bool,
    /// Every failure, sorted by path.
    pub failure_details: Vec<FailureRecord>,
}

impl Summary {
    /// An empty summary.
    pub const fn new(mode: Mode, dry_run: bool) -> Self {
        Self {
            mode,
            dry_run,
            nodes_visited: 0,
            walk_errors: 0,
            matches: 0,
            additions: 0,
            removals: 0,
            owner_changes: 0,
            orphans_purged: 0,
            escalations: 0,
            failures: 0,
            timeouts: 0,
            unresolved: 0,
            cancelled: false,
            failure_details: Vec::new(),
        }
    }

    /// Folds one node's report into the counters.
    pub fn record(&mut self, report: &NodeReport) {
        self.nodes_visited += 1;
        for outcome in &report.outcomes {
            self.matches += usize::from(outcome.matched && outcome.action != Action::OwnerSet);
            self.escalations += usize::from(outcome.escalated);

            if outcome.result.is_effective() {
                match outcome.action {
                    Action::Add => self.additions += 1,
                    Action::Remove => self.removals += 1,
                    Action::OwnerSet => self.owner_changes += 1,
                    Action::Purge => self.orphans_purged += 1,
                    Action::None => {}
                }
            }

            if let Some(failure) = outcome.result.failure() {
                if failure.kind.is_informational() {
                    self.unresolved += 1;
                } else {
                    self.failures += 1;
                }
                if failure.kind == FailureKind::Timeout {
                    self.timeouts += 1;
                }
                self.failure_details.push(FailureRecord {
                    path: report.path.clone(),
                    identity: outcome.identity.clone(),
                    failure: failure.clone(),
                });
            }
        }
    }

    /// Counts an enumeration error.
    pub fn record_walk_error(&mut self, error: &walk::WalkError) {
        self.walk_errors += 1;
        self.failures += 1;
        self.failure_details.push(FailureRecord {
            path: error.path().to_path_buf(),
            identity: None,
            failure: NodeFailure::new(FailureKind::Walk, error.to_string()),
        });
    }

    /// Sorts failure details by path, keeping per-node order.
    pub fn finish(&mut self) {
        self.failure_details.sort_by(|left, right| left.path.cmp(&right.path));
    }

    /// Whether any non-informational failure happened.
    pub const fn has_failures(&self) -> bool {
        self.failures > 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "{} summary{suffix}:", self.mode)?;
        writeln!(f, "  nodes visited:  {}", self.nodes_visited)?;
        match self.mode {
            Mode::Ownership => writeln!(f, "  owners set:     {}", self.owner_changes)?,
            Mode::Migrate => {
                writeln!(f, "  legacy matches: {}", self.matches)?;
                writeln!(f, "  entries added:  {}", self.additions)?;
            }
            Mode::Cleanup => {
                writeln!(f, "  orphans purged: {}", self.orphans_purged)?;
                writeln!(f, "  legacy matches: {}", self.matches)?;
                writeln!(f, "  entries removed: {}", self.removals)?;
            }
        }
        writeln!(f, "  escalations:    {}", self.escalations)?;
        writeln!(f, "  unresolved:     {}", self.unresolved)?;
        write!(
            f,
            "  failures:       {} ({} walk, {} timeout)",
            self.failures, self.walk_errors, self.timeouts
        )?;
        if self.cancelled {
            write!(f, "\n  cancelled before completion")?;
        }
        Ok(())
    }
}
