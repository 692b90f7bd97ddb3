//! Mode drivers.
//!
//! A [`NodeProcessor`] takes one enumerated node through the steps of the
//! selected [`Mode`]:
//!
//! ```text
//! Visit -> [PurgeOrphans, cleanup only] -> FetchAces
//!       -> for each entry: Evaluate -> Act (migrate | remove | none)
//!       -> Report
//! ```
//!
//! Every step ends in an [`OperationOutcome`]; a failing step never stops
//! the node or the walk. Entry lists are fetched fresh for every node and
//! again after every change the node receives.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use logging::{trace_acl, trace_name, trace_own, trace_skip};
use metadata::{Ace, SecurityProvider};
use platform::PrivilegeElevator;
use serde::Serialize;
use walk::{EnumerationMode, FsNode, Tier};

use crate::context::MigrationContext;
use crate::error::EngineError;
use crate::escalation::EscalationController;
use crate::mapper;
use crate::outcome::{Action, FailureKind, NodeFailure, NodeReport, OperationOutcome, OutcomeResult};
use crate::purge::purge_orphans;
use crate::timeout::NodeTimer;

/// The three cutover operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Hand each per-user folder and its direct children to the new-domain
    /// account named after the folder.
    Ownership,
    /// Add a new-domain copy of every legacy entry.
    Migrate,
    /// Purge orphaned entries and remove legacy ones.
    Cleanup,
}

impl Mode {
    /// Command-line name of the mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ownership => "owner",
            Self::Migrate => "migrate",
            Self::Cleanup => "cleanup",
        }
    }

    /// Traversal shape used by the mode.
    pub const fn enumeration_mode(self) -> EnumerationMode {
        match self {
            Self::Ownership => EnumerationMode::TwoLevel,
            Self::Migrate | Self::Cleanup => EnumerationMode::Recursive,
        }
    }

    /// Whether the mode needs a new domain name.
    pub const fn requires_new_domain(self) -> bool {
        matches!(self, Self::Ownership | Self::Migrate)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Applies one mode to individual nodes.
pub struct NodeProcessor<'a, P: ?Sized, E: ?Sized> {
    mode: Mode,
    context: &'a MigrationContext,
    provider: &'a P,
    controller: EscalationController<'a, P, E>,
    new_domain: &'a str,
}

impl<'a, P, E> NodeProcessor<'a, P, E>
where
    P: SecurityProvider + ?Sized,
    E: PrivilegeElevator + ?Sized,
{
    /// Creates a processor, checking that `context` carries what `mode`
    /// needs.
    pub fn new(
        mode: Mode,
        context: &'a MigrationContext,
        provider: &'a P,
        elevator: &'a E,
    ) -> Result<Self, EngineError> {
        let new_domain = match context.new_domain() {
            Some(domain) => domain,
            None if mode.requires_new_domain() => return Err(EngineError::MissingNewDomain { mode }),
            None => "",
        };

        Ok(Self {
            mode,
            context,
            provider,
            controller: EscalationController::new(
                provider,
                elevator,
                context.admin_identity(),
                context.escalation_policy(),
            ),
            new_domain,
        })
    }

    /// Mode this processor applies.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Options the processor was built with.
    pub const fn context(&self) -> &'a MigrationContext {
        self.context
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Runs every step of the mode on `node` and reports the outcomes.
    pub fn process(&self, node: &FsNode) -> NodeReport {
        let path = node.path();
        let timer = NodeTimer::start(self.context.timeout());
        let mut report = NodeReport::new(path, node.tier() == Tier::TopLevel);
        trace_name!("{}", path.display());

        match self.mode {
            Mode::Ownership => self.transfer_ownership(node, &timer, &mut report),
            Mode::Migrate => self.migrate(path, &timer, &mut report),
            Mode::Cleanup => self.cleanup(path, &timer, &mut report),
        }

        for failure in report.failures() {
            if failure.kind.is_informational() {
                trace_skip!("{}: {}", path.display(), failure);
            } else {
                tracing::warn!("{}: {}", path.display(), failure);
            }
        }
        report
    }

    fn transfer_ownership(&self, node: &FsNode, timer: &NodeTimer, report: &mut NodeReport) {
        let path = node.path();
        if let Err(timeout) = timer.check() {
            report.push(OperationOutcome::failed(NodeFailure::new(
                FailureKind::Timeout,
                timeout.to_string(),
            )));
            return;
        }

        let anchor = node.anchor().to_string_lossy();
        if anchor.is_empty() {
            report.push(OperationOutcome::failed(NodeFailure::new(
                FailureKind::Owner,
                "node has no top-level folder name",
            )));
            return;
        }

        let owner = mapper::anchor_owner(&anchor, self.new_domain);
        if self.context.dry_run() {
            trace_own!("{:?}: would set owner to {}", path, owner);
            report.push(OperationOutcome::new(
                Some(&owner),
                true,
                Action::OwnerSet,
                OutcomeResult::Planned,
            ));
            return;
        }

        let escalated = self
            .controller
            .apply_with_escalation(path, FailureKind::Owner, |path| {
                self.provider.set_owner(path, &owner)
            });
        if escalated.result.is_ok() {
            trace_own!("{:?}: owner set to {}", path, owner);
        }
        report.push(
            OperationOutcome::new(Some(&owner), true, Action::OwnerSet, escalated.result.into())
                .escalated(escalated.escalated),
        );
    }

    fn migrate(&self, path: &Path, timer: &NodeTimer, report: &mut NodeReport) {
        let Some(aces) = self.fetch(path, report) else {
            return;
        };
        let legacy = self.context.legacy_domain();
        let matching: Vec<&Ace> = aces.iter().filter(|ace| mapper::matches(ace, legacy)).collect();
        trace_acl!("{:?}: {} explicit entries, {} legacy", path, aces.len(), matching.len());

        let mut current = aces.clone();
        for (index, ace) in matching.iter().enumerate() {
            if timed_out(timer, matching.len() - index, report) {
                return;
            }

            let mapped = mapper::remap_ace(ace, legacy, self.new_domain);
            let present = current
                .iter()
                .any(|entry| entry.same_slot(&mapped) && entry.mask.contains(mapped.mask));
            if present {
                trace_skip!("{}: {} already present", path.display(), mapped);
                report.push(OperationOutcome::new(
                    Some(&mapped.identity),
                    true,
                    Action::None,
                    OutcomeResult::Success,
                ));
                continue;
            }

            if self.context.dry_run() {
                trace_acl!("{:?}: would add {}", path, mapped);
                report.push(OperationOutcome::new(
                    Some(&mapped.identity),
                    true,
                    Action::Add,
                    OutcomeResult::Planned,
                ));
                continue;
            }

            let escalated = self
                .controller
                .apply_with_escalation(path, FailureKind::Add, |path| {
                    self.provider.add_ace(path, &mapped)
                });
            let added = escalated.result.is_ok();
            if added {
                trace_acl!("{:?}: added {}", path, mapped);
            }
            report.push(
                OperationOutcome::new(Some(&mapped.identity), true, Action::Add, escalated.result.into())
                    .escalated(escalated.escalated),
            );

            if added && index + 1 < matching.len() {
                match self.fetch(path, report) {
                    Some(fresh) => current = fresh,
                    None => return,
                }
            }
        }
    }

    fn cleanup(&self, path: &Path, timer: &NodeTimer, report: &mut NodeReport) {
        for outcome in purge_orphans(self.provider, &self.controller, path, self.context.dry_run()) {
            report.push(outcome);
        }

        let Some(aces) = self.fetch(path, report) else {
            return;
        };
        let legacy = self.context.legacy_domain();
        let matching: Vec<&Ace> = aces.iter().filter(|ace| mapper::matches(ace, legacy)).collect();
        trace_acl!("{:?}: {} explicit entries, {} legacy", path, aces.len(), matching.len());

        let mut handled: HashMap<String, OutcomeResult> = HashMap::new();
        for (index, ace) in matching.iter().enumerate() {
            let key = ace.identity.lookup_key();
            if let Some(result) = handled.get(&key) {
                // Removed together with the first entry of this identity.
                report.push(OperationOutcome::new(
                    Some(&ace.identity),
                    true,
                    Action::Remove,
                    result.clone(),
                ));
                continue;
            }

            if timed_out(timer, matching.len() - index, report) {
                return;
            }

            let (result, escalated) = if self.context.dry_run() {
                trace_acl!("{:?}: would remove {}", path, ace.identity);
                (OutcomeResult::Planned, false)
            } else {
                let escalated = self
                    .controller
                    .apply_with_escalation(path, FailureKind::Remove, |path| {
                        self.provider.remove_ace(path, &ace.identity)
                    });
                if let Ok(removed) = &escalated.result {
                    trace_acl!("{:?}: removed {} ({} entries)", path, ace.identity, removed);
                }
                (
                    OutcomeResult::from(escalated.result.map(|_| ())),
                    escalated.escalated,
                )
            };

            handled.insert(key, result.clone());
            report.push(
                OperationOutcome::new(Some(&ace.identity), true, Action::Remove, result)
                    .escalated(escalated),
            );
        }
    }

    fn fetch(&self, path: &Path, report: &mut NodeReport) -> Option<Vec<Ace>> {
        match self.controller.unelevated(|| self.provider.explicit_aces(path)) {
            Ok(aces) => Some(aces),
            Err(error) => {
                report.push(OperationOutcome::failed(NodeFailure::from_metadata(
                    FailureKind::Read,
                    &error,
                )));
                None
            }
        }
    }
}

fn timed_out(timer: &NodeTimer, remaining: usize, report: &mut NodeReport) -> bool {
    match timer.check() {
        Ok(()) => false,
        Err(timeout) => {
            report.push(OperationOutcome::failed(NodeFailure::new(
                FailureKind::Timeout,
                format!("{timeout}; {remaining} entries skipped"),
            )));
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::EscalationPolicy;
    use metadata::{AccessMask, Identity, InheritanceFlags, MemoryProvider, Operation, PropagationFlags};
    use platform::FlagElevator;
    use std::time::Duration;
    use walk::NodeKind;

    const NODE: &str = "/srv/files/jdoe";

    fn id(text: &str) -> Identity {
        Identity::parse(text).unwrap()
    }

    fn node() -> FsNode {
        FsNode::new(NODE, NodeKind::Directory, Tier::TopLevel, "jdoe")
    }

    fn context() -> MigrationContext {
        MigrationContext::builder("DomainA")
            .new_domain("DomainB")
            .build()
            .unwrap()
    }

    fn provider() -> MemoryProvider {
        let provider = MemoryProvider::new();
        provider
            .add_principal(&id("DomainA\\jdoe"))
            .add_principal(&id("DomainB\\jdoe"))
            .add_principal(&id("DomainB\\admin"))
            .add_principal(&id("DomainC\\other"))
            .add_node(NODE);
        provider
    }

    fn process(mode: Mode, context: &MigrationContext, provider: &MemoryProvider) -> NodeReport {
        let elevator = FlagElevator::new(provider.privileged_handle());
        NodeProcessor::new(mode, context, provider, &elevator)
            .unwrap()
            .process(&node())
    }

    #[test]
    fn modes_map_to_traversal_shapes() {
        assert_eq!(Mode::Ownership.enumeration_mode(), EnumerationMode::TwoLevel);
        assert_eq!(Mode::Migrate.enumeration_mode(), EnumerationMode::Recursive);
        assert_eq!(Mode::Cleanup.enumeration_mode(), EnumerationMode::Recursive);
        assert!(!Mode::Cleanup.requires_new_domain());
        assert_eq!(Mode::Ownership.to_string(), "owner");
    }

    #[test]
    fn missing_new_domain_is_rejected() {
        let context = MigrationContext::builder("DomainA").build().unwrap();
        let provider = provider();
        let elevator = FlagElevator::default();
        assert!(matches!(
            NodeProcessor::new(Mode::Migrate, &context, &provider, &elevator),
            Err(EngineError::MissingNewDomain { mode: Mode::Migrate })
        ));
        assert!(NodeProcessor::new(Mode::Cleanup, &context, &provider, &elevator).is_ok());
    }

    #[test]
    fn ownership_uses_the_anchor_name() {
        let provider = provider();
        let report = process(Mode::Ownership, &context(), &provider);
        assert_eq!(provider.owner(Path::new(NODE)), Some(id("DomainB\\jdoe")));
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].action, Action::OwnerSet);
        assert_eq!(report.outcomes[0].identity.as_deref(), Some("DomainB\\jdoe"));
    }

    #[test]
    fn migrate_adds_a_copy_with_identical_attributes() {
        let provider = provider();
        let legacy = Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL)
            .with_inheritance(InheritanceFlags::OBJECT_INHERIT | InheritanceFlags::CONTAINER_INHERIT)
            .with_propagation(PropagationFlags::INHERIT_ONLY);
        provider.push_ace(NODE, legacy.clone());

        let report = process(Mode::Migrate, &context(), &provider);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].action, Action::Add);
        assert_eq!(report.outcomes[0].result, OutcomeResult::Success);

        let entries = provider.entries(Path::new(NODE));
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&legacy));
        assert!(entries.contains(&legacy.for_identity(id("DomainB\\jdoe"))));
    }

    #[test]
    fn migrate_twice_adds_nothing_new() {
        let provider = provider();
        provider.push_ace(NODE, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL));
        process(Mode::Migrate, &context(), &provider);
        let writes = provider.write_count();

        let report = process(Mode::Migrate, &context(), &provider);
        assert_eq!(report.outcomes[0].action, Action::None);
        assert_eq!(provider.write_count(), writes);
    }

    #[test]
    fn other_domains_and_inherited_entries_are_untouched() {
        let provider = provider();
        let other = Ace::allow(id("DomainC\\other"), AccessMask::FULL_CONTROL);
        let inherited = Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL).inherited();
        provider.push_ace(NODE, other.clone()).push_ace(NODE, inherited.clone());

        for mode in [Mode::Migrate, Mode::Cleanup] {
            let report = process(mode, &context(), &provider);
            assert!(report.outcomes.is_empty(), "{mode} produced {:?}", report.outcomes);
        }
        assert_eq!(provider.entries(Path::new(NODE)), vec![other, inherited]);
        assert_eq!(provider.write_count(), 0);
    }

    #[test]
    fn cleanup_removes_each_legacy_identity_once() {
        let provider = provider();
        provider
            .push_ace(NODE, Ace::deny(id("DomainA\\jdoe"), AccessMask::from_raw(AccessMask::DELETE)))
            .push_ace(NODE, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL))
            .push_ace(NODE, Ace::allow(id("DomainB\\jdoe"), AccessMask::FULL_CONTROL));

        let report = process(Mode::Cleanup, &context(), &provider);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes.iter().all(|outcome| outcome.action == Action::Remove));
        assert_eq!(provider.call_count(Path::new(NODE), Operation::RemoveAce), 1);
        assert_eq!(
            provider.entries(Path::new(NODE)),
            vec![Ace::allow(id("DomainB\\jdoe"), AccessMask::FULL_CONTROL)]
        );

        let again = process(Mode::Cleanup, &context(), &provider);
        assert!(again.outcomes.is_empty());
    }

    #[test]
    fn cleanup_purges_orphans_before_matching() {
        let provider = provider();
        provider
            .push_ace(NODE, Ace::allow(id("S-1-5-21-9-9-9-500"), AccessMask::FULL_CONTROL))
            .push_ace(NODE, Ace::allow(id("DomainA\\gone"), AccessMask::FULL_CONTROL));

        let report = process(Mode::Cleanup, &context(), &provider);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes.iter().all(|outcome| outcome.action == Action::Purge));
        assert!(provider.entries(Path::new(NODE)).is_empty());
    }

    #[test]
    fn read_failure_ends_the_node() {
        let provider = provider();
        provider.fail_always(NODE, Operation::ReadAces);
        let report = process(Mode::Migrate, &context(), &provider);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(
            report.outcomes[0].result.failure().map(|failure| failure.kind),
            Some(FailureKind::Read)
        );
    }

    #[test]
    fn dry_run_changes_nothing() {
        let provider = provider();
        provider
            .push_ace(NODE, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL))
            .push_ace(NODE, Ace::allow(id("S-1-5-21-9-9-9-500"), AccessMask::FULL_CONTROL));
        let context = MigrationContext::builder("DomainA")
            .new_domain("DomainB")
            .dry_run(true)
            .build()
            .unwrap();

        for mode in [Mode::Ownership, Mode::Migrate, Mode::Cleanup] {
            let report = process(mode, &context, &provider);
            assert!(!report.outcomes.is_empty());
            assert!(
                report
                    .outcomes
                    .iter()
                    .all(|outcome| outcome.result == OutcomeResult::Planned)
            );
        }
        assert_eq!(provider.write_count(), 0);
        assert_eq!(provider.owner(Path::new(NODE)), None);
    }

    #[test]
    fn exhausted_budget_skips_remaining_entries() {
        let provider = provider();
        provider
            .push_ace(NODE, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL))
            .push_ace(NODE, Ace::allow(id("DomainA\\svc"), AccessMask::FULL_CONTROL));
        let context = context();
        let report = {
            let elevator = FlagElevator::new(provider.privileged_handle());
            let processor = NodeProcessor::new(Mode::Migrate, &context, &provider, &elevator).unwrap();
            let timer = NodeTimer::start(
                crate::timeout::TimeoutConfig::new().with_duration(Some(Duration::ZERO)),
            );
            let mut report = NodeReport::new(Path::new(NODE), true);
            processor.migrate(Path::new(NODE), &timer, &mut report);
            report
        };

        assert_eq!(report.outcomes.len(), 1);
        let failure = report.outcomes[0].result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(failure.reason.contains("2 entries skipped"));
        assert_eq!(provider.write_count(), 0);
    }

    #[test]
    fn denied_add_escalates_with_admin_identity() {
        let provider = provider();
        provider
            .push_ace(NODE, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL))
            .lock(NODE, id("DomainB\\admin"));
        let context = MigrationContext::builder("DomainA")
            .new_domain("DomainB")
            .admin_identity(Some(id("DomainB\\admin")))
            .escalation_policy(EscalationPolicy::Retain)
            .build()
            .unwrap();

        let report = process(Mode::Migrate, &context, &provider);
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].escalated);
        assert_eq!(report.outcomes[0].result, OutcomeResult::Success);
    }

    #[test]
    fn migrate_rereads_entries_after_each_addition() {
        let provider = provider();
        provider
            .push_ace(NODE, Ace::allow(id("DomainA\\jdoe"), AccessMask::FULL_CONTROL))
            .push_ace(NODE, Ace::allow(id("DOMAINA\\jdoe"), AccessMask::FULL_CONTROL));

        let report = process(Mode::Migrate, &context(), &provider);
        let actions: Vec<Action> = report.outcomes.iter().map(|outcome| outcome.action).collect();
        assert_eq!(actions, [Action::Add, Action::None]);
        assert_eq!(provider.call_count(Path::new(NODE), Operation::AddAce), 1);
        assert_eq!(provider.call_count(Path::new(NODE), Operation::ReadAces), 2);
    }

    #[test]
    fn group_named_folder_is_an_owner_failure() {
        const STAFF: &str = "/srv/files/staff";
        let provider = provider();
        provider.add_group(&id("DomainB\\staff")).add_node(STAFF);
        let context = MigrationContext::builder("DomainA")
            .new_domain("DomainB")
            .admin_identity(Some(id("DomainB\\admin")))
            .build()
            .unwrap();
        let elevator = FlagElevator::new(provider.privileged_handle());
        let processor = NodeProcessor::new(Mode::Ownership, &context, &provider, &elevator).unwrap();

        let report = processor.process(&FsNode::new(STAFF, NodeKind::Directory, Tier::TopLevel, "staff"));
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.outcomes[0].escalated);
        let failure = report.outcomes[0].result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Owner);
        assert!(!failure.kind.is_informational());
        assert_eq!(provider.owner(Path::new(STAFF)), None);
    }
}
