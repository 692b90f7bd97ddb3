//! Run-wide options.

use std::time::Duration;

use metadata::Identity;

use crate::escalation::EscalationPolicy;
use crate::timeout::TimeoutConfig;

/// Reasons a [`MigrationContextBuilder`] rejects its input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The legacy domain token is empty.
    #[error("legacy domain must not be empty")]
    EmptyLegacyDomain,
    /// The new domain name is empty.
    #[error("new domain must not be empty")]
    EmptyNewDomain,
    /// A domain contains a separator character.
    #[error("domain '{0}' must not contain '\\' or '@'")]
    InvalidDomain(String),
    /// Legacy and new domain are the same.
    #[error("new domain '{0}' is the legacy domain")]
    SameDomain(String),
    /// Zero worker threads were requested.
    #[error("jobs must be at least 1")]
    ZeroJobs,
}

/// Options shared by every node of a run. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationContext {
    legacy_domain: String,
    new_domain: Option<String>,
    admin_identity: Option<Identity>,
    verbosity: u8,
    dry_run: bool,
    jobs: usize,
    timeout: TimeoutConfig,
    escalation_policy: EscalationPolicy,
}

impl MigrationContext {
    /// Starts a builder for the given legacy domain token.
    pub fn builder(legacy_domain: impl Into<String>) -> MigrationContextBuilder {
        MigrationContextBuilder::new(legacy_domain)
    }

    /// Domain whose entries are migrated or removed.
    pub fn legacy_domain(&self) -> &str {
        &self.legacy_domain
    }

    /// Domain that replaces the legacy one, when the mode needs it.
    pub fn new_domain(&self) -> Option<&str> {
        self.new_domain.as_deref()
    }

    /// Identity granted full control when an operation is denied.
    pub fn admin_identity(&self) -> Option<&Identity> {
        self.admin_identity.as_ref()
    }

    /// Number of `-v` flags.
    pub const fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Whether mutations are only planned.
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Worker threads used for node processing.
    pub const fn jobs(&self) -> usize {
        self.jobs
    }

    /// Per-node time budget.
    pub const fn timeout(&self) -> TimeoutConfig {
        self.timeout
    }

    /// What happens to the administrative grant after a retry.
    pub const fn escalation_policy(&self) -> EscalationPolicy {
        self.escalation_policy
    }
}

/// Builder for [`MigrationContext`].
#[derive(Clone, Debug)]
pub struct MigrationContextBuilder {
    legacy_domain: String,
    new_domain: Option<String>,
    admin_identity: Option<Identity>,
    verbosity: u8,
    dry_run: bool,
    jobs: usize,
    node_timeout: Option<Duration>,
    escalation_policy: EscalationPolicy,
}

impl MigrationContextBuilder {
    fn new(legacy_domain: impl Into<String>) -> Self {
        Self {
            legacy_domain: legacy_domain.into(),
            new_domain: None,
            admin_identity: None,
            verbosity: 0,
            dry_run: false,
            jobs: 1,
            node_timeout: None,
            escalation_policy: EscalationPolicy::default(),
        }
    }

    /// Sets the replacement domain.
    pub fn new_domain(mut self, domain: impl Into<String>) -> Self {
        self.new_domain = Some(domain.into());
        self
    }

    /// Sets the administrative identity used for escalation.
    pub fn admin_identity(mut self, identity: Option<Identity>) -> Self {
        self.admin_identity = identity;
        self
    }

    /// Sets the verbosity level.
    pub const fn verbosity(mut self, level: u8) -> Self {
        self.verbosity = level;
        self
    }

    /// Plans mutations without applying them.
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the number of worker threads.
    pub const fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Sets the per-node time budget.
    pub const fn node_timeout(mut self, budget: Option<Duration>) -> Self {
        self.node_timeout = budget;
        self
    }

    /// Sets the escalation revocation policy.
    pub const fn escalation_policy(mut self, policy: EscalationPolicy) -> Self {
        self.escalation_policy = policy;
        self
    }

    /// Validates the options.
    pub fn build(self) -> Result<MigrationContext, ContextError> {
        let legacy_domain = self.legacy_domain.trim().to_owned();
        if legacy_domain.is_empty() {
            return Err(ContextError::EmptyLegacyDomain);
        }
        check_separators(&legacy_domain)?;

        let new_domain = match self.new_domain {
            Some(domain) => {
                let domain = domain.trim().to_owned();
                if domain.is_empty() {
                    return Err(ContextError::EmptyNewDomain);
                }
                check_separators(&domain)?;
                if domain.eq_ignore_ascii_case(&legacy_domain) {
                    return Err(ContextError::SameDomain(domain));
                }
                Some(domain)
            }
            None => None,
        };

        if self.jobs == 0 {
            return Err(ContextError::ZeroJobs);
        }

        Ok(MigrationContext {
            legacy_domain,
            new_domain,
            admin_identity: self.admin_identity,
            verbosity: self.verbosity,
            dry_run: self.dry_run,
            jobs: self.jobs,
            timeout: TimeoutConfig::new().with_duration(self.node_timeout.filter(|budget| !budget.is_zero())),
            escalation_policy: self.escalation_policy,
        })
    }
}

fn check_separators(domain: &str) -> Result<(), ContextError> {
    if domain.contains(['\\', '@']) {
        Err(ContextError::InvalidDomain(domain.to_owned()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_and_retaining() {
        let context = MigrationContext::builder("DomainA").build().unwrap();
        assert_eq!(context.legacy_domain(), "DomainA");
        assert_eq!(context.new_domain(), None);
        assert_eq!(context.jobs(), 1);
        assert!(!context.dry_run());
        assert!(!context.timeout().is_enabled());
        assert_eq!(context.escalation_policy(), EscalationPolicy::Retain);
    }

    #[test]
    fn domains_are_trimmed_and_validated() {
        let context = MigrationContext::builder(" DomainA ")
            .new_domain("DomainB ")
            .build()
            .unwrap();
        assert_eq!(context.legacy_domain(), "DomainA");
        assert_eq!(context.new_domain(), Some("DomainB"));

        assert_eq!(
            MigrationContext::builder("  ").build(),
            Err(ContextError::EmptyLegacyDomain)
        );
        assert_eq!(
            MigrationContext::builder("DomainA").new_domain("").build(),
            Err(ContextError::EmptyNewDomain)
        );
        assert!(matches!(
            MigrationContext::builder("Domain\\A").build(),
            Err(ContextError::InvalidDomain(_))
        ));
        assert!(matches!(
            MigrationContext::builder("DomainA").new_domain("domaina").build(),
            Err(ContextError::SameDomain(_))
        ));
    }

    #[test]
    fn zero_jobs_and_zero_timeout() {
        assert_eq!(
            MigrationContext::builder("DomainA").jobs(0).build(),
            Err(ContextError::ZeroJobs)
        );
        let context = MigrationContext::builder("DomainA")
            .node_timeout(Some(Duration::ZERO))
            .build()
            .unwrap();
        assert!(!context.timeout().is_enabled());
    }
}
