//! Merges command-line arguments, the optional profile and environment
//! fallbacks into the options of one run.

use std::path::PathBuf;
use std::time::Duration;

use engine::{
    ContextError, EscalationPolicy, ExitCode, HasExitCode, MigrationContext, Mode,
};
use logging::VerbosityConfig;
use metadata::{Identity, IdentityParseError};

use super::arguments::ParsedArgs;
use super::defaults::{ADMIN_IDENTITY_ENV, DEFAULT_JOBS};
use super::host::Host;
use super::profile::{Profile, ProfileError};

/// Reasons the arguments do not describe a runnable invocation.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The `--config` profile could not be loaded.
    #[error(transparent)]
    Profile(#[from] ProfileError),
    /// Neither `--legacy-domain` nor the profile names the legacy domain.
    #[error("no legacy domain given; pass --legacy-domain or set legacy_domain in the profile")]
    MissingLegacyDomain,
    /// The mode needs a new domain and none was given.
    #[error("{mode} needs a new domain; pass --new-domain or set new_domain in the profile")]
    MissingNewDomain {
        /// The selected mode.
        mode: Mode,
    },
    /// The administrative identity does not parse.
    #[error("invalid admin identity '{value}': {source}")]
    AdminIdentity {
        /// Text as given.
        value: String,
        /// Why it was rejected.
        #[source]
        source: IdentityParseError,
    },
    /// An `--info` or `--debug` token is unknown.
    #[error("{0}")]
    Verbosity(String),
    /// The merged options are inconsistent.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl HasExitCode for SettingsError {
    fn exit_code(&self) -> ExitCode {
        ExitCode::Syntax
    }
}

/// Everything a run needs once arguments are resolved.
#[derive(Clone, Debug)]
pub(crate) struct Settings {
    pub(crate) mode: Mode,
    pub(crate) root: PathBuf,
    pub(crate) context: MigrationContext,
    pub(crate) verbosity: VerbosityConfig,
    pub(crate) json: bool,
}

impl Settings {
    /// Resolves `args` with flags taking precedence over the profile, and
    /// the profile over the environment.
    pub(crate) fn resolve<H: Host + ?Sized>(args: ParsedArgs, host: &H) -> Result<Self, SettingsError> {
        let profile = match &args.config {
            Some(path) => Profile::load(path)?,
            None => Profile::default(),
        };

        let legacy_domain = args
            .legacy_domain
            .or(profile.legacy_domain)
            .ok_or(SettingsError::MissingLegacyDomain)?;

        let new_domain = if args.mode.requires_new_domain() {
            let domain = args
                .new_domain
                .or(profile.new_domain)
                .ok_or(SettingsError::MissingNewDomain { mode: args.mode })?;
            Some(domain)
        } else {
            None
        };

        let admin_identity = args
            .admin_identity
            .or(profile.admin_identity)
            .or_else(|| host.var(ADMIN_IDENTITY_ENV))
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                Identity::parse(&value).map_err(|source| SettingsError::AdminIdentity { value, source })
            })
            .transpose()?;

        let escalation_policy = if args.revoke_escalation {
            EscalationPolicy::Revoke
        } else {
            profile.escalation_policy.unwrap_or_default()
        };

        let mut verbosity = VerbosityConfig::from_verbose_level(args.verbose);
        for list in &args.info {
            verbosity.apply_info_list(list).map_err(SettingsError::Verbosity)?;
        }
        for list in &args.debug {
            verbosity.apply_debug_list(list).map_err(SettingsError::Verbosity)?;
        }

        let mut builder = MigrationContext::builder(legacy_domain)
            .admin_identity(admin_identity)
            .verbosity(args.verbose)
            .dry_run(args.dry_run || profile.dry_run.unwrap_or(false))
            .jobs(args.jobs.or(profile.jobs).unwrap_or(DEFAULT_JOBS))
            .node_timeout(
                args.node_timeout
                    .or(profile.node_timeout_secs)
                    .map(Duration::from_secs),
            )
            .escalation_policy(escalation_policy);
        if let Some(domain) = new_domain {
            builder = builder.new_domain(domain);
        }

        Ok(Self {
            mode: args.mode,
            root: args.root,
            context: builder.build()?,
            verbosity,
            json: args.json,
        })
    }
}
