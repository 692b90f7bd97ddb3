//! JSON run profiles.
//!
//! A profile supplies defaults for options that would otherwise have to be
//! repeated on every invocation:
//!
//! ```json
//! {
//!   "legacy_domain": "DomainA",
//!   "new_domain": "DomainB",
//!   "admin_identity": "DomainB\\admin",
//!   "escalation_policy": "revoke",
//!   "jobs": 8,
//!   "node_timeout_secs": 60,
//!   "dry_run": false
//! }
//! ```
//!
//! Every key is optional. Unknown keys are rejected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::EscalationPolicy;
use serde::Deserialize;

/// Defaults loaded from a `--config` file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Domain whose entries are migrated or removed.
    pub legacy_domain: Option<String>,
    /// Replacement domain for `owner` and `migrate`.
    pub new_domain: Option<String>,
    /// Identity granted full control on denial.
    pub admin_identity: Option<String>,
    /// Whether the administrative entry is removed after a retry.
    pub escalation_policy: Option<EscalationPolicy>,
    /// Worker threads.
    pub jobs: Option<usize>,
    /// Per-node time budget in seconds.
    pub node_timeout_secs: Option<u64>,
    /// Plan without applying.
    pub dry_run: Option<bool>,
}

/// Failure to load a [`Profile`].
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The file could not be read.
    #[error("cannot read profile '{}': {source}", path.display())]
    Read {
        /// Profile path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not a valid profile.
    #[error("invalid profile '{}': {source}", path.display())]
    Parse {
        /// Profile path.
        path: PathBuf,
        /// Decoder error with line and column.
        #[source]
        source: serde_json::Error,
    },
}

impl Profile {
    /// Reads and decodes the profile at `path`.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let text = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Decodes a profile from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::TestDir;

    #[test]
    fn every_key_is_optional() {
        assert_eq!(Profile::from_json("{}").unwrap(), Profile::default());
    }

    #[test]
    fn decodes_all_keys() {
        let profile = Profile::from_json(
            r#"{
                "legacy_domain": "DomainA",
                "new_domain": "DomainB",
                "admin_identity": "DomainB\\admin",
                "escalation_policy": "revoke",
                "jobs": 8,
                "node_timeout_secs": 60,
                "dry_run": true
            }"#,
        )
        .unwrap();

        assert_eq!(profile.legacy_domain.as_deref(), Some("DomainA"));
        assert_eq!(profile.new_domain.as_deref(), Some("DomainB"));
        assert_eq!(profile.admin_identity.as_deref(), Some("DomainB\\admin"));
        assert_eq!(profile.escalation_policy, Some(EscalationPolicy::Revoke));
        assert_eq!(profile.jobs, Some(8));
        assert_eq!(profile.node_timeout_secs, Some(60));
        assert_eq!(profile.dry_run, Some(true));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = Profile::from_json(r#"{"legacy": "DomainA"}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Profile::from_json(r#"{"escalation_policy": "sometimes"}"#).is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let dir = TestDir::new().unwrap();
        let missing = dir.join("missing.json");
        let error = Profile::load(&missing).unwrap_err();
        assert!(matches!(error, ProfileError::Read { .. }));
        assert!(error.to_string().contains("missing.json"));

        let broken = dir.write_file("broken.json", b"{ \"jobs\": ").unwrap();
        let error = Profile::load(&broken).unwrap_err();
        assert!(matches!(error, ProfileError::Parse { .. }));
    }

    #[test]
    fn load_reads_a_file() {
        let dir = TestDir::new().unwrap();
        let path = dir
            .write_file("profile.json", br#"{"legacy_domain": "DomainA", "jobs": 2}"#)
            .unwrap();
        let profile = Profile::load(&path).unwrap();
        assert_eq!(profile.legacy_domain.as_deref(), Some("DomainA"));
        assert_eq!(profile.jobs, Some(2));
    }
}
