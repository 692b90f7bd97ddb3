//! crates/metadata/src/identity.rs
//!
//! Domain-qualified principal names.
//!
//! An [`Identity`] keeps the domain qualifier and the relative name apart so
//! that domain substitution never touches the name. Three textual forms are
//! accepted when parsing:
//!
//! - `DOMAIN\name` (down-level logon name)
//! - `name@domain` (NFSv4 `who` form)
//! - bare `name`, including special principals such as `OWNER@`
//!
//! The display form is always `DOMAIN\name`, or the bare name when no
//! qualifier is present.

use std::fmt;
use std::str::FromStr;

/// Error returned when a principal name cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentityParseError {
    /// The input was empty or whitespace.
    #[error("identity must not be empty")]
    Empty,
    /// A qualifier was present but the relative name was empty.
    #[error("identity '{0}' has an empty name")]
    EmptyName(String),
    /// A separator was present but the qualifier was empty.
    #[error("identity '{0}' has an empty domain")]
    EmptyDomain(String),
}

/// Special NFSv4 principals that always resolve.
const SPECIAL_PRINCIPALS: [&str; 3] = ["OWNER@", "GROUP@", "EVERYONE@"];

/// A principal name with an optional domain qualifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    domain: Option<String>,
    name: String,
}

impl Identity {
    /// Creates a domain-qualified identity.
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            name: name.into(),
        }
    }

    /// Creates an identity without a domain qualifier.
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            domain: None,
            name: name.into(),
        }
    }

    /// Parses `DOMAIN\name`, `name@domain` or a bare name.
    pub fn parse(text: &str) -> Result<Self, IdentityParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IdentityParseError::Empty);
        }

        if let Some((domain, name)) = text.split_once('\\') {
            return Self::checked(domain, name, text);
        }

        // A trailing '@' marks a special principal (OWNER@, EVERYONE@, ...).
        if text.ends_with('@') {
            return Ok(Self::unqualified(text));
        }

        if let Some((name, domain)) = text.rsplit_once('@') {
            return Self::checked(domain, name, text);
        }

        Ok(Self::unqualified(text))
    }

    fn checked(domain: &str, name: &str, text: &str) -> Result<Self, IdentityParseError> {
        if domain.is_empty() {
            return Err(IdentityParseError::EmptyDomain(text.to_owned()));
        }
        if name.is_empty() {
            return Err(IdentityParseError::EmptyName(text.to_owned()));
        }
        Ok(Self::new(domain, name))
    }

    /// Domain qualifier, if any.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Relative name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the qualifier equals `domain`, ignoring case.
    pub fn is_in_domain(&self, domain: &str) -> bool {
        self.domain
            .as_deref()
            .is_some_and(|qualifier| eq_ignore_case(qualifier, domain))
    }

    /// Returns a copy with the qualifier replaced by `domain`.
    #[must_use]
    pub fn with_domain(&self, domain: &str) -> Self {
        Self::new(domain, self.name.clone())
    }

    /// Case-insensitive equality of qualifier and name.
    pub fn same_principal(&self, other: &Self) -> bool {
        let domains_match = match (self.domain(), other.domain()) {
            (Some(left), Some(right)) => eq_ignore_case(left, right),
            (None, None) => true,
            _ => false,
        };
        domains_match && eq_ignore_case(&self.name, &other.name)
    }

    /// Returns `true` for the NFSv4 special principals.
    pub fn is_special(&self) -> bool {
        self.domain.is_none()
            && SPECIAL_PRINCIPALS
                .iter()
                .any(|special| special.eq_ignore_ascii_case(&self.name))
    }

    /// Returns `true` when the name is a bare security identifier (`S-1-...`).
    pub fn is_sid(&self) -> bool {
        self.domain.is_none()
            && self
                .name
                .strip_prefix("S-1-")
                .or_else(|| self.name.strip_prefix("s-1-"))
                .is_some_and(|rest| {
                    !rest.is_empty() && rest.split('-').all(|part| part.parse::<u64>().is_ok())
                })
    }

    /// Renders the identity in NFSv4 `who` form (`name@domain`).
    pub fn to_nfs4_who(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{}@{domain}", self.name),
            None => self.name.clone(),
        }
    }

    /// Lower-cased display form, usable as a lookup key.
    pub fn lookup_key(&self) -> String {
        self.to_string().to_lowercase()
    }
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right) || left.to_lowercase() == right.to_lowercase()
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{domain}\\{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_down_level_form() {
        let identity = Identity::parse("DomainA\\jdoe").unwrap();
        assert_eq!(identity.domain(), Some("DomainA"));
        assert_eq!(identity.name(), "jdoe");
        assert_eq!(identity.to_string(), "DomainA\\jdoe");
    }

    #[test]
    fn parses_nfs4_form() {
        let identity: Identity = "jdoe@DomainA".parse().unwrap();
        assert_eq!(identity, Identity::new("DomainA", "jdoe"));
        assert_eq!(identity.to_nfs4_who(), "jdoe@DomainA");
    }

    #[test]
    fn parses_bare_and_special_names() {
        assert_eq!(Identity::parse("jdoe").unwrap(), Identity::unqualified("jdoe"));

        let owner = Identity::parse("OWNER@").unwrap();
        assert_eq!(owner.domain(), None);
        assert!(owner.is_special());
        assert_eq!(owner.to_nfs4_who(), "OWNER@");
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(Identity::parse("  "), Err(IdentityParseError::Empty));
        assert!(matches!(
            Identity::parse("\\jdoe"),
            Err(IdentityParseError::EmptyDomain(_))
        ));
        assert!(matches!(
            Identity::parse("DomainA\\"),
            Err(IdentityParseError::EmptyName(_))
        ));
        assert!(matches!(
            Identity::parse("@DomainA"),
            Err(IdentityParseError::EmptyName(_))
        ));
    }

    #[test]
    fn domain_comparison_ignores_case() {
        let identity = Identity::new("DOMAINA", "jdoe");
        assert!(identity.is_in_domain("domaina"));
        assert!(!identity.is_in_domain("DomainB"));
        assert!(!Identity::unqualified("jdoe").is_in_domain("DomainA"));
    }

    #[test]
    fn same_principal_ignores_case() {
        assert!(Identity::new("DomainA", "JDoe").same_principal(&Identity::new("domaina", "jdoe")));
        assert!(!Identity::new("DomainA", "jdoe").same_principal(&Identity::unqualified("jdoe")));
    }

    #[test]
    fn with_domain_keeps_name_verbatim() {
        let remapped = Identity::new("DomainA", "DomainA-svc").with_domain("DomainB");
        assert_eq!(remapped, Identity::new("DomainB", "DomainA-svc"));
    }

    #[test]
    fn recognises_security_identifiers() {
        assert!(Identity::unqualified("S-1-5-21-3623811015-3361044348-30300820-1013").is_sid());
        assert!(!Identity::unqualified("S-1-").is_sid());
        assert!(!Identity::unqualified("S-1-x").is_sid());
        assert!(!Identity::new("DomainA", "S-1-5-21").is_sid());
    }
}
