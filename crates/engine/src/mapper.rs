//! Legacy-to-new domain mapping.
//!
//! Pure functions: no I/O, no provider access. Only the domain qualifier is
//! ever rewritten; the relative name is carried over verbatim even when it
//! contains the legacy token.

use metadata::{Ace, Identity};

/// Returns `true` when the entry's identity is qualified by `legacy_domain`.
///
/// The comparison ignores case. Unqualified identities never match.
pub fn matches(ace: &Ace, legacy_domain: &str) -> bool {
    ace.identity.is_in_domain(legacy_domain)
}

/// Replaces a `legacy_domain` qualifier with `new_domain`.
///
/// Identities qualified by any other domain, or not qualified at all, are
/// returned unchanged.
pub fn remap(identity: &Identity, legacy_domain: &str, new_domain: &str) -> Identity {
    if identity.is_in_domain(legacy_domain) {
        identity.with_domain(new_domain)
    } else {
        identity.clone()
    }
}

/// Builds the new-domain counterpart of `ace`, keeping its rights, type,
/// inheritance and propagation.
pub fn remap_ace(ace: &Ace, legacy_domain: &str, new_domain: &str) -> Ace {
    ace.for_identity(remap(&ace.identity, legacy_domain, new_domain))
}

/// Identity a top-level folder named `anchor` is handed to.
pub fn anchor_owner(anchor: &str, new_domain: &str) -> Identity {
    Identity::new(new_domain, anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata::{AccessMask, InheritanceFlags, PropagationFlags};

    fn id(text: &str) -> Identity {
        Identity::parse(text).unwrap()
    }

    #[test]
    fn remap_replaces_only_the_qualifier() {
        assert_eq!(
            remap(&Identity::new("DomainA", "jdoe"), "DomainA", "DomainB"),
            Identity::new("DomainB", "jdoe")
        );
    }

    #[test]
    fn remap_keeps_legacy_token_inside_the_name() {
        assert_eq!(
            remap(&Identity::new("DomainA", "DomainA-svc"), "DomainA", "DomainB"),
            Identity::new("DomainB", "DomainA-svc")
        );
    }

    #[test]
    fn remap_ignores_case_of_the_qualifier() {
        assert_eq!(
            remap(&id("domaina\\jdoe"), "DomainA", "DomainB"),
            Identity::new("DomainB", "jdoe")
        );
    }

    #[test]
    fn remap_leaves_other_domains_alone() {
        let other = id("DomainC\\jdoe");
        assert_eq!(remap(&other, "DomainA", "DomainB"), other);

        let bare = id("jdoe");
        assert_eq!(remap(&bare, "DomainA", "DomainB"), bare);
    }

    #[test]
    fn matches_compares_qualifiers_only() {
        let legacy = Ace::allow(id("jdoe@domaina"), AccessMask::FULL_CONTROL);
        assert!(matches(&legacy, "DomainA"));

        let lookalike = Ace::allow(id("DomainAB\\jdoe"), AccessMask::FULL_CONTROL);
        assert!(!matches(&lookalike, "DomainA"));

        let bare = Ace::allow(id("DomainA"), AccessMask::FULL_CONTROL);
        assert!(!matches(&bare, "DomainA"));
    }

    #[test]
    fn remap_ace_keeps_every_other_attribute() {
        let legacy = Ace::deny(id("DomainA\\jdoe"), AccessMask::from_raw(AccessMask::WRITE_DATA))
            .with_inheritance(InheritanceFlags::OBJECT_INHERIT | InheritanceFlags::CONTAINER_INHERIT)
            .with_propagation(PropagationFlags::NO_PROPAGATE_INHERIT);

        let mapped = remap_ace(&legacy, "DomainA", "DomainB");
        assert_eq!(mapped.identity, Identity::new("DomainB", "jdoe"));
        assert_eq!(mapped.mask, legacy.mask);
        assert_eq!(mapped.ace_type, legacy.ace_type);
        assert_eq!(mapped.inheritance, legacy.inheritance);
        assert_eq!(mapped.propagation, legacy.propagation);
    }
}
