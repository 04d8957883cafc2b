//! Utility functions for domain name handling.
//!
//! Every name goes through [`canonicalize_domain`] before it is used as a
//! visited-set key or a query subject.

use crate::error::ZoneWalkError;

/// Maximum length of a domain name in presentation format, trailing dot included.
const MAX_NAME_LEN: usize = 254;

/// Maximum length of a single label.
const MAX_LABEL_LEN: usize = 63;

/// Canonicalize a domain name: trimmed, lowercase, fully qualified.
///
/// `Example.COM`, `example.com.` and ` example.com ` all become `example.com.`.
/// An empty input becomes the root name `.`.
pub fn canonicalize_domain(domain: &str) -> String {
    let mut name = domain.trim().to_ascii_lowercase();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

/// Validate a seed domain name.
///
/// This is a syntactic check only: names found in NSEC answers are taken as
/// the server sent them, but seeds typed by a user are rejected early when
/// they could never be encoded into a query.
///
/// # Arguments
///
/// * `domain` - The domain name to validate
///
/// # Returns
///
/// `Ok(())` if valid, `Err(ZoneWalkError)` if invalid.
pub fn validate_domain(domain: &str) -> Result<(), ZoneWalkError> {
    let trimmed = domain.trim();

    if trimmed.is_empty() {
        return Err(ZoneWalkError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if trimmed.chars().any(char::is_whitespace) {
        return Err(ZoneWalkError::invalid_domain(
            domain,
            "Domain name cannot contain whitespace",
        ));
    }

    let fqdn = canonicalize_domain(trimmed);
    if fqdn == "." {
        return Err(ZoneWalkError::invalid_domain(
            domain,
            "Refusing to walk the root zone",
        ));
    }

    if fqdn.len() > MAX_NAME_LEN {
        return Err(ZoneWalkError::invalid_domain(
            domain,
            format!("Domain name longer than {} characters", MAX_NAME_LEN - 1),
        ));
    }

    for label in fqdn.trim_end_matches('.').split('.') {
        if label.is_empty() {
            return Err(ZoneWalkError::invalid_domain(domain, "Empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(ZoneWalkError::invalid_domain(
                domain,
                format!("Label '{}' longer than {} characters", label, MAX_LABEL_LEN),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_domain() {
        assert_eq!(canonicalize_domain("example.com"), "example.com.");
        assert_eq!(canonicalize_domain("Example.COM."), "example.com.");
        assert_eq!(canonicalize_domain("  www.Example.com \n"), "www.example.com.");
        assert_eq!(canonicalize_domain(""), ".");
    }

    #[test]
    fn test_textual_variants_canonicalize_identically() {
        let variants = ["EXAMPLE.org", "example.org.", "Example.Org", " example.ORG. "];
        for variant in variants {
            assert_eq!(canonicalize_domain(variant), "example.org.");
        }
    }

    #[test]
    fn test_validate_domain() {
        assert!(validate_domain("example.com").is_ok());
        assert!(validate_domain("example.com.").is_ok());
        assert!(validate_domain("com").is_ok());
        assert!(validate_domain("_dmarc.example.com").is_ok());

        assert!(validate_domain("").is_err());
        assert!(validate_domain("   ").is_err());
        assert!(validate_domain(".").is_err());
        assert!(validate_domain("a..b").is_err());
        assert!(validate_domain("exa mple.com").is_err());
        assert!(validate_domain(&format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_validate_domain_length_limit() {
        let label = "a".repeat(63);
        let long = format!("{0}.{0}.{0}.{0}", label);
        assert!(long.len() > 253);
        assert!(validate_domain(&long).is_err());

        let fits = format!("{0}.{0}.{0}.{1}", label, "a".repeat(61));
        assert_eq!(fits.len(), 253);
        assert!(validate_domain(&fits).is_ok());
    }
}
