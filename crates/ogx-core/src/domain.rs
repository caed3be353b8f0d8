//! Operator-domain naming and canonicalization.
//!
//! The default/builtin operator domain has two accepted spellings on the
//! wire: the empty string (canonical) and [`DEFAULT_DOMAIN_ALIAS`]. Every
//! map keyed by domain must canonicalize through [`normalize_domain`] at
//! the point of insertion, so the default domain can never appear twice
//! under two spellings.

/// Canonical name of the default operator domain.
pub const DEFAULT_DOMAIN: &str = "";

/// Accepted alias for the default operator domain.
pub const DEFAULT_DOMAIN_ALIAS: &str = "ai.ogx";

/// Oldest default-domain opset version with guaranteed operator coverage.
/// Models stamped below this still load, with an advisory.
pub const MIN_GUARANTEED_OPSET: i64 = 7;

/// Format revision written into freshly built models.
pub const CURRENT_IR_VERSION: i64 = 4;

/// Rewrites the alias spelling of the default domain to its canonical
/// (empty string) form. All other domains pass through unchanged.
pub fn normalize_domain(domain: &str) -> &str {
    if domain == DEFAULT_DOMAIN_ALIAS {
        DEFAULT_DOMAIN
    } else {
        domain
    }
}

/// Returns `true` if `domain` names the default domain under either
/// spelling.
pub fn is_default_domain(domain: &str) -> bool {
    normalize_domain(domain) == DEFAULT_DOMAIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_normalizes_to_empty() {
        assert_eq!(normalize_domain(DEFAULT_DOMAIN_ALIAS), DEFAULT_DOMAIN);
        assert_eq!(normalize_domain(""), "");
    }

    #[test]
    fn custom_domains_pass_through() {
        assert_eq!(normalize_domain("com.acme"), "com.acme");
        // Only the exact alias is rewritten.
        assert_eq!(normalize_domain("ai.ogx.training"), "ai.ogx.training");
    }

    #[test]
    fn default_domain_under_both_spellings() {
        assert!(is_default_domain(""));
        assert!(is_default_domain(DEFAULT_DOMAIN_ALIAS));
        assert!(!is_default_domain("com.acme"));
    }
}
