//! Opset version reconciliation.
//!
//! Turns a possibly-incomplete, possibly-alias-spelled set of declared
//! domain versions into a canonical, registry-backed map. Three entry
//! paths feed it:
//!
//! - [`resolve_latest`]: no versions declared at all (fresh model build) --
//!   the registry snapshot is the answer.
//! - [`resolve_explicit`]: the caller supplied versions for a fresh build --
//!   they are taken as-is, canonicalized.
//! - [`resolve_declared`]: a parsed envelope's imports (load path) -- the
//!   declared set is authoritative, and registry domains the model did not
//!   declare are backfilled at their latest version.
//!
//! Every insertion into the resolved map goes through
//! [`normalize_domain`], so the default domain can never appear under two
//! spellings. The map is built once per model construction and is
//! immutable afterward.

use std::collections::HashMap;

use ogx_core::domain::{normalize_domain, DEFAULT_DOMAIN, MIN_GUARANTEED_OPSET};
use ogx_core::proto::OperatorSetId;
use ogx_core::registry::SchemaRegistry;

/// Outcome of version reconciliation.
#[derive(Debug, Default)]
pub struct ResolvedVersions {
    /// Canonical domain -> operator-set version.
    pub domain_versions: HashMap<String, i64>,
    /// Opset-import records the envelope must gain so it stays in sync
    /// with the resolved map.
    pub added_imports: Vec<OperatorSetId>,
}

/// Resolves against the registry snapshot alone (no declared versions).
///
/// Every resulting domain/version pair is emitted as an import record,
/// restricted to the default domain when `default_domain_only` is set.
pub fn resolve_latest(registry: &SchemaRegistry, default_domain_only: bool) -> ResolvedVersions {
    let mut resolved = ResolvedVersions::default();
    for (domain, version) in registry.latest_opset_versions(default_domain_only) {
        resolved.domain_versions.insert(domain.clone(), version);
        resolved.added_imports.push(OperatorSetId { domain, version });
    }
    resolved
}

/// Resolves caller-supplied versions for a fresh build.
///
/// The given map is authoritative: no registry backfill happens. Every
/// pair is emitted as an import record under its canonical domain name.
pub fn resolve_explicit(versions: &HashMap<String, i64>) -> ResolvedVersions {
    let mut resolved = ResolvedVersions::default();
    for (domain, &version) in versions {
        let domain = normalize_domain(domain).to_string();
        warn_if_legacy(&domain, version);
        resolved.added_imports.push(OperatorSetId {
            domain: domain.clone(),
            version,
        });
        resolved.domain_versions.insert(domain, version);
    }
    resolved
}

/// Resolves a parsed envelope's declared imports against the registry.
///
/// Declared entries seed the map (last wins when a domain repeats). Every
/// registry domain absent from the map is then inserted at the registry's
/// latest version and reported in `added_imports`, so the envelope can be
/// extended to match.
pub fn resolve_declared(declared: &[OperatorSetId], registry: &SchemaRegistry) -> ResolvedVersions {
    let mut resolved = ResolvedVersions::default();
    for import in declared {
        let domain = normalize_domain(&import.domain).to_string();
        warn_if_legacy(&domain, import.version);
        resolved.domain_versions.insert(domain, import.version);
    }
    for (domain, version) in registry.latest_opset_versions(false) {
        if !resolved.domain_versions.contains_key(&domain) {
            resolved.domain_versions.insert(domain.clone(), version);
            resolved.added_imports.push(OperatorSetId { domain, version });
        }
    }
    resolved
}

/// Non-fatal advisory for default-domain models authored below the
/// guaranteed opset floor. The model is still accepted and loaded.
fn warn_if_legacy(canonical_domain: &str, version: i64) {
    if canonical_domain == DEFAULT_DOMAIN && version < MIN_GUARANTEED_OPSET {
        tracing::warn!(
            version,
            "operator coverage is only guaranteed for default-domain opset {} or above; \
             this model may still run on legacy operator support",
            MIN_GUARANTEED_OPSET,
        );
    }
}
