//! Operator-schema registry.
//!
//! [`SchemaRegistry`] aggregates any number of [`SchemaSource`]s -- locally
//! registered sources first, then the built-in default-domain operator set.
//! The container layer asks it two questions: the latest available opset
//! version per domain (to reconcile a model's declared imports), and
//! whether a schema exists for a given `(domain, op_type, version)` triple
//! (during graph resolution).
//!
//! Schema *contents* are deliberately thin here: validating an operator's
//! signature against actual tensors is the graph collaborator's concern,
//! not the registry's.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::{normalize_domain, DEFAULT_DOMAIN};

/// Opset version reported by the built-in default-domain source.
pub const BUILTIN_OPSET_VERSION: i64 = 13;

/// A registered operator schema.
///
/// `since_version` is the opset version that introduced (or last revised)
/// this definition. A schema is active at every version `>= since_version`
/// until a newer revision of the same operator shadows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpSchema {
    /// Operator name, e.g. `"MatMul"`.
    pub op_type: String,
    /// Operator domain. Empty string is the default domain.
    #[serde(default)]
    pub domain: String,
    /// Opset version this definition first applies to.
    pub since_version: i64,
    /// Free-form documentation.
    #[serde(default)]
    pub doc: String,
}

/// A provider of operator schemas for one or more domains.
///
/// Sources are read-mostly after construction: the registry may be shared
/// between models and read concurrently, but registering into a shared
/// registry must be synchronized externally.
pub trait SchemaSource {
    /// Latest operator-set version per (canonical) domain covered by this
    /// source.
    fn domain_versions(&self) -> IndexMap<String, i64>;

    /// The definition of `op_type` in `domain` that is active at
    /// `version`, if this source has one.
    fn find_schema(&self, domain: &str, op_type: &str, version: i64) -> Option<&OpSchema>;
}

/// A schema source shareable between models.
pub type SharedSchemaSource = Arc<dyn SchemaSource + Send + Sync>;

/// An in-memory [`SchemaSource`] built from a list of [`OpSchema`]s.
///
/// The per-domain opset version defaults to the highest `since_version`
/// seen for that domain and can be raised with
/// [`declare_version`](OpSetSource::declare_version) when a source tracks
/// an opset newer than its latest operator revision.
#[derive(Debug, Clone, Default)]
pub struct OpSetSource {
    versions: IndexMap<String, i64>,
    schemas: Vec<OpSchema>,
}

impl OpSetSource {
    /// Builds a source from operator schemas, inferring each domain's
    /// opset version as the highest `since_version` present.
    pub fn new(schemas: Vec<OpSchema>) -> Self {
        let mut versions: IndexMap<String, i64> = IndexMap::new();
        for schema in &schemas {
            let domain = normalize_domain(&schema.domain).to_string();
            let entry = versions.entry(domain).or_insert(schema.since_version);
            if schema.since_version > *entry {
                *entry = schema.since_version;
            }
        }
        OpSetSource { versions, schemas }
    }

    /// Declares (or raises) the opset version reported for `domain`.
    pub fn declare_version(mut self, domain: &str, version: i64) -> Self {
        self.versions
            .insert(normalize_domain(domain).to_string(), version);
        self
    }

    /// Parses a source from a JSON array of [`OpSchema`] records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let schemas: Vec<OpSchema> = serde_json::from_str(json)?;
        Ok(OpSetSource::new(schemas))
    }

    /// Returns the schemas held by this source.
    pub fn schemas(&self) -> &[OpSchema] {
        &self.schemas
    }
}

impl SchemaSource for OpSetSource {
    fn domain_versions(&self) -> IndexMap<String, i64> {
        self.versions.clone()
    }

    fn find_schema(&self, domain: &str, op_type: &str, version: i64) -> Option<&OpSchema> {
        let domain = normalize_domain(domain);
        self.schemas
            .iter()
            .filter(|s| {
                normalize_domain(&s.domain) == domain
                    && s.op_type == op_type
                    && s.since_version <= version
            })
            .max_by_key(|s| s.since_version)
    }
}

/// Aggregates schema sources and answers version/lookup queries.
///
/// Locally registered sources take precedence over the built-in
/// default-domain source, both for version reporting and schema lookup.
/// Among local sources, earlier registrations win.
pub struct SchemaRegistry {
    sources: Vec<SharedSchemaSource>,
    builtin: Option<OpSetSource>,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("sources", &self.sources.len())
            .field("builtin", &self.builtin)
            .finish()
    }
}

impl SchemaRegistry {
    /// Creates a registry seeded with the built-in default-domain
    /// operator set.
    pub fn new() -> Self {
        SchemaRegistry {
            sources: Vec::new(),
            builtin: Some(builtin_source()),
        }
    }

    /// Creates a registry with no sources at all. Callers that need the
    /// default operator set register it explicitly or use
    /// [`SchemaRegistry::new`].
    pub fn empty() -> Self {
        SchemaRegistry {
            sources: Vec::new(),
            builtin: None,
        }
    }

    /// Registers an additional schema source.
    ///
    /// The source is consulted after previously registered sources and
    /// before the built-in operator set.
    pub fn register(&mut self, source: SharedSchemaSource) {
        self.sources.push(source);
    }

    /// Returns, for each known domain, the latest available operator-set
    /// version. With `default_domain_only` set, the result is restricted
    /// to the default domain.
    ///
    /// Local sources take precedence over the built-in set; among local
    /// sources the earliest registration wins.
    pub fn latest_opset_versions(&self, default_domain_only: bool) -> IndexMap<String, i64> {
        let mut latest: IndexMap<String, i64> = IndexMap::new();
        for source in &self.sources {
            for (domain, version) in source.domain_versions() {
                let domain = normalize_domain(&domain).to_string();
                latest.entry(domain).or_insert(version);
            }
        }
        if let Some(builtin) = &self.builtin {
            for (domain, version) in builtin.domain_versions() {
                latest.entry(domain).or_insert(version);
            }
        }
        if default_domain_only {
            latest.retain(|domain, _| domain == DEFAULT_DOMAIN);
        }
        latest
    }

    /// Looks up the schema for `op_type` in `domain` active at `version`.
    pub fn find_schema(&self, domain: &str, op_type: &str, version: i64) -> Option<&OpSchema> {
        for source in &self.sources {
            if let Some(schema) = source.find_schema(domain, op_type, version) {
                return Some(schema);
            }
        }
        self.builtin
            .as_ref()
            .and_then(|b| b.find_schema(domain, op_type, version))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        SchemaRegistry::new()
    }
}

/// The built-in default-domain operator set.
///
/// Each entry records the opset version that introduced or last revised
/// the operator, so lookups below a revision fall back to the older
/// definition.
fn builtin_source() -> OpSetSource {
    fn op(op_type: &str, since_version: i64) -> OpSchema {
        OpSchema {
            op_type: op_type.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            since_version,
            doc: String::new(),
        }
    }

    OpSetSource::new(vec![
        op("Constant", 1),
        op("Identity", 1),
        op("Add", 1),
        op("Add", 7),
        op("Sub", 1),
        op("Sub", 7),
        op("Mul", 1),
        op("Mul", 7),
        op("Div", 1),
        op("Div", 7),
        op("MatMul", 1),
        op("MatMul", 13),
        op("Gemm", 7),
        op("Relu", 1),
        op("Sigmoid", 1),
        op("Softmax", 1),
        op("Softmax", 13),
        op("Reshape", 5),
        op("Concat", 4),
        op("Transpose", 1),
    ])
    .declare_version(DEFAULT_DOMAIN, BUILTIN_OPSET_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_DOMAIN_ALIAS;

    fn custom_source(domain: &str, version: i64, ops: &[(&str, i64)]) -> SharedSchemaSource {
        let schemas = ops
            .iter()
            .map(|(op_type, since)| OpSchema {
                op_type: (*op_type).into(),
                domain: domain.into(),
                since_version: *since,
                doc: String::new(),
            })
            .collect();
        Arc::new(OpSetSource::new(schemas).declare_version(domain, version))
    }

    #[test]
    fn builtin_reports_default_domain() {
        let registry = SchemaRegistry::new();
        let versions = registry.latest_opset_versions(false);
        assert_eq!(versions.get(DEFAULT_DOMAIN), Some(&BUILTIN_OPSET_VERSION));
    }

    #[test]
    fn local_source_overrides_builtin_version() {
        let mut registry = SchemaRegistry::new();
        registry.register(custom_source(DEFAULT_DOMAIN, 12, &[("Relu", 12)]));
        let versions = registry.latest_opset_versions(false);
        assert_eq!(versions.get(DEFAULT_DOMAIN), Some(&12));
    }

    #[test]
    fn default_domain_only_filters_custom_domains() {
        let mut registry = SchemaRegistry::new();
        registry.register(custom_source("com.acme", 4, &[("Quantize", 4)]));
        let all = registry.latest_opset_versions(false);
        assert_eq!(all.get("com.acme"), Some(&4));

        let default_only = registry.latest_opset_versions(true);
        assert_eq!(default_only.len(), 1);
        assert!(default_only.contains_key(DEFAULT_DOMAIN));
    }

    #[test]
    fn earlier_registration_wins_between_local_sources() {
        let mut registry = SchemaRegistry::empty();
        registry.register(custom_source("com.acme", 4, &[]));
        registry.register(custom_source("com.acme", 9, &[]));
        let versions = registry.latest_opset_versions(false);
        assert_eq!(versions.get("com.acme"), Some(&4));
    }

    #[test]
    fn alias_domain_source_merges_with_canonical() {
        let mut registry = SchemaRegistry::empty();
        registry.register(custom_source(DEFAULT_DOMAIN_ALIAS, 9, &[("Relu", 9)]));
        let versions = registry.latest_opset_versions(false);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions.get(DEFAULT_DOMAIN), Some(&9));
    }

    #[test]
    fn find_schema_picks_latest_revision_at_or_below_version() {
        let registry = SchemaRegistry::new();
        let at_6 = registry.find_schema(DEFAULT_DOMAIN, "Add", 6).unwrap();
        assert_eq!(at_6.since_version, 1);
        let at_13 = registry.find_schema(DEFAULT_DOMAIN, "Add", 13).unwrap();
        assert_eq!(at_13.since_version, 7);
    }

    #[test]
    fn find_schema_misses_before_introduction() {
        let registry = SchemaRegistry::new();
        // Gemm entered the default domain at opset 7.
        assert!(registry.find_schema(DEFAULT_DOMAIN, "Gemm", 6).is_none());
        assert!(registry.find_schema(DEFAULT_DOMAIN, "Gemm", 7).is_some());
    }

    #[test]
    fn find_schema_normalizes_query_domain() {
        let registry = SchemaRegistry::new();
        assert!(registry
            .find_schema(DEFAULT_DOMAIN_ALIAS, "Relu", 13)
            .is_some());
    }

    #[test]
    fn local_source_consulted_before_builtin() {
        let mut registry = SchemaRegistry::new();
        registry.register(custom_source(DEFAULT_DOMAIN, 13, &[("Relu", 2)]));
        let schema = registry.find_schema(DEFAULT_DOMAIN, "Relu", 13).unwrap();
        assert_eq!(schema.since_version, 2);
    }

    #[test]
    fn source_from_json() {
        let source = OpSetSource::from_json(
            r#"[
                {"op_type": "Quantize", "domain": "com.acme", "since_version": 3},
                {"op_type": "Dequantize", "domain": "com.acme", "since_version": 5, "doc": "inverse"}
            ]"#,
        )
        .unwrap();
        assert_eq!(source.domain_versions().get("com.acme"), Some(&5));
        assert!(source.find_schema("com.acme", "Quantize", 4).is_some());
        assert!(source.find_schema("com.acme", "Dequantize", 4).is_none());
    }
}
