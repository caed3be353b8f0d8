//! The model container.
//!
//! [`Model`] owns the serialized envelope of a model (identity,
//! provenance, metadata, opset imports, named functions) together with the
//! one live [`Graph`] built from it. Construction runs version
//! reconciliation and graph construction synchronously; a model therefore
//! always has a canonical domain-to-version map and a graph wired to the
//! schema registry.
//!
//! Both constructors are factories returning `Result`: structural
//! violations (no graph, no opset imports) are reported as
//! [`ModelError`] values, never as panics.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use ogx_core::domain::CURRENT_IR_VERSION;
use ogx_core::graph::Graph;
use ogx_core::proto::{
    FunctionProto, GraphProto, ModelProto, OperatorSetId, StringStringEntry,
};
use ogx_core::registry::{SchemaRegistry, SharedSchemaSource};

use crate::error::ModelError;
use crate::resolver;

/// Model metadata properties. Keys are unique; insertion order is
/// preserved across a save/load round trip.
pub type ModelMetadata = IndexMap<String, String>;

/// A loaded or freshly built model: envelope state plus the live graph.
#[derive(Debug)]
pub struct Model {
    /// The envelope. Its `graph` field is vacated while the live graph
    /// owns the state; [`Model::to_proto`] re-exports it.
    proto: ModelProto,
    metadata: ModelMetadata,
    domain_versions: HashMap<String, i64>,
    function_index: HashMap<String, usize>,
    graph: Graph,
}

impl Model {
    /// Builds a fresh model around an empty graph named `graph_name`.
    ///
    /// With an empty `domain_versions`, versions come from the registry's
    /// latest snapshot (restricted to the default domain when
    /// `default_domain_only` is set); otherwise the supplied versions are
    /// authoritative. One opset-import record is emitted per resolved
    /// domain either way. `local_sources` are registered into the model's
    /// own schema registry ahead of the built-in operator set.
    pub fn new(
        graph_name: &str,
        default_domain_only: bool,
        metadata: ModelMetadata,
        local_sources: Vec<SharedSchemaSource>,
        domain_versions: HashMap<String, i64>,
        functions: Vec<FunctionProto>,
    ) -> Result<Model, ModelError> {
        let mut proto = ModelProto {
            ir_version: Some(CURRENT_IR_VERSION),
            ..Default::default()
        };
        for (key, value) in &metadata {
            proto.metadata_props.push(StringStringEntry {
                key: key.clone(),
                value: value.clone(),
            });
        }

        let mut registry = SchemaRegistry::new();
        for source in local_sources {
            registry.register(source);
        }

        let resolved = if domain_versions.is_empty() {
            resolver::resolve_latest(&registry, default_domain_only)
        } else {
            resolver::resolve_explicit(&domain_versions)
        };
        proto.opset_import.extend(resolved.added_imports);

        proto.functions = functions;
        let function_index = build_function_index(&proto.functions);

        let graph_proto = GraphProto {
            name: graph_name.to_string(),
            ..Default::default()
        };
        let graph = Graph::new(
            graph_proto,
            resolved.domain_versions.clone(),
            proto.ir_version,
            Arc::new(registry),
            function_table(&proto.functions),
        );

        Ok(Model {
            proto,
            metadata,
            domain_versions: resolved.domain_versions,
            function_index,
            graph,
        })
    }

    /// Builds a model from a parsed (or otherwise owned) envelope.
    ///
    /// Structural invariants are checked before version resolution runs:
    /// the envelope must carry a graph and at least one opset import.
    /// Declared imports are authoritative; registry domains the envelope
    /// does not declare are backfilled into both the resolved map and the
    /// envelope itself.
    ///
    /// The returned model's graph has not yet been resolved; the
    /// byte/path/descriptor load entry points do that immediately after
    /// construction.
    pub fn from_proto(
        mut proto: ModelProto,
        local_sources: Vec<SharedSchemaSource>,
    ) -> Result<Model, ModelError> {
        if proto.graph.is_none() {
            return Err(ModelError::MissingGraph);
        }
        if proto.opset_import.is_empty() {
            return Err(ModelError::MissingOpsetImport);
        }

        let mut metadata = ModelMetadata::new();
        for prop in &proto.metadata_props {
            // Later entries win on duplicate keys.
            metadata.insert(prop.key.clone(), prop.value.clone());
        }

        let mut registry = SchemaRegistry::new();
        for source in local_sources {
            registry.register(source);
        }

        let resolved = resolver::resolve_declared(&proto.opset_import, &registry);
        proto.opset_import.extend(resolved.added_imports);

        let function_index = build_function_index(&proto.functions);

        let graph_proto = match proto.graph.take() {
            Some(graph_proto) => graph_proto,
            None => return Err(ModelError::MissingGraph),
        };
        let graph = Graph::new(
            graph_proto,
            resolved.domain_versions.clone(),
            proto.ir_version,
            Arc::new(registry),
            function_table(&proto.functions),
        );

        Ok(Model {
            proto,
            metadata,
            domain_versions: resolved.domain_versions,
            function_index,
            graph,
        })
    }

    /// Format revision the model was written with. Absent means unknown.
    pub fn ir_version(&self) -> Option<i64> {
        self.proto.ir_version
    }

    /// Tool that produced the model.
    pub fn producer_name(&self) -> &str {
        &self.proto.producer_name
    }

    pub fn set_producer_name(&mut self, producer_name: impl Into<String>) {
        self.proto.producer_name = producer_name.into();
    }

    /// Version of the producing tool.
    pub fn producer_version(&self) -> &str {
        &self.proto.producer_version
    }

    pub fn set_producer_version(&mut self, producer_version: impl Into<String>) {
        self.proto.producer_version = producer_version.into();
    }

    /// Reverse-DNS namespace of the model itself.
    pub fn domain(&self) -> &str {
        &self.proto.domain
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.proto.domain = domain.into();
    }

    /// Version of the model. Absent means unknown.
    pub fn model_version(&self) -> Option<i64> {
        self.proto.model_version
    }

    pub fn set_model_version(&mut self, version: i64) {
        self.proto.model_version = Some(version);
    }

    /// Free-form documentation.
    pub fn doc_string(&self) -> &str {
        &self.proto.doc_string
    }

    pub fn set_doc_string(&mut self, doc_string: impl Into<String>) {
        self.proto.doc_string = doc_string.into();
    }

    /// Named metadata properties.
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Sets a metadata property, updating both the live map and the
    /// envelope so exports stay in sync.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .proto
            .metadata_props
            .iter_mut()
            .find(|prop| prop.key == key)
        {
            Some(prop) => prop.value = value.clone(),
            None => self.proto.metadata_props.push(StringStringEntry {
                key: key.clone(),
                value: value.clone(),
            }),
        }
        self.metadata.insert(key, value);
    }

    /// The canonical domain-to-version map resolved at construction.
    pub fn domain_versions(&self) -> &HashMap<String, i64> {
        &self.domain_versions
    }

    /// Declared opset imports, including any backfilled at construction.
    pub fn opset_imports(&self) -> &[OperatorSetId] {
        &self.proto.opset_import
    }

    /// The main graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the main graph.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Named function sub-programs, in declaration order. Duplicate names
    /// are permitted here; lookups see the later entry.
    pub fn functions(&self) -> &[FunctionProto] {
        &self.proto.functions
    }

    /// Looks up a function by name. When the name was declared more than
    /// once, the later declaration shadows the earlier one.
    pub fn find_function(&self, name: &str) -> Option<&FunctionProto> {
        self.function_index
            .get(name)
            .and_then(|&index| self.proto.functions.get(index))
    }

    /// Appends a function, updates the name index, and makes the function
    /// visible to the live graph's subsequent resolution passes.
    pub fn add_function(&mut self, func: FunctionProto) {
        self.graph.add_function(&func);
        self.function_index
            .insert(func.name.clone(), self.proto.functions.len());
        self.proto.functions.push(func);
    }

    /// Exports a full envelope snapshot, with the graph field freshly
    /// exported from the live graph.
    pub fn to_proto(&self) -> ModelProto {
        let mut proto = self.proto.clone();
        proto.graph = Some(self.graph.to_proto());
        proto
    }
}

/// Name -> position index over `functions`; later entries overwrite
/// earlier same-named ones.
fn build_function_index(functions: &[FunctionProto]) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (position, func) in functions.iter().enumerate() {
        index.insert(func.name.clone(), position);
    }
    index
}

/// Function table handed to the graph, keyed by name with the same
/// later-wins semantics as the index.
fn function_table(functions: &[FunctionProto]) -> HashMap<String, FunctionProto> {
    let mut table = HashMap::new();
    for func in functions {
        table.insert(func.name.clone(), func.clone());
    }
    table
}
