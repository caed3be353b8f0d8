//! The in-memory graph under construction and its resolution pass.
//!
//! [`Graph`] owns the [`GraphProto`] handed over by the model container,
//! together with everything resolution needs: the reconciled
//! domain-to-version map, the model's IR version, the schema registry, and
//! the table of model-local functions visible to nodes.
//!
//! [`Graph::resolve`] is the validation/linking pass that must run at
//! least once before a model is considered usable or persistable. It
//! checks that every value is produced exactly once, that every node input
//! is satisfied, that the data flow forms a DAG, and that every node's
//! operator either names a model-local function or has a schema in the
//! registry at the resolved opset version. Type and shape inference over
//! tensors is out of scope for this layer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use smallvec::SmallVec;

use crate::domain::normalize_domain;
use crate::error::GraphError;
use crate::proto::{FunctionProto, GraphProto, NodeProto};
use crate::registry::SchemaRegistry;

/// A computation graph being built toward a resolved, usable state.
///
/// Exclusively owned by its model container; the container re-exports it
/// into the envelope on save.
#[derive(Debug)]
pub struct Graph {
    proto: GraphProto,
    domain_versions: HashMap<String, i64>,
    ir_version: Option<i64>,
    registry: Arc<SchemaRegistry>,
    functions: HashMap<String, FunctionProto>,
    resolved: bool,
}

impl Graph {
    /// Wraps a graph proto together with the inputs resolution needs.
    ///
    /// `domain_versions` must already be canonicalized (no alias-spelled
    /// domains); `functions` is the model's function table keyed by name.
    pub fn new(
        proto: GraphProto,
        domain_versions: HashMap<String, i64>,
        ir_version: Option<i64>,
        registry: Arc<SchemaRegistry>,
        functions: HashMap<String, FunctionProto>,
    ) -> Self {
        Graph {
            proto,
            domain_versions,
            ir_version,
            registry,
            functions,
            resolved: false,
        }
    }

    /// Graph name.
    pub fn name(&self) -> &str {
        &self.proto.name
    }

    /// IR version of the owning model. Recorded for diagnostics; absent
    /// means unknown.
    pub fn ir_version(&self) -> Option<i64> {
        self.ir_version
    }

    /// The reconciled domain-to-version map this graph resolves against.
    pub fn domain_versions(&self) -> &HashMap<String, i64> {
        &self.domain_versions
    }

    /// `true` once a resolution pass has succeeded and no mutation has
    /// happened since.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Read access to the underlying graph proto.
    pub fn proto(&self) -> &GraphProto {
        &self.proto
    }

    /// Mutable access to the underlying graph proto. Any mutation
    /// invalidates the resolved state.
    pub fn proto_mut(&mut self) -> &mut GraphProto {
        self.resolved = false;
        &mut self.proto
    }

    /// Makes a function visible to subsequent resolution passes. A
    /// function with an already-known name shadows the earlier entry.
    pub fn add_function(&mut self, func: &FunctionProto) {
        self.functions.insert(func.name.clone(), func.clone());
        self.resolved = false;
    }

    /// Exports the current state of the graph.
    pub fn to_proto(&self) -> GraphProto {
        self.proto.clone()
    }

    /// Validates and links the graph.
    ///
    /// A successful pass marks the graph resolved; subsequent non-forced
    /// calls are no-ops until the graph is mutated. `force` always reruns
    /// the pass.
    pub fn resolve(&mut self, force: bool) -> Result<(), GraphError> {
        if self.resolved && !force {
            return Ok(());
        }

        let boundary = self.boundary_values();
        let produced_by = self.check_producers(&boundary)?;
        self.check_acyclic(&boundary, &produced_by)?;
        self.check_operators()?;

        self.resolved = true;
        Ok(())
    }

    /// Value names satisfied without any node running: graph inputs and
    /// initializers. An initializer may share a name with an input (it
    /// then acts as the input's default), so this is a set union.
    fn boundary_values(&self) -> HashSet<&str> {
        let mut values: HashSet<&str> = HashSet::new();
        for input in &self.proto.input {
            values.insert(input.name.as_str());
        }
        for initializer in &self.proto.initializer {
            values.insert(initializer.name.as_str());
        }
        values
    }

    /// Maps every node-produced value name to its producing node index,
    /// rejecting names produced twice or colliding with boundary values.
    fn check_producers<'a>(
        &'a self,
        boundary: &HashSet<&str>,
    ) -> Result<HashMap<&'a str, usize>, GraphError> {
        let mut produced_by: HashMap<&str, usize> = HashMap::new();
        for (index, node) in self.proto.node.iter().enumerate() {
            for output in &node.output {
                if output.is_empty() {
                    continue;
                }
                if boundary.contains(output.as_str())
                    || produced_by.insert(output.as_str(), index).is_some()
                {
                    return Err(GraphError::DuplicateProducer {
                        name: output.clone(),
                    });
                }
            }
        }
        Ok(produced_by)
    }

    /// Checks that every node input is satisfied and that the data flow
    /// between nodes forms a DAG.
    fn check_acyclic(
        &self,
        boundary: &HashSet<&str>,
        produced_by: &HashMap<&str, usize>,
    ) -> Result<(), GraphError> {
        let mut dag: DiGraph<usize, ()> = DiGraph::with_capacity(self.proto.node.len(), 0);
        let indices: Vec<_> = (0..self.proto.node.len()).map(|i| dag.add_node(i)).collect();

        for (index, node) in self.proto.node.iter().enumerate() {
            // Producer indices feeding this node, deduplicated so a node
            // consuming two outputs of one producer gets a single edge.
            let mut producers: SmallVec<[usize; 4]> = SmallVec::new();
            for input in &node.input {
                // Empty string marks an omitted optional input.
                if input.is_empty() {
                    continue;
                }
                match produced_by.get(input.as_str()) {
                    Some(&producer) => {
                        if !producers.contains(&producer) {
                            producers.push(producer);
                        }
                    }
                    None => {
                        if !boundary.contains(input.as_str()) {
                            return Err(GraphError::MissingInput {
                                node: node_label(node, index),
                                input: input.clone(),
                            });
                        }
                    }
                }
            }
            for producer in producers {
                dag.add_edge(indices[producer], indices[index], ());
            }
        }

        toposort(&dag, None).map_err(|cycle| {
            let index = dag[cycle.node_id()];
            GraphError::CycleDetected {
                node: node_label(&self.proto.node[index], index),
            }
        })?;
        Ok(())
    }

    /// Checks that every node invokes either a model-local function or an
    /// operator the registry has a schema for at the resolved version.
    fn check_operators(&self) -> Result<(), GraphError> {
        for (index, node) in self.proto.node.iter().enumerate() {
            if self.functions.contains_key(&node.op_type) {
                continue;
            }
            let domain = normalize_domain(&node.domain);
            let version = match self.domain_versions.get(domain) {
                Some(version) => *version,
                None => {
                    return Err(GraphError::UnknownDomain {
                        node: node_label(node, index),
                        domain: domain.to_string(),
                    })
                }
            };
            if self
                .registry
                .find_schema(domain, &node.op_type, version)
                .is_none()
            {
                return Err(GraphError::UnknownOperator {
                    node: node_label(node, index),
                    op_type: node.op_type.clone(),
                    domain: domain.to_string(),
                    version,
                });
            }
        }
        Ok(())
    }
}

/// Diagnostic label for a node: its name, or `op_type:index` for unnamed
/// nodes.
fn node_label(node: &NodeProto, index: usize) -> String {
    if node.name.is_empty() {
        format!("{}:{}", node.op_type, index)
    } else {
        node.name.clone()
    }
}
