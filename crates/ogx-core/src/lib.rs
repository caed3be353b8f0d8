//! Core data model for the ogx computation-graph format.
//!
//! - [`proto`]: the schema-described wire format (hand-written prost
//!   messages)
//! - [`domain`]: operator-domain canonicalization and format constants
//! - [`registry`]: the operator-schema registry aggregator
//! - [`graph`]: the graph under construction and its resolution pass
//! - [`error`]: GraphError enum with resolution failure modes
//!
//! The model container layer (`ogx-model`) builds on these pieces; this
//! crate has no file I/O of its own.

pub mod domain;
pub mod error;
pub mod graph;
pub mod proto;
pub mod registry;

// Re-export commonly used types
pub use domain::{
    is_default_domain, normalize_domain, CURRENT_IR_VERSION, DEFAULT_DOMAIN, DEFAULT_DOMAIN_ALIAS,
    MIN_GUARANTEED_OPSET,
};
pub use error::GraphError;
pub use graph::Graph;
pub use proto::{
    AttributeProto, FunctionProto, GraphProto, ModelProto, NodeProto, OperatorSetId,
    StringStringEntry, TensorProto, TypeProto, ValueInfoProto,
};
pub use registry::{OpSchema, OpSetSource, SchemaRegistry, SchemaSource, SharedSchemaSource};
