//! Core error types for ogx-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! the failure modes of graph resolution.

use thiserror::Error;

/// Errors produced by graph resolution.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node input is not satisfied by any graph input, initializer, or
    /// node output.
    #[error("node '{node}': input '{input}' is not produced by any node, graph input, or initializer")]
    MissingInput { node: String, input: String },

    /// The same value name is produced more than once.
    #[error("value '{name}' is produced more than once")]
    DuplicateProducer { name: String },

    /// The node data flow is not a DAG.
    #[error("graph contains a cycle through node '{node}'")]
    CycleDetected { node: String },

    /// A node uses a domain with no resolved opset version.
    #[error("node '{node}': domain '{domain}' has no resolved opset version")]
    UnknownDomain { node: String, domain: String },

    /// No schema exists for an operator at the resolved opset version.
    #[error("node '{node}': no schema for operator '{op_type}' in domain '{domain}' at opset version {version}")]
    UnknownOperator {
        node: String,
        op_type: String,
        domain: String,
        version: i64,
    },
}
