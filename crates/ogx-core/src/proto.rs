//! Wire format for the ogx model envelope.
//!
//! The envelope is a schema-described protobuf message, defined here as
//! hand-written `prost` structs rather than generated from a `.proto` file.
//! The message set is small and stable enough that keeping the definitions
//! in Rust avoids a build-time codegen step entirely.
//!
//! Field tags are part of the format contract and must never be reused or
//! renumbered. Unknown fields are skipped on decode, so readers stay
//! forward compatible with envelopes written by newer producers.
//!
//! `ir_version` and `model_version` are `optional` on the wire: an absent
//! field means "unknown/none" and is distinct from an explicit `0`.

use prost::Message;

/// Top-level serialized model record.
///
/// Holds identity and provenance, the opset imports the model was authored
/// against, named function sub-programs, and the main graph.
#[derive(Clone, PartialEq, Message)]
pub struct ModelProto {
    /// Format revision the model was written with. Absent means unknown.
    #[prost(int64, optional, tag = "1")]
    pub ir_version: Option<i64>,
    /// Tool that produced the model.
    #[prost(string, tag = "2")]
    pub producer_name: String,
    /// Version of the producing tool.
    #[prost(string, tag = "3")]
    pub producer_version: String,
    /// Reverse-DNS namespace of the model itself (not an operator domain).
    #[prost(string, tag = "4")]
    pub domain: String,
    /// Version of the model. Absent means unknown.
    #[prost(int64, optional, tag = "5")]
    pub model_version: Option<i64>,
    /// Free-form documentation.
    #[prost(string, tag = "6")]
    pub doc_string: String,
    /// The main computation graph. Required for a loadable model.
    #[prost(message, optional, tag = "7")]
    pub graph: Option<GraphProto>,
    /// Operator-set versions the model was authored against.
    /// A loadable model must declare at least one entry.
    #[prost(message, repeated, tag = "8")]
    pub opset_import: Vec<OperatorSetId>,
    /// Named string properties. Keys are unique.
    #[prost(message, repeated, tag = "14")]
    pub metadata_props: Vec<StringStringEntry>,
    /// Named function sub-programs, in declaration order.
    #[prost(message, repeated, tag = "25")]
    pub functions: Vec<FunctionProto>,
}

/// One declared operator-set import: a domain and the version in use.
#[derive(Clone, PartialEq, Message)]
pub struct OperatorSetId {
    /// Operator domain. Empty string is the default domain.
    #[prost(string, tag = "1")]
    pub domain: String,
    /// Operator-set version within the domain.
    #[prost(int64, tag = "2")]
    pub version: i64,
}

/// A key/value metadata entry.
#[derive(Clone, PartialEq, Message)]
pub struct StringStringEntry {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

/// A computation graph: nodes plus the values flowing between them.
#[derive(Clone, PartialEq, Message)]
pub struct GraphProto {
    /// Operator nodes. Must form a DAG over value names.
    #[prost(message, repeated, tag = "1")]
    pub node: Vec<NodeProto>,
    /// Graph name.
    #[prost(string, tag = "2")]
    pub name: String,
    /// Constant tensors baked into the graph. An initializer may share a
    /// name with a graph input, in which case it acts as its default.
    #[prost(message, repeated, tag = "5")]
    pub initializer: Vec<TensorProto>,
    /// Free-form documentation.
    #[prost(string, tag = "10")]
    pub doc_string: String,
    /// Values the graph consumes.
    #[prost(message, repeated, tag = "11")]
    pub input: Vec<ValueInfoProto>,
    /// Values the graph produces.
    #[prost(message, repeated, tag = "12")]
    pub output: Vec<ValueInfoProto>,
}

/// A single operator invocation inside a graph.
#[derive(Clone, PartialEq, Message)]
pub struct NodeProto {
    /// Names of consumed values. An empty string marks an omitted
    /// optional input.
    #[prost(string, repeated, tag = "1")]
    pub input: Vec<String>,
    /// Names of produced values. Each name may be produced only once
    /// within a graph.
    #[prost(string, repeated, tag = "2")]
    pub output: Vec<String>,
    /// Optional node name, used in diagnostics.
    #[prost(string, tag = "3")]
    pub name: String,
    /// Operator (or model-local function) being invoked.
    #[prost(string, tag = "4")]
    pub op_type: String,
    /// Operator attributes.
    #[prost(message, repeated, tag = "5")]
    pub attribute: Vec<AttributeProto>,
    /// Free-form documentation.
    #[prost(string, tag = "6")]
    pub doc_string: String,
    /// Operator domain. Empty string is the default domain.
    #[prost(string, tag = "7")]
    pub domain: String,
}

/// A named constant tensor.
#[derive(Clone, PartialEq, Message)]
pub struct TensorProto {
    /// Shape of the tensor.
    #[prost(int64, repeated, tag = "1")]
    pub dims: Vec<i64>,
    /// Element type discriminant.
    #[prost(int32, tag = "2")]
    pub data_type: i32,
    /// Value name this tensor provides.
    #[prost(string, tag = "8")]
    pub name: String,
    /// Little-endian element payload.
    #[prost(bytes = "vec", tag = "9")]
    pub raw_data: Vec<u8>,
}

/// Name and type of a value crossing the graph boundary.
#[derive(Clone, PartialEq, Message)]
pub struct ValueInfoProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub r#type: Option<TypeProto>,
    #[prost(string, tag = "3")]
    pub doc_string: String,
}

/// Tensor type: element type plus a (possibly partial) shape.
#[derive(Clone, PartialEq, Message)]
pub struct TypeProto {
    /// Element type discriminant.
    #[prost(int32, tag = "1")]
    pub elem_type: i32,
    /// Known dimensions. `-1` marks a dynamic dimension.
    #[prost(int64, repeated, tag = "2")]
    pub dims: Vec<i64>,
}

/// A named operator attribute. Exactly one value field is expected to be
/// set; the container layer carries attributes opaquely and leaves their
/// interpretation to operator schemas.
#[derive(Clone, PartialEq, Message)]
pub struct AttributeProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(float, optional, tag = "2")]
    pub f: Option<f32>,
    #[prost(int64, optional, tag = "3")]
    pub i: Option<i64>,
    #[prost(string, optional, tag = "4")]
    pub s: Option<String>,
    #[prost(float, repeated, tag = "7")]
    pub floats: Vec<f32>,
    #[prost(int64, repeated, tag = "8")]
    pub ints: Vec<i64>,
    #[prost(string, repeated, tag = "9")]
    pub strings: Vec<String>,
}

/// A named, reusable sub-program stored alongside the main graph.
#[derive(Clone, PartialEq, Message)]
pub struct FunctionProto {
    /// Function name. Nodes invoke the function through this name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Names of consumed values.
    #[prost(string, repeated, tag = "4")]
    pub input: Vec<String>,
    /// Names of produced values.
    #[prost(string, repeated, tag = "5")]
    pub output: Vec<String>,
    /// Function body.
    #[prost(message, repeated, tag = "7")]
    pub node: Vec<NodeProto>,
    /// Free-form documentation.
    #[prost(string, tag = "8")]
    pub doc_string: String,
    /// Operator-set versions the body was authored against.
    #[prost(message, repeated, tag = "9")]
    pub opset_import: Vec<OperatorSetId>,
    /// Domain the function itself belongs to.
    #[prost(string, tag = "10")]
    pub domain: String,
}
