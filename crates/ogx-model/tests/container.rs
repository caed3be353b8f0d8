//! End-to-end tests for the model container.
//!
//! Each test builds a model through the public API, pushes it through the
//! load/save pipeline, and verifies the reconciled state on the other
//! side.
//!
//! Tests cover:
//! - Fresh build -> save -> load round trip across entry points
//! - Declared-version authority and registry backfill on load
//! - Legacy alias-spelled envelopes
//! - Structural rejection ahead of resolution
//! - Custom-domain models backed by a local schema source

use std::collections::HashMap;
use std::sync::Arc;

use prost::Message;

use ogx_core::domain::{DEFAULT_DOMAIN, DEFAULT_DOMAIN_ALIAS};
use ogx_core::proto::{
    FunctionProto, GraphProto, ModelProto, NodeProto, OperatorSetId, ValueInfoProto,
};
use ogx_core::registry::{OpSchema, OpSetSource, SharedSchemaSource, BUILTIN_OPSET_VERSION};
use ogx_model::{ErrorKind, Model, ModelMetadata};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn value(name: &str) -> ValueInfoProto {
    ValueInfoProto {
        name: name.into(),
        ..Default::default()
    }
}

fn node(op_type: &str, domain: &str, inputs: &[&str], outputs: &[&str]) -> NodeProto {
    NodeProto {
        input: inputs.iter().map(|s| (*s).into()).collect(),
        output: outputs.iter().map(|s| (*s).into()).collect(),
        op_type: op_type.into(),
        domain: domain.into(),
        ..Default::default()
    }
}

/// A local source providing one custom-domain operator.
fn acme_source() -> SharedSchemaSource {
    Arc::new(OpSetSource::new(vec![OpSchema {
        op_type: "Quantize".into(),
        domain: "com.acme".into(),
        since_version: 2,
        doc: String::new(),
    }]))
}

/// A fresh two-node default-domain model with provenance and metadata.
fn build_sample() -> Model {
    let mut metadata = ModelMetadata::new();
    metadata.insert("task".into(), "classification".into());

    let mut model = Model::new(
        "net",
        true,
        metadata,
        Vec::new(),
        HashMap::new(),
        Vec::new(),
    )
    .unwrap();
    model.set_producer_name("ogx-it");
    model.set_model_version(1);

    let graph = model.graph_mut().proto_mut();
    graph.input.push(value("x"));
    graph.output.push(value("y"));
    graph.node.push(node("Relu", "", &["x"], &["h"]));
    graph.node.push(node("Softmax", "", &["h"], &["y"]));
    model
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn save_load_round_trip_preserves_reconciled_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.ogx");

    let mut model = build_sample();
    model.save_to_file(&path).unwrap();
    let loaded = Model::load_from_file(&path, Vec::new()).unwrap();

    assert_eq!(loaded.producer_name(), "ogx-it");
    assert_eq!(loaded.model_version(), Some(1));
    assert_eq!(
        loaded.metadata().get("task"),
        Some(&"classification".to_string())
    );
    assert_eq!(loaded.domain_versions(), model.domain_versions());
    assert_eq!(loaded.graph().proto().node.len(), 2);
    assert!(loaded.graph().is_resolved());
}

#[test]
fn byte_and_file_entry_points_agree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.ogx");

    let mut model = build_sample();
    model.save_to_file(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let from_bytes = Model::load_from_bytes(&bytes, Vec::new()).unwrap();
    let from_file = Model::load_from_file(&path, Vec::new()).unwrap();

    assert_eq!(from_bytes.to_proto(), from_file.to_proto());
}

#[test]
fn custom_domain_model_needs_its_source_on_load() {
    let mut model = Model::new(
        "quantized",
        false,
        ModelMetadata::new(),
        vec![acme_source()],
        HashMap::new(),
        Vec::new(),
    )
    .unwrap();
    let graph = model.graph_mut().proto_mut();
    graph.input.push(value("x"));
    graph.output.push(value("y"));
    graph.node.push(node("Quantize", "com.acme", &["x"], &["y"]));

    let bytes = model.to_proto().encode_to_vec();

    // Without the source the operator cannot be resolved.
    let err = Model::load_from_bytes(&bytes, Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResolutionFailure);

    // With it, the model loads and keeps the declared custom version.
    let loaded = Model::load_from_bytes(&bytes, vec![acme_source()]).unwrap();
    assert_eq!(loaded.domain_versions().get("com.acme"), Some(&2));
}

// ---------------------------------------------------------------------------
// Version reconciliation on load
// ---------------------------------------------------------------------------

#[test]
fn legacy_alias_envelope_keeps_declared_version() {
    let envelope = ModelProto {
        graph: Some(GraphProto {
            name: "legacy".into(),
            ..Default::default()
        }),
        opset_import: vec![OperatorSetId {
            domain: DEFAULT_DOMAIN_ALIAS.into(),
            version: 6,
        }],
        ..Default::default()
    };

    let loaded = Model::load_from_bytes(&envelope.encode_to_vec(), Vec::new()).unwrap();
    // Declared version is authoritative under the canonical spelling,
    // even below the guaranteed floor.
    assert_eq!(loaded.domain_versions().get(DEFAULT_DOMAIN), Some(&6));
    assert_eq!(loaded.opset_imports().len(), 1);
}

#[test]
fn load_backfills_registry_domains_into_the_envelope() {
    let envelope = ModelProto {
        graph: Some(GraphProto::default()),
        opset_import: vec![OperatorSetId {
            domain: "com.acme".into(),
            version: 2,
        }],
        ..Default::default()
    };

    let loaded = Model::load_from_bytes(&envelope.encode_to_vec(), vec![acme_source()]).unwrap();
    assert_eq!(
        loaded.domain_versions().get(DEFAULT_DOMAIN),
        Some(&BUILTIN_OPSET_VERSION)
    );
    // Re-exporting shows the appended default-domain record.
    let exported = loaded.to_proto();
    assert!(exported
        .opset_import
        .iter()
        .any(|i| i.domain == DEFAULT_DOMAIN && i.version == BUILTIN_OPSET_VERSION));
}

// ---------------------------------------------------------------------------
// Structural rejection
// ---------------------------------------------------------------------------

#[test]
fn envelope_without_graph_is_rejected_before_resolution() {
    let envelope = ModelProto {
        opset_import: vec![OperatorSetId {
            domain: String::new(),
            version: BUILTIN_OPSET_VERSION,
        }],
        ..Default::default()
    };
    let err = Model::load_from_bytes(&envelope.encode_to_vec(), Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn envelope_without_opset_imports_is_rejected_before_resolution() {
    let envelope = ModelProto {
        graph: Some(GraphProto::default()),
        ..Default::default()
    };
    let err = Model::load_from_bytes(&envelope.encode_to_vec(), Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// ---------------------------------------------------------------------------
// Functions through the pipeline
// ---------------------------------------------------------------------------

#[test]
fn functions_survive_the_round_trip_and_stay_callable() {
    let mut model = build_sample();
    model.add_function(FunctionProto {
        name: "Head".into(),
        input: vec!["a".into()],
        output: vec!["b".into()],
        ..Default::default()
    });
    model
        .graph_mut()
        .proto_mut()
        .node
        .push(node("Head", "", &["y"], &["z"]));

    let bytes = {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fn.ogx");
        model.save_to_file(&path).unwrap();
        std::fs::read(&path).unwrap()
    };

    let loaded = Model::load_from_bytes(&bytes, Vec::new()).unwrap();
    assert!(loaded.find_function("Head").is_some());
    assert!(loaded.graph().is_resolved());
}
