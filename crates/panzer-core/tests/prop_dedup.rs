//! Property-based tests for the compile pipeline.
//!
//! Uses `proptest` to generate small JSON documents over a narrow alphabet,
//! so equal subtrees show up often, and checks that:
//!
//! - compilation is deterministic
//! - no two graph nodes are equal (every distinct value is declared once)
//! - every object's entries are sorted by key bytes with no duplicates
//! - the graph reconstructs the input document
//! - string packing changes the layout but not the graph
use std::collections::HashSet;

use panzer_core::value::Value as Node;
use panzer_core::{compile, CompileOptions, Document, Handle, ValueGraph};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ============================================================================
// Strategies
// ============================================================================

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-3i64..3).prop_map(|n| json!(n)),
        "[ab\"\\\\\n]{0,2}".prop_map(Value::String),
    ]
}

fn arb_json_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-c]{1,2}", inner), 0..4)
                .prop_map(|members| Value::Object(members.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn rebuild(graph: &ValueGraph, handle: Handle) -> Value {
    match graph.get(handle) {
        Node::Null => Value::Null,
        Node::Bool(b) => Value::Bool(*b),
        Node::Number(n) => json!(n.int_value),
        Node::String(s) => Value::String(s.text.clone()),
        Node::Array(items) => Value::Array(items.iter().map(|&h| rebuild(graph, h)).collect()),
        Node::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|&(k, v)| (graph.string(k).unwrap().to_string(), rebuild(graph, v)))
                .collect(),
        ),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn compile_is_deterministic(value in arb_json_value()) {
        let doc = Document::from(value);
        let options = CompileOptions::default();
        let a = compile(&doc, &options).unwrap();
        let b = compile(&doc, &options).unwrap();
        prop_assert_eq!(a.definitions, b.definitions);
        prop_assert_eq!(a.declarations, b.declarations);
    }

    #[test]
    fn every_node_is_distinct(value in arb_json_value()) {
        let out = compile(&Document::from(value), &CompileOptions::default()).unwrap();
        let mut seen = HashSet::new();
        for (_, node) in out.graph.iter() {
            prop_assert!(seen.insert(format!("{node:?}")), "duplicate node {:?}", node);
        }
        prop_assert_eq!(out.graph.len(), out.report.distinct.total());
    }

    #[test]
    fn object_entries_strictly_sorted(value in arb_json_value()) {
        let out = compile(&Document::from(value), &CompileOptions::default()).unwrap();
        for (_, node) in out.graph.iter() {
            if let Node::Object(entries) = node {
                let keys: Vec<&str> = entries
                    .iter()
                    .map(|(k, _)| out.graph.string(*k).unwrap())
                    .collect();
                prop_assert!(keys.windows(2).all(|w| w[0].as_bytes() < w[1].as_bytes()));
            }
        }
    }

    #[test]
    fn children_declared_before_parents(value in arb_json_value()) {
        let out = compile(&Document::from(value), &CompileOptions::default()).unwrap();
        for (handle, node) in out.graph.iter() {
            match node {
                Node::Array(items) => {
                    prop_assert!(items.iter().all(|&h| h < handle));
                }
                Node::Object(entries) => {
                    prop_assert!(entries.iter().all(|&(k, v)| k < handle && v < handle));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn graph_reconstructs_document(value in arb_json_value()) {
        let out = compile(&Document::from(value.clone()), &CompileOptions::default()).unwrap();
        prop_assert_eq!(rebuild(&out.graph, out.root), value);
    }

    #[test]
    fn packing_preserves_graph(value in arb_json_value()) {
        let doc = Document::from(value);
        let plain = compile(&doc, &CompileOptions::default()).unwrap();
        let packed = compile(&doc, &CompileOptions { pack_strings: true, ..CompileOptions::default() }).unwrap();
        prop_assert_eq!(format!("{:?}", plain.graph), format!("{:?}", packed.graph));
        prop_assert!(packed.report.emitted_declarations <= plain.report.emitted_declarations);
        let has_strings = plain.report.distinct.string > 0;
        prop_assert_eq!(packed.definitions.contains("struct PackedStrings"), has_strings);
    }
}
