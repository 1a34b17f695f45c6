//! End-to-end encoding behaviour: deduplication, scope ordering and the
//! single-node collapse.

mod common;

use exprgraph::prelude::*;
use exprgraph::{JsonValue, Serializer};
use pretty_assertions::assert_eq;
use serde_json::json;

fn value_ref(slot: &str) -> JsonValue {
    json!({"type": "ValueRef", "value": slot})
}

fn filter_eq(ctx: &Context) -> Value {
    ctx.apply("Filter.eq", Args::new().with("name", "x").with("value", 1))
        .unwrap()
}

/// Every `ValueRef` slot name reachable inside `node`.
fn refs_in(node: &JsonValue, out: &mut Vec<usize>) {
    match node {
        JsonValue::Array(items) => items.iter().for_each(|item| refs_in(item, out)),
        JsonValue::Object(entries) => {
            if entries.get("type") == Some(&json!("ValueRef")) {
                let slot = entries["value"].as_str().unwrap();
                out.push(slot.parse().unwrap());
            }
            entries.values().for_each(|v| refs_in(v, out));
        }
        _ => {}
    }
}

fn complex_graph(ctx: &Context) -> Value {
    let image = ctx.promote(Value::from("USGS/SRTMGL1_003"), "Image").unwrap();
    let doubled = image
        .as_computed()
        .unwrap()
        .invoke(ctx, "add", vec![image.clone()])
        .unwrap();
    let squared = doubled
        .as_computed()
        .unwrap()
        .invoke(ctx, "multiply", vec![doubled.clone()])
        .unwrap();
    let collection = ctx.promote(Value::from("COPERNICUS/S2"), "ImageCollection").unwrap();
    let mapper = CustomFunction::trace(ctx, &[("img", "Image")], Some("Image"), |ctx, args| {
        let img = args[0].as_computed().unwrap();
        img.invoke(ctx, "add", vec![Value::from("USGS/SRTMGL1_003")])
    })
    .unwrap();
    let mapped = collection
        .as_computed()
        .unwrap()
        .invoke(ctx, "map", vec![Value::Function(mapper)])
        .unwrap();
    Value::List(vec![squared, mapped, Value::from(json!({"a": [1, 2], "b": [1, 2]}))])
}

#[test]
fn test_identical_filters_share_one_slot() {
    let ctx = common::context();
    let and = ctx
        .apply(
            "Filter.and",
            Args::new().with("filters", vec![filter_eq(&ctx), filter_eq(&ctx)]),
        )
        .unwrap();

    assert_eq!(
        ctx.encode(&and).unwrap(),
        json!({
            "type": "CompoundValue",
            "scope": [
                ["0", {
                    "type": "Invocation",
                    "arguments": {"name": "x", "value": 1},
                    "functionName": "Filter.eq"
                }],
                ["1", [value_ref("0"), value_ref("0")]],
                ["2", {
                    "type": "Invocation",
                    "arguments": {"filters": value_ref("1")},
                    "functionName": "Filter.and"
                }]
            ],
            "value": value_ref("2")
        })
    );
}

#[test]
fn test_encoding_is_deterministic() {
    let ctx = common::context();
    let graph = complex_graph(&ctx);
    let first = ctx.to_json_string(&graph).unwrap();
    let second = ctx.to_json_string(&graph).unwrap();
    assert_eq!(first, second);

    // A structurally identical graph built from scratch encodes identically too.
    let rebuilt = ctx.to_json_string(&complex_graph(&ctx)).unwrap();
    assert_eq!(first, rebuilt);
}

#[test]
fn test_scope_is_topologically_ordered() {
    let ctx = common::context();
    let wire = ctx.encode(&complex_graph(&ctx)).unwrap();
    let scope = wire["scope"].as_array().unwrap();
    assert!(scope.len() > 5);

    for (i, entry) in scope.iter().enumerate() {
        assert_eq!(entry[0], json!(i.to_string()));
        let mut refs = Vec::new();
        refs_in(&entry[1], &mut refs);
        for slot in refs {
            assert!(slot < i, "slot {} refers forward to {}", i, slot);
        }
    }
}

#[test]
fn test_scope_has_no_duplicate_nodes() {
    let ctx = common::context();
    let wire = ctx.encode(&complex_graph(&ctx)).unwrap();
    let nodes: Vec<String> = wire["scope"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry[1].to_string())
        .collect();
    let mut unique = nodes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), nodes.len());
}

#[test]
fn test_single_node_is_not_wrapped() {
    let ctx = common::context();
    let image = ctx.call("Image.load", vec!["srtm".into()]).unwrap();
    assert_eq!(
        ctx.encode(&image).unwrap(),
        json!({
            "type": "Invocation",
            "arguments": {"id": "srtm"},
            "functionName": "Image.load"
        })
    );
}

#[test]
fn test_dictionary_host_value() {
    let value = Value::from(json!({"a": 1, "b": "s"}));
    assert_eq!(
        Serializer::encode_readable(&value).unwrap(),
        json!({"type": "Dictionary", "value": {"a": 1, "b": "s"}})
    );
}

#[test]
fn test_diamond_is_shared_in_compound_and_repeated_in_readable() {
    let ctx = common::context();
    let base = ctx.call("Image.load", vec!["srtm".into()]).unwrap();
    let left = base
        .as_computed()
        .unwrap()
        .invoke(&ctx, "add", vec![base.clone()])
        .unwrap();
    let top = left
        .as_computed()
        .unwrap()
        .invoke(&ctx, "multiply", vec![left.clone()])
        .unwrap();

    let compound = ctx.encode(&top).unwrap();
    assert_eq!(compound["scope"].as_array().unwrap().len(), 3);
    assert_eq!(
        compound["scope"][1][1]["arguments"],
        json!({"image1": value_ref("0"), "image2": value_ref("0")})
    );

    let readable = ctx.encode_readable(&top).unwrap();
    let load = json!({
        "type": "Invocation",
        "arguments": {"id": "srtm"},
        "functionName": "Image.load"
    });
    assert_eq!(
        readable["arguments"]["image1"]["arguments"]["image2"],
        load
    );
    assert_eq!(
        readable["arguments"]["image2"]["arguments"]["image1"],
        load
    );
}

#[test]
fn test_function_literal_in_compound_mode() {
    let ctx = common::context();
    let collection = ctx.promote(Value::from("COPERNICUS/S2"), "ImageCollection").unwrap();
    let mapper = CustomFunction::trace(&ctx, &[("img", "Image")], Some("Image"), |ctx, args| {
        args[0].as_computed().unwrap().invoke(ctx, "add", vec![args[0].clone()])
    })
    .unwrap();
    let mapped = collection
        .as_computed()
        .unwrap()
        .invoke(&ctx, "map", vec![Value::Function(mapper)])
        .unwrap();

    let wire = ctx.encode(&mapped).unwrap();
    let scope = wire["scope"].as_array().unwrap();
    let function = scope
        .iter()
        .find(|entry| entry[1]["type"] == "Function")
        .unwrap();
    assert_eq!(function[1]["argumentNames"], json!(["img"]));
    assert_eq!(function[1]["body"]["type"], "ValueRef");

    let arg_ref = scope
        .iter()
        .find(|entry| entry[1]["type"] == "ArgumentRef")
        .unwrap();
    assert_eq!(arg_ref[1]["value"], "img");
    assert_eq!(wire["value"], value_ref(&(scope.len() - 1).to_string()));
}

#[test]
fn test_callbacks_fail_to_encode() {
    let ctx = common::context();
    let value = Value::List(vec![Value::callback(|_, _| Ok(Value::Null))]);
    assert!(matches!(
        ctx.encode(&value),
        Err(GraphError::EncodingFailure(_))
    ));
}
