//! Built-in promotion rules.
//!
//! Primitive targets (`Number`, `String`, `List`, `Dictionary`, `Boolean`)
//! wrap host values into typed literals. Domain targets (`Image`, `Feature`,
//! ...) keep values that already carry the type, re-tag untyped expressions,
//! and build new invocations from host values they know how to convert.

use crate::core::context::Context;
use crate::core::error::{GraphError, Result};
use crate::core::graph::{Args, ComputedObject, Value};

const NUMBER_ALIASES: [&str; 5] = ["Float", "Long", "Integer", "Short", "Byte"];
const COLLECTIONS: [&str; 3] = ["FeatureCollection", "ImageCollection", "Collection"];
const ELEMENTS: [&str; 3] = ["Element", "Feature", "Image"];

pub(crate) fn register(registry: &mut super::TypeRegistry) {
    registry.register("Object", |_, value| Ok(value));
    registry.register("Number", number);
    for alias in NUMBER_ALIASES {
        registry.alias(alias, "Number");
    }
    registry.register("Boolean", boolean);
    registry.register("String", string);
    registry.register("List", list);
    registry.register("Dictionary", dictionary);
    registry.register("Date", date);
    registry.register("Array", array);
    registry.register("Algorithm", algorithm);
    registry.register("Image", image);
    registry.register("ImageCollection", image_collection);
    registry.register("Geometry", geometry);
    registry.register("Feature", feature);
    registry.register("Element", element);
    registry.register("FeatureCollection", feature_collection);
    registry.alias("Collection", "FeatureCollection");
    registry.register("Filter", filter);
}

fn typed(obj: ComputedObject, type_name: &str) -> Value {
    Value::Computed(obj.cast(type_name))
}

fn literal(type_name: &str, value: Value) -> Value {
    Value::Computed(ComputedObject::literal(type_name, value))
}

fn is_one_of(obj: &ComputedObject, types: &[&str]) -> bool {
    obj.type_name().is_some_and(|t| types.contains(&t))
}

fn promote_all(ctx: &Context, items: Vec<Value>, type_name: &str) -> Result<Vec<Value>> {
    items
        .into_iter()
        .map(|item| ctx.promote(item, type_name))
        .collect()
}

// ============================================================================
// Primitive targets
// ============================================================================

fn number(_ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Number(_) => Ok(literal("Number", value)),
        Value::Computed(obj) => Ok(typed(obj, "Number")),
        other => Err(GraphError::unpromotable("Number", other.describe())),
    }
}

fn boolean(_ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Bool(_) => Ok(value),
        Value::Computed(obj) => Ok(typed(obj, "Boolean")),
        other => Err(GraphError::unpromotable("Boolean", other.describe())),
    }
}

/// Non-string host values pass through unchanged.
fn string(_ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::String(_) => Ok(literal("String", value)),
        Value::Computed(obj) => Ok(typed(obj, "String")),
        other => Ok(other),
    }
}

fn list(_ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::List(_) => Ok(literal("List", value)),
        Value::Computed(obj) => Ok(typed(obj, "List")),
        other => Err(GraphError::unpromotable("List", other.describe())),
    }
}

fn dictionary(_ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Dictionary(_) => Ok(literal("Dictionary", value)),
        Value::Computed(obj) => Ok(typed(obj, "Dictionary")),
        other => Err(GraphError::unpromotable("Dictionary", other.describe())),
    }
}

/// Host dates are sent as milliseconds since the epoch. Numbers and strings
/// are handed to `Date` as-is.
fn date(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Number(_) | Value::String(_) => ctx.apply("Date", Args::new().with("value", value)),
        Value::Date(d) => ctx.apply("Date", Args::new().with("value", d.timestamp_millis())),
        Value::Computed(obj) => Ok(typed(obj, "Date")),
        other => Err(GraphError::unpromotable("Date", other.describe())),
    }
}

fn array(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::List(_) | Value::Number(_) => ctx.apply("Array", Args::new().with("values", value)),
        Value::Computed(obj) => Ok(typed(obj, "Array")),
        other => Err(GraphError::unpromotable("Array", other.describe())),
    }
}

/// Algorithm names and function literals are already callable.
fn algorithm(_ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::String(_) | Value::Function(_) | Value::Computed(_) => Ok(value),
        other => Err(GraphError::unpromotable("Algorithm", other.describe())),
    }
}

// ============================================================================
// Domain targets
// ============================================================================

/// Strings load an asset, numbers make a constant image, lists are combined
/// band by band.
fn image(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Computed(obj) => Ok(typed(obj, "Image")),
        Value::String(id) => ctx.apply("Image.load", Args::new().with("id", id)),
        Value::Number(_) => ctx.apply("Image.constant", Args::new().with("value", value)),
        Value::List(items) => {
            let mut images = items.into_iter().map(|item| ctx.promote(item, "Image"));
            let Some(first) = images.next() else {
                return ctx.apply(
                    "Image.constant",
                    Args::new().with("value", Value::List(Vec::new())),
                );
            };
            images.try_fold(first?, |combined, next| {
                ctx.apply(
                    "Image.addBands",
                    Args::new().with("dstImg", combined).with("srcImg", next?),
                )
            })
        }
        other => Err(GraphError::unpromotable("Image", other.describe())),
    }
}

fn image_collection(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Computed(obj) => Ok(typed(obj, "ImageCollection")),
        Value::String(id) => ctx.apply("ImageCollection.load", Args::new().with("id", id)),
        Value::List(items) => {
            let images = promote_all(ctx, items, "Image")?;
            ctx.apply("ImageCollection.fromImages", Args::new().with("images", images))
        }
        other => Err(GraphError::unpromotable("ImageCollection", other.describe())),
    }
}

/// GeoJSON geometries map onto `GeometryConstructors.<type>`; collections
/// yield their combined geometry.
fn geometry(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Computed(obj) if is_one_of(&obj, &COLLECTIONS) => {
            ctx.apply("Collection.geometry", Args::new().with("collection", obj))
        }
        Value::Computed(obj) => Ok(typed(obj, "Geometry")),
        Value::Dictionary(mut geo_json) => {
            let kind = geo_json.get("type").and_then(Value::as_str).map(str::to_string);
            match (kind, geo_json.remove("coordinates")) {
                (Some(kind), Some(coordinates)) => ctx.apply(
                    &format!("GeometryConstructors.{}", kind),
                    Args::new().with("coordinates", coordinates),
                ),
                _ => Err(GraphError::unpromotable(
                    "Geometry",
                    "Dictionary without GeoJSON type and coordinates",
                )),
            }
        }
        other => Err(GraphError::unpromotable("Geometry", other.describe())),
    }
}

fn feature(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Computed(obj) if is_one_of(&obj, &COLLECTIONS) => {
            let geometry = ctx.apply("Collection.geometry", Args::new().with("collection", obj))?;
            ctx.apply("Feature", Args::new().with("geometry", geometry))
        }
        Value::Computed(obj) if obj.is_a("Geometry") => {
            ctx.apply("Feature", Args::new().with("geometry", obj))
        }
        Value::Computed(obj) => Ok(typed(obj, "Feature")),
        Value::Dictionary(mut geo_json) => {
            if geo_json.get("type").and_then(Value::as_str) != Some("Feature") {
                let geometry = ctx.promote(Value::Dictionary(geo_json), "Geometry")?;
                return ctx.apply("Feature", Args::new().with("geometry", geometry));
            }
            let geometry = geo_json.remove("geometry").unwrap_or(Value::Null);
            let mut args = Args::new().with("geometry", ctx.promote(geometry, "Geometry")?);
            if let Some(properties) = geo_json.remove("properties") {
                args.insert("metadata", Some(properties));
            }
            ctx.apply("Feature", args)
        }
        other => Err(GraphError::unpromotable("Feature", other.describe())),
    }
}

fn element(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Computed(obj) if is_one_of(&obj, &ELEMENTS) => Ok(Value::Computed(obj)),
        Value::Computed(obj) if obj.is_a("Geometry") => ctx.promote(Value::Computed(obj), "Feature"),
        Value::Computed(obj) => Ok(typed(obj, "Element")),
        other => Err(GraphError::unpromotable("Element", other.describe())),
    }
}

/// Strings load a table; single features, geometries and lists of them are
/// wrapped into a collection.
fn feature_collection(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Computed(obj) if is_one_of(&obj, &COLLECTIONS) => Ok(Value::Computed(obj)),
        Value::Computed(obj) if obj.is_a("Feature") || obj.is_a("Geometry") => {
            let feature = ctx.promote(Value::Computed(obj), "Feature")?;
            ctx.apply("Collection", Args::new().with("features", vec![feature]))
        }
        Value::Computed(obj) => Ok(typed(obj, "FeatureCollection")),
        Value::String(table_id) => {
            ctx.apply("Collection.loadTable", Args::new().with("tableId", table_id))
        }
        Value::List(items) => {
            let features = promote_all(ctx, items, "Feature")?;
            ctx.apply("Collection", Args::new().with("features", features))
        }
        Value::Dictionary(_) => {
            let feature = ctx.promote(value, "Feature")?;
            ctx.apply("Collection", Args::new().with("features", vec![feature]))
        }
        other => Err(GraphError::unpromotable("FeatureCollection", other.describe())),
    }
}

/// A list of filters is their conjunction.
fn filter(ctx: &Context, value: Value) -> Result<Value> {
    match value {
        Value::Computed(obj) => Ok(typed(obj, "Filter")),
        Value::List(mut items) if items.len() == 1 => ctx.promote(items.remove(0), "Filter"),
        Value::List(items) if !items.is_empty() => {
            let filters = promote_all(ctx, items, "Filter")?;
            ctx.apply("Filter.and", Args::new().with("filters", filters))
        }
        other => Err(GraphError::unpromotable("Filter", other.describe())),
    }
}
