//! Flattening expression graphs into wire JSON.
//!
//! Compound mode (the default) gives every non-primitive node a slot in an
//! ordered scope and refers to it by `ValueRef`. Nodes are deduplicated by the
//! SHA-256 of their canonical wire text, so two distinct nodes with identical
//! encodings share one slot. Children are always slotted before their parent,
//! which makes the scope a topological order.
//!
//! Readable mode inlines everything and never deduplicates. A diamond-shaped
//! graph therefore repeats the shared subtree once per path; that is accepted
//! because the readable form is only for debugging.

use serde_json::{Map, Value as JsonValue, json};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::core::error::{GraphError, Result};
use crate::core::function::custom::CustomFunction;
use crate::core::graph::{Callee, Expr, Invocation, Value};

/// One top-level encode. Holds the scope being built and is consumed by
/// [`Serializer::run`].
pub struct Serializer {
    compound: bool,
    scope: Vec<(String, JsonValue)>,
    /// Content hash -> slot name.
    encoded: HashMap<String, String>,
    /// Node identity -> content hash, for nodes already encoded in this pass.
    hashes: HashMap<usize, String>,
}

impl Serializer {
    pub fn new(compound: bool) -> Self {
        Self {
            compound,
            scope: Vec::new(),
            encoded: HashMap::new(),
            hashes: HashMap::new(),
        }
    }

    /// Compound-encodes `value`.
    pub fn encode(value: &Value) -> Result<JsonValue> {
        Serializer::new(true).run(value)
    }

    /// Encodes `value` with every reference inlined.
    pub fn encode_readable(value: &Value) -> Result<JsonValue> {
        Serializer::new(false).run(value)
    }

    pub fn run(mut self, value: &Value) -> Result<JsonValue> {
        let encoded = self.encode_value(value)?;
        if !self.compound {
            return Ok(encoded);
        }

        if self.scope.len() == 1 && is_value_ref(&encoded) {
            if let Some((_, node)) = self.scope.pop() {
                return Ok(node);
            }
        }

        let scope: Vec<JsonValue> = self
            .scope
            .into_iter()
            .map(|(name, node)| json!([name, node]))
            .collect();
        Ok(json!({
            "type": "CompoundValue",
            "scope": scope,
            "value": encoded
        }))
    }

    fn encode_value(&mut self, value: &Value) -> Result<JsonValue> {
        let identity = match value {
            Value::Null => return Ok(JsonValue::Null),
            Value::Bool(b) => return Ok(JsonValue::Bool(*b)),
            Value::Number(n) => return Ok(JsonValue::Number(n.clone())),
            Value::String(s) => return Ok(JsonValue::String(s.clone())),
            Value::Callback(_) => {
                return Err(GraphError::EncodingFailure(
                    "host callbacks have no wire form".to_string(),
                ));
            }
            Value::Computed(obj) => match obj.expr() {
                Expr::Literal(inner) => return self.encode_value(inner),
                Expr::Invocation(invocation) => Some(Arc::as_ptr(invocation) as *const () as usize),
                Expr::Argument(_) => None,
            },
            Value::Function(func) => Some(func.identity()),
            Value::Date(_) | Value::List(_) | Value::Dictionary(_) => None,
        };

        if self.compound {
            let known = identity
                .and_then(|id| self.hashes.get(&id))
                .and_then(|hash| self.encoded.get(hash));
            if let Some(name) = known {
                return Ok(value_ref(name));
            }
        }

        let node = self.encode_node(value)?;
        if !self.compound {
            return Ok(node);
        }

        let hash = content_hash(&node)?;
        let name = match self.encoded.get(&hash) {
            Some(name) => name.clone(),
            None => {
                let name = self.scope.len().to_string();
                self.scope.push((name.clone(), node));
                self.encoded.insert(hash.clone(), name.clone());
                name
            }
        };
        if let Some(id) = identity {
            self.hashes.insert(id, hash);
        }
        Ok(value_ref(&name))
    }

    /// The node's own wire form, with children already encoded.
    fn encode_node(&mut self, value: &Value) -> Result<JsonValue> {
        match value {
            Value::Date(date) => Ok(json!({
                "type": "Date",
                "value": date.timestamp_millis() * 1000
            })),
            Value::List(items) => Ok(JsonValue::Array(
                items
                    .iter()
                    .map(|item| self.encode_value(item))
                    .collect::<Result<_>>()?,
            )),
            Value::Dictionary(entries) => self.encode_dictionary(entries),
            Value::Computed(obj) => match obj.expr() {
                Expr::Invocation(invocation) => self.encode_invocation(invocation),
                Expr::Argument(name) => Ok(json!({"type": "ArgumentRef", "value": name})),
                Expr::Literal(inner) => self.encode_value(inner),
            },
            Value::Function(func) => self.encode_function(func),
            other => Err(GraphError::EncodingFailure(format!(
                "{} is not a graph node",
                other.describe()
            ))),
        }
    }

    /// Entries holding host callbacks are dropped.
    fn encode_dictionary(&mut self, entries: &BTreeMap<String, Value>) -> Result<JsonValue> {
        let mut encoded = Map::new();
        for (key, value) in entries {
            if matches!(value, Value::Callback(_)) {
                continue;
            }
            encoded.insert(key.clone(), self.encode_value(value)?);
        }
        Ok(json!({"type": "Dictionary", "value": encoded}))
    }

    fn encode_invocation(&mut self, invocation: &Invocation) -> Result<JsonValue> {
        let mut arguments = Map::new();
        for (name, arg) in invocation.args() {
            arguments.insert(name.clone(), self.encode_value(arg)?);
        }

        let mut node = Map::new();
        node.insert("type".to_string(), json!("Invocation"));
        node.insert("arguments".to_string(), JsonValue::Object(arguments));
        match invocation.callee() {
            Callee::Named(name) => {
                node.insert("functionName".to_string(), json!(name));
            }
            Callee::Literal(func) => {
                let function = self.encode_value(&Value::Function(func.clone()))?;
                node.insert("function".to_string(), function);
            }
        }
        Ok(JsonValue::Object(node))
    }

    fn encode_function(&mut self, func: &CustomFunction) -> Result<JsonValue> {
        let body = self.encode_value(func.body())?;
        Ok(json!({
            "type": "Function",
            "argumentNames": func.argument_names().collect::<Vec<_>>(),
            "body": body
        }))
    }
}

/// SHA-256 over the canonical (compact) JSON text of a wire node.
pub fn content_hash(node: &JsonValue) -> Result<String> {
    let text = serde_json::to_string(node)?;
    Ok(hex::encode(Sha256::digest(text.as_bytes())))
}

fn value_ref(name: &str) -> JsonValue {
    json!({"type": "ValueRef", "value": name})
}

fn is_value_ref(node: &JsonValue) -> bool {
    node.get("type").and_then(JsonValue::as_str) == Some("ValueRef")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::ComputedObject;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dictionary_readable() {
        let value = Value::from(json!({"a": 1, "b": "s"}));
        assert_eq!(
            Serializer::encode_readable(&value).unwrap(),
            json!({"type": "Dictionary", "value": {"a": 1, "b": "s"}})
        );
    }

    #[test]
    fn test_dictionary_drops_callbacks() {
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), Value::from(1));
        entries.insert("f".to_string(), Value::callback(|_, _| Ok(Value::Null)));
        assert_eq!(
            Serializer::encode_readable(&Value::Dictionary(entries)).unwrap(),
            json!({"type": "Dictionary", "value": {"a": 1}})
        );
    }

    #[test]
    fn test_callback_is_an_encoding_failure() {
        let value = Value::List(vec![Value::callback(|_, _| Ok(Value::Null))]);
        assert!(matches!(
            Serializer::encode(&value),
            Err(GraphError::EncodingFailure(_))
        ));
    }

    #[test]
    fn test_date_is_microseconds() {
        let date = chrono::Utc.timestamp_millis_opt(1_234).unwrap();
        assert_eq!(
            Serializer::encode(&Value::Date(date)).unwrap(),
            json!({"type": "Date", "value": 1_234_000})
        );
    }

    #[test]
    fn test_primitive_top_level_in_compound_mode() {
        assert_eq!(
            Serializer::encode(&Value::from(5)).unwrap(),
            json!({"type": "CompoundValue", "scope": [], "value": 5})
        );
        assert_eq!(Serializer::encode_readable(&Value::from(5)).unwrap(), json!(5));
    }

    #[test]
    fn test_literal_wrapper_encodes_as_its_value() {
        let number = Value::Computed(ComputedObject::literal("Number", Value::from(7)));
        assert_eq!(Serializer::encode_readable(&number).unwrap(), json!(7));
        let list = Value::Computed(ComputedObject::literal("List", Value::from(vec![1, 2])));
        assert_eq!(Serializer::encode(&list).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_structurally_equal_lists_share_a_slot() {
        let value = Value::List(vec![Value::from(vec![1]), Value::from(vec![1])]);
        assert_eq!(
            Serializer::encode(&value).unwrap(),
            json!({
                "type": "CompoundValue",
                "scope": [
                    ["0", [1]],
                    ["1", [{"type": "ValueRef", "value": "0"}, {"type": "ValueRef", "value": "0"}]]
                ],
                "value": {"type": "ValueRef", "value": "1"}
            })
        );
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash(&json!({"type": "ArgumentRef", "value": "x"})).unwrap();
        let b = content_hash(&json!({"type": "ArgumentRef", "value": "x"})).unwrap();
        let c = content_hash(&json!({"type": "ArgumentRef", "value": "y"})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
