use chrono::{DateTime, Utc};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::context::Context;
use crate::core::error::Result;
use crate::core::function::custom::CustomFunction;
use crate::core::graph::computed::ComputedObject;

/// A host closure held inside a graph value. It has no wire form: encoding
/// drops it from dictionaries and fails with an encoding error anywhere else.
/// Use [`CustomFunction::trace`] to turn a closure into a function literal.
pub type Callback = Arc<dyn Fn(&Context, &[Value]) -> Result<Value> + Send + Sync>;

/// Anything that can appear in an expression graph.
///
/// Plain host data (`Null` through `Dictionary`) sits next to the graph nodes
/// proper: computed objects (invocations, argument references, typed literals)
/// and function literals.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    List(Vec<Value>),
    Dictionary(BTreeMap<String, Value>),
    Computed(ComputedObject),
    Function(CustomFunction),
    Callback(Callback),
}

impl Value {
    /// Wraps a host closure.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Callback(Arc::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_computed(&self) -> Option<&ComputedObject> {
        match self {
            Value::Computed(obj) => Some(obj),
            _ => None,
        }
    }

    /// True when this value already carries the capability set of `type_name`.
    pub fn is_instance_of(&self, type_name: &str) -> bool {
        self.as_computed().is_some_and(|obj| obj.is_a(type_name))
    }

    /// Short human-readable description, used in error messages and traces.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => format!("Bool {}", b),
            Value::Number(n) => format!("Number {}", n),
            Value::String(s) => format!("String {:?}", s),
            Value::Date(d) => format!("Date {}", d.to_rfc3339()),
            Value::List(items) => format!("List of {} items", items.len()),
            Value::Dictionary(entries) => format!("Dictionary with {} keys", entries.len()),
            Value::Computed(obj) => match obj.type_name() {
                Some(t) => format!("computed {}", t),
                None => "computed Object".to_string(),
            },
            Value::Function(_) => "function literal".to_string(),
            Value::Callback(_) => "host callback".to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Dictionary(entries) => f.debug_tuple("Dictionary").field(entries).finish(),
            Value::Computed(obj) => f.debug_tuple("Computed").field(obj).finish(),
            Value::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Value::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::from(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Dictionary(entries)
    }
}

impl From<ComputedObject> for Value {
    fn from(obj: ComputedObject) -> Self {
        Value::Computed(obj)
    }
}

impl From<CustomFunction> for Value {
    fn from(func: CustomFunction) -> Self {
        Value::Function(func)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Dictionary(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
