use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::context::Context;
use crate::core::error::Result;
use crate::core::function::custom::CustomFunction;
use crate::core::graph::value::Value;
use crate::core::serializer::Serializer;

/// What a computed object stands for.
#[derive(Clone)]
pub enum Expr {
    /// A host value promoted into a typed wrapper (`Number(5)`); encodes as
    /// the wrapped value.
    Literal(Box<Value>),
    /// A deferred call of a remote algorithm or a function literal.
    Invocation(Arc<Invocation>),
    /// A bound parameter inside a function literal's body.
    Argument(String),
}

/// A graph node viewed through the capability set of a declared type.
///
/// The declared type is an explicit tag rather than a Rust type, so an
/// argument placeholder, a promoted literal and an invocation result can all
/// claim to be an `Image` and chain further calls the same way.
#[derive(Clone)]
pub struct ComputedObject {
    type_name: Option<String>,
    expr: Expr,
}

impl ComputedObject {
    pub fn literal(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            type_name: Some(type_name.into()),
            expr: Expr::Literal(Box::new(value)),
        }
    }

    /// An untyped invocation, as produced before return-type promotion.
    pub fn invocation(invocation: Invocation) -> Self {
        Self {
            type_name: None,
            expr: Expr::Invocation(Arc::new(invocation)),
        }
    }

    /// A placeholder standing for parameter `name` of declared type `type_name`.
    pub fn variable(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            expr: Expr::Argument(name.into()),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn is_a(&self, type_name: &str) -> bool {
        self.type_name.as_deref() == Some(type_name)
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.expr, Expr::Argument(_))
    }

    pub fn var_name(&self) -> Option<&str> {
        match &self.expr {
            Expr::Argument(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_invocation(&self) -> Option<&Invocation> {
        match &self.expr {
            Expr::Invocation(invocation) => Some(invocation),
            _ => None,
        }
    }

    /// Re-tags the same expression with another declared type.
    pub fn cast(self, type_name: &str) -> Self {
        if self.is_a(type_name) {
            return self;
        }
        Self {
            type_name: Some(type_name.to_string()),
            expr: self.expr,
        }
    }

    /// Calls `<DeclaredType>.<method>` with `self` as the first positional
    /// argument.
    pub fn invoke(&self, ctx: &Context, method: &str, positional: Vec<Value>) -> Result<Value> {
        let class = self.type_name().unwrap_or("Object");
        let mut args = Vec::with_capacity(positional.len() + 1);
        args.push(Value::Computed(self.clone()));
        args.extend(positional);
        ctx.call(&format!("{}.{}", class, method), args)
    }

    /// Compound-encodes this object into wire JSON text.
    pub fn serialize(&self) -> Result<String> {
        let wire = Serializer::encode(&Value::Computed(self.clone()))?;
        Ok(serde_json::to_string(&wire)?)
    }
}

impl fmt::Debug for ComputedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.type_name().unwrap_or("Object");
        match &self.expr {
            Expr::Literal(value) => write!(f, "{}({:?})", class, value),
            Expr::Invocation(invocation) => write!(f, "{}({:?})", class, invocation),
            Expr::Argument(name) => write!(f, "{}(<{}>)", class, name),
        }
    }
}

/// The function an invocation calls.
#[derive(Clone)]
pub enum Callee {
    /// A registry-resolved remote algorithm, referenced by name on the wire.
    Named(String),
    /// A user-defined function literal, encoded inline as a node.
    Literal(CustomFunction),
}

/// A deferred call: a callee plus its promoted, fully-defined arguments, in
/// the callee's parameter declaration order.
pub struct Invocation {
    callee: Callee,
    args: Vec<(String, Value)>,
}

impl Invocation {
    pub(crate) fn new(callee: Callee, args: Vec<(String, Value)>) -> Self {
        Self { callee, args }
    }

    pub fn callee(&self) -> &Callee {
        &self.callee
    }

    pub fn function_name(&self) -> Option<&str> {
        match &self.callee {
            Callee::Named(name) => Some(name),
            Callee::Literal(_) => None,
        }
    }

    pub fn args(&self) -> &[(String, Value)] {
        &self.args
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name().unwrap_or("<function>");
        f.debug_struct("Invocation")
            .field("function", &name)
            .field("args", &self.args)
            .finish()
    }
}

/// Named call-site arguments.
///
/// An entry set to `None` is present-but-undefined: it does not satisfy a
/// required parameter and never reaches the wire.
#[derive(Clone, Debug, Default)]
pub struct Args {
    entries: BTreeMap<String, Option<Value>>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_unset(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), None);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, Option<Value>> {
        self.entries
    }
}

impl<K, V> FromIterator<(K, V)> for Args
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }
}
