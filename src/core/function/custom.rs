use std::fmt;
use std::sync::Arc;

use crate::core::context::Context;
use crate::core::error::Result;
use crate::core::function::Function;
use crate::core::graph::{Callee, ComputedObject, Value};
use crate::core::semantic::{Signature, UNTYPED};
use crate::core::serializer::Serializer;

const PROVISIONAL_PREFIX: &str = "_MAPPING_VAR_UNBOUND_";
const MAPPING_PREFIX: &str = "_MAPPING_VAR_";

/// A user-defined function literal: parameter names plus a body expression
/// that refers to them through argument references.
///
/// Invocations of a custom function carry the whole literal inline, since it
/// has no global name to reference.
#[derive(Clone)]
pub struct CustomFunction {
    inner: Arc<CustomInner>,
}

struct CustomInner {
    signature: Arc<Signature>,
    body: Value,
}

impl CustomFunction {
    /// Builds a literal from explicit parameter names and a pre-built body.
    /// Every parameter is untyped.
    pub fn new(argument_names: Vec<String>, body: Value) -> Self {
        let signature = argument_names
            .into_iter()
            .fold(Signature::new("", UNTYPED), |sig, name| sig.arg(name, UNTYPED));
        Self::from_parts(signature, body)
    }

    /// Same literal with a declared return type.
    pub fn with_returns(self, returns: impl Into<String>) -> Self {
        let mut signature = (*self.inner.signature).clone();
        signature.returns = returns.into();
        Self::from_parts(signature, self.inner.body.clone())
    }

    /// Builds a literal by calling `body` once with a typed placeholder for
    /// each `(name, type)` parameter and capturing the expression it returns.
    pub fn trace<F>(
        ctx: &Context,
        params: &[(&str, &str)],
        returns: Option<&str>,
        body: F,
    ) -> Result<Self>
    where
        F: Fn(&Context, &[Value]) -> Result<Value>,
    {
        let signature = params
            .iter()
            .fold(Signature::new("", returns.unwrap_or(UNTYPED)), |sig, (name, type_name)| {
                sig.arg(*name, *type_name)
            });
        let vars: Vec<Value> = params
            .iter()
            .map(|(name, type_name)| Self::variable(*type_name, *name))
            .collect();
        let body = body(ctx, &vars)?;
        Ok(Self::from_parts(signature, body))
    }

    /// Like [`CustomFunction::trace`], but generates the parameter names.
    ///
    /// Names are `_MAPPING_VAR_<d>_<i>` where `d` counts the function literals
    /// inside the body, so a literal nested in another never reuses its
    /// enclosing literal's names, and structurally identical bodies get
    /// identical names. `body` is called twice.
    pub fn anonymous<F>(
        ctx: &Context,
        types: &[&str],
        returns: Option<&str>,
        body: F,
    ) -> Result<Self>
    where
        F: Fn(&Context, &[Value]) -> Result<Value>,
    {
        let provisional: Vec<String> = (0..types.len())
            .map(|i| format!("{}{}", PROVISIONAL_PREFIX, i))
            .collect();
        let draft = Self::trace(ctx, &pair(&provisional, types), returns, &body)?;
        let depth = count_function_literals(&Serializer::encode(draft.body())?);

        let names: Vec<String> = (0..types.len())
            .map(|i| format!("{}{}_{}", MAPPING_PREFIX, depth, i))
            .collect();
        Self::trace(ctx, &pair(&names, types), returns, body)
    }

    /// A placeholder standing for parameter `name` of declared type `type_name`.
    pub fn variable(type_name: &str, name: &str) -> Value {
        Value::Computed(ComputedObject::variable(type_name, name))
    }

    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.inner.signature.args.iter().map(|a| a.name.as_str())
    }

    pub fn body(&self) -> &Value {
        &self.inner.body
    }

    pub fn returns(&self) -> &str {
        &self.inner.signature.returns
    }

    /// Address of the shared literal; stable while any clone is alive.
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    fn from_parts(signature: Signature, body: Value) -> Self {
        Self {
            inner: Arc::new(CustomInner {
                signature: Arc::new(signature),
                body,
            }),
        }
    }
}

impl Function for CustomFunction {
    fn signature(&self, _ctx: &Context) -> Result<Arc<Signature>> {
        Ok(self.inner.signature.clone())
    }

    fn callee(&self) -> Callee {
        Callee::Literal(self.clone())
    }
}

impl fmt::Debug for CustomFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunction")
            .field("args", &self.argument_names().collect::<Vec<_>>())
            .field("returns", &self.returns())
            .field("body", &self.inner.body)
            .finish()
    }
}

fn pair<'a>(names: &'a [String], types: &[&'a str]) -> Vec<(&'a str, &'a str)> {
    names
        .iter()
        .map(String::as_str)
        .zip(types.iter().copied())
        .collect()
}

fn count_function_literals(wire: &serde_json::Value) -> usize {
    match wire {
        serde_json::Value::Array(items) => items.iter().map(count_function_literals).sum(),
        serde_json::Value::Object(entries) => {
            let own = usize::from(entries.get("type").and_then(|t| t.as_str()) == Some("Function"));
            own + entries.values().map(count_function_literals).sum::<usize>()
        }
        _ => 0,
    }
}
