//! Turning call sites into validated, promoted invocations.
//!
//! - [`algorithm::Algorithm`] references a remote algorithm by name
//! - [`custom::CustomFunction`] is a user-defined function literal

pub mod algorithm;
pub mod custom;

use serde_json::json;
use std::sync::Arc;

use crate::core::context::Context;
use crate::core::error::{GraphError, Result};
use crate::core::graph::{Args, Callee, ComputedObject, Invocation, Value};
use crate::core::semantic::Signature;
use crate::core::telemetry::{TraceEntry, TraceKind};

/// Something that can be called to produce an invocation.
pub trait Function: Send + Sync {
    /// The signature calls are validated against.
    fn signature(&self, ctx: &Context) -> Result<Arc<Signature>>;

    /// How invocations of this function refer to it on the wire.
    fn callee(&self) -> Callee;

    /// Calls the function with positional arguments.
    fn call(&self, ctx: &Context, positional: Vec<Value>) -> Result<Value> {
        self.call_with(ctx, positional.into_iter().map(Some).collect())
    }

    /// Calls the function with positional arguments, any of which may be left
    /// undefined to skip an optional parameter.
    fn call_with(&self, ctx: &Context, positional: Vec<Option<Value>>) -> Result<Value> {
        let signature = self.signature(ctx)?;
        let args = name_args(&signature, positional)?;
        self.apply(ctx, args)
    }

    /// Calls the function with named arguments.
    ///
    /// The result is the invocation promoted to the signature's return type.
    fn apply(&self, ctx: &Context, args: Args) -> Result<Value> {
        let signature = self.signature(ctx)?;
        let promoted = promote_args(ctx, &signature, args)?;

        ctx.record(TraceEntry::new(
            TraceKind::Invocation,
            signature.display_name(),
            json!(promoted.iter().map(|(name, _)| name).collect::<Vec<_>>()),
        ));

        let invocation = Invocation::new(self.callee(), promoted);
        ctx.promote(
            Value::Computed(ComputedObject::invocation(invocation)),
            &signature.returns,
        )
    }
}

/// Maps positional values onto parameter names in declaration order.
pub(crate) fn name_args(signature: &Signature, positional: Vec<Option<Value>>) -> Result<Args> {
    if positional.len() > signature.args.len() {
        return Err(GraphError::TooManyArguments {
            function: signature.display_name().to_string(),
            expected: signature.args.len(),
            given: positional.len(),
        });
    }

    let mut args = Args::new();
    for (spec, value) in signature.args.iter().zip(positional) {
        args.insert(spec.name.clone(), value);
    }
    Ok(args)
}

/// Validates named arguments against `signature` and promotes each one to its
/// declared type. The result is in declaration order.
///
/// Missing required parameters are reported in declaration order, one at a
/// time. Unrecognized names are reported together, after every declared
/// parameter has been checked.
pub(crate) fn promote_args(
    ctx: &Context,
    signature: &Signature,
    args: Args,
) -> Result<Vec<(String, Value)>> {
    let mut remaining = args.into_entries();
    let mut promoted = Vec::with_capacity(signature.args.len());

    for spec in &signature.args {
        match remaining.remove(&spec.name).flatten() {
            Some(value) => {
                promoted.push((spec.name.clone(), ctx.promote(value, &spec.type_name)?));
            }
            None if spec.optional => {}
            None => {
                return Err(GraphError::MissingRequiredArgument {
                    function: signature.display_name().to_string(),
                    argument: spec.name.clone(),
                });
            }
        }
    }

    if !remaining.is_empty() {
        return Err(GraphError::UnrecognizedArgument {
            function: signature.display_name().to_string(),
            arguments: remaining.into_keys().collect(),
        });
    }

    Ok(promoted)
}
