//! The node model: host values, computed objects and invocations.
//!
//! Graphs are built bottom-up from already-constructed children and are
//! immutable afterwards, so every graph is acyclic by construction.

pub mod computed;
pub mod value;

pub use computed::{Args, Callee, ComputedObject, Expr, Invocation};
pub use value::{Callback, Value};
