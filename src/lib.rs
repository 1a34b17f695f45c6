//! # exprgraph
//!
//! Build a graph of deferred "invoke this named remote algorithm with these
//! arguments" nodes in-process, then flatten it into a compact JSON wire
//! format for a remote evaluator.
//!
//! ## Features
//!
//! - **Validated Call Sites**: Positional and named arguments are bound against
//!   the algorithm's signature; missing, surplus and unknown arguments are errors
//! - **Pluggable Type Promotion**: Host values become typed domain objects
//!   (`"USGS/SRTMGL1_003"` as an `Image` parameter loads that image)
//! - **Function Literals**: Trace a Rust closure against typed placeholders to
//!   build a user-defined function the evaluator can run
//! - **Deduplicated Encoding**: Structurally identical sub-expressions are sent once
//!
//! ## Quick Start
//!
//! ```rust
//! use exprgraph::prelude::*;
//! use exprgraph::signature;
//!
//! let ctx = Context::new(SignatureRegistry::from_signatures([
//!     signature!("Filter.eq(name: String, value: Object) -> Filter"),
//!     signature!("Filter.and(filters: List) -> Filter"),
//! ]));
//!
//! let eq = ctx.apply("Filter.eq", Args::new().with("name", "x").with("value", 1)).unwrap();
//! let both = ctx.apply("Filter.and", Args::new().with("filters", vec![eq.clone(), eq])).unwrap();
//!
//! let wire = ctx.encode(&both).unwrap();
//! assert_eq!(wire["type"], "CompoundValue");
//! ```
//!
//! ## Module Organization
//!
//! - [`prelude`]: Commonly used types and traits (import with `use exprgraph::prelude::*`)
//! - [`Serializer`]: Compound and readable wire encodings
//! - [`TypeRegistry`]: The standard promotion rules and how to extend them

// ============================================================================
// Core Module
// ============================================================================

mod core;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Context and errors
pub use crate::core::context::{Context, ContextBuilder};
pub use crate::core::error::{GraphError, Result};

// Node model
pub use crate::core::graph::{Args, Callback, Callee, ComputedObject, Expr, Invocation, Value};

// Signatures
pub use crate::core::semantic::{ArgSpec, Signature, SignatureRegistry, SignatureSource, UNTYPED};

// Functions
pub use crate::core::function::Function;
pub use crate::core::function::algorithm::Algorithm;
pub use crate::core::function::custom::CustomFunction;

// Promotion
pub use crate::core::promote::{Promoter, PromotionRule, TypeRegistry, UnknownTypePolicy};

// Serialization
pub use crate::core::serializer::{Serializer, content_hash};

// Telemetry
pub use crate::core::telemetry::{MemoryTelemetry, Telemetry, TraceEntry, TraceKind};

// ============================================================================
// Prelude Module - Convenient Bulk Imports
// ============================================================================

/// The main prelude: everything needed to build and encode graphs.
///
/// # Example
/// ```rust
/// use exprgraph::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        Algorithm, Args, ComputedObject, Context, CustomFunction, Function, GraphError,
        Signature, SignatureRegistry, TypeRegistry, UnknownTypePolicy, Value,
    };
}

// ============================================================================
// Re-export commonly used external types for convenience
// ============================================================================

pub use serde_json::Value as JsonValue;

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
