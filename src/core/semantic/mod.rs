//! Algorithm signatures and the registry they are resolved from.

pub mod registry;
pub mod signature;

pub use registry::{SignatureRegistry, SignatureSource};
pub use signature::{ArgSpec, Signature, UNTYPED};
