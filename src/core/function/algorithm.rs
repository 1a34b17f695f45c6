use std::sync::Arc;

use crate::core::context::Context;
use crate::core::error::Result;
use crate::core::function::Function;
use crate::core::graph::Callee;
use crate::core::semantic::Signature;

/// A reference to a remote algorithm by its fully-qualified name.
///
/// The handle holds only the name. Every call resolves the signature from
/// the registry of the context it is called with.
#[derive(Clone)]
pub struct Algorithm {
    name: String,
}

impl Algorithm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Function for Algorithm {
    fn signature(&self, ctx: &Context) -> Result<Arc<Signature>> {
        ctx.signatures().lookup(&self.name)
    }

    fn callee(&self) -> Callee {
        Callee::Named(self.name.clone())
    }
}

impl std::fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Algorithm").field(&self.name).finish()
    }
}
