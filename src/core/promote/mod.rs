//! Type promotion: bridging host values to the declared types of parameters
//! and return values.
//!
//! Promotion and domain construction are mutually recursive: a rule that
//! builds an `Image` from a string does so by applying `Image.load`, whose
//! `id` argument is in turn promoted to `String`. All of it goes through the
//! single dispatch point [`Context::promote`], and every rule returns as soon
//! as the value already carries the target type, which is what bounds the
//! recursion.

pub mod standard;

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::context::Context;
use crate::core::error::{GraphError, Result};
use crate::core::graph::Value;
use crate::core::telemetry::TraceEntry;

/// Maps `(value, declared type name)` to a value of that type's capability set.
pub trait Promoter: Send + Sync {
    fn promote(&self, ctx: &Context, value: Value, type_name: &str) -> Result<Value>;
}

impl<F> Promoter for F
where
    F: Fn(&Context, Value, &str) -> Result<Value> + Send + Sync,
{
    fn promote(&self, ctx: &Context, value: Value, type_name: &str) -> Result<Value> {
        self(ctx, value, type_name)
    }
}

/// What to do with a type name no rule is registered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTypePolicy {
    /// Return the value unchanged, with a warning and a trace entry.
    #[default]
    PassThrough,
    /// Fail with [`GraphError::UnpromotableValue`].
    Reject,
}

/// A promotion rule for one type name.
pub type PromotionRule = Arc<dyn Fn(&Context, Value) -> Result<Value> + Send + Sync>;

/// A dispatch table from type name to promotion rule.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    rules: HashMap<String, PromotionRule>,
    policy: UnknownTypePolicy,
}

impl TypeRegistry {
    /// A registry with no rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in rules (see [`standard`]).
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        standard::register(&mut registry);
        registry
    }

    pub fn with_policy(mut self, policy: UnknownTypePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UnknownTypePolicy {
        self.policy
    }

    /// Registers `rule` for `type_name`, replacing any existing rule.
    pub fn register<F>(&mut self, type_name: &str, rule: F)
    where
        F: Fn(&Context, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(type_name, Arc::new(rule));
    }

    /// Makes `alias` promote exactly like `target`.
    pub fn alias(&mut self, alias: &str, target: &str) {
        match self.rules.get(target).cloned() {
            Some(rule) => self.insert(alias, rule),
            None => log::warn!("Cannot alias {} to unregistered type {}", alias, target),
        }
    }

    pub fn knows(&self, type_name: &str) -> bool {
        self.rules.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    fn insert(&mut self, type_name: &str, rule: PromotionRule) {
        if self.rules.insert(type_name.to_string(), rule).is_some() {
            log::warn!("Overwriting promotion rule for type {}", type_name);
        }
    }
}

impl Promoter for TypeRegistry {
    fn promote(&self, ctx: &Context, value: Value, type_name: &str) -> Result<Value> {
        if let Some(rule) = self.rules.get(type_name) {
            return rule(ctx, value);
        }
        match self.policy {
            UnknownTypePolicy::PassThrough => {
                log::warn!(
                    "No promotion rule for type {}, passing {} through",
                    type_name,
                    value.describe()
                );
                ctx.record(TraceEntry::pass_through(type_name, &value));
                Ok(value)
            }
            UnknownTypePolicy::Reject => Err(GraphError::unpromotable(type_name, value.describe())),
        }
    }
}
