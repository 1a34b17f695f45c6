use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

use crate::core::error::Result;
use crate::core::function::Function;
use crate::core::function::algorithm::Algorithm;
use crate::core::graph::{Args, Value};
use crate::core::promote::{Promoter, TypeRegistry, UnknownTypePolicy};
use crate::core::semantic::SignatureRegistry;
use crate::core::serializer::Serializer;
use crate::core::telemetry::{Telemetry, TraceEntry, TraceKind};

/// Everything graph construction needs to resolve: the signature registry,
/// the promoter, and an optional telemetry sink.
///
/// Cloning is cheap; clones share the same registries.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    signatures: Arc<SignatureRegistry>,
    promoter: Arc<dyn Promoter>,
    telemetry: Option<Arc<dyn Telemetry>>,
}

impl Context {
    /// A context over `signatures` with the standard promotion rules.
    pub fn new(signatures: SignatureRegistry) -> Self {
        Self::builder().signatures(signatures).build()
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    pub fn signatures(&self) -> &SignatureRegistry {
        &self.inner.signatures
    }

    /// Calls the named remote algorithm with positional arguments.
    pub fn call(&self, name: &str, positional: Vec<Value>) -> Result<Value> {
        Algorithm::new(name).call(self, positional)
    }

    /// Calls the named remote algorithm with named arguments.
    pub fn apply(&self, name: &str, args: Args) -> Result<Value> {
        Algorithm::new(name).apply(self, args)
    }

    /// Promotes `value` to the capability set of `type_name`.
    pub fn promote(&self, value: Value, type_name: &str) -> Result<Value> {
        self.inner.promoter.promote(self, value, type_name)
    }

    /// Compound-encodes `value` for the wire.
    pub fn encode(&self, value: &Value) -> Result<JsonValue> {
        let wire = Serializer::encode(value)?;
        let slots = match wire.get("type").and_then(JsonValue::as_str) {
            Some("CompoundValue") => wire["scope"].as_array().map_or(0, Vec::len),
            _ => 1,
        };
        log::debug!("Encoded graph into {} scope slots", slots);
        self.record(TraceEntry::new(
            TraceKind::Encode,
            "compound",
            json!({ "slots": slots }),
        ));
        Ok(wire)
    }

    /// Encodes `value` with every reference inlined, for debugging.
    pub fn encode_readable(&self, value: &Value) -> Result<JsonValue> {
        let wire = Serializer::encode_readable(value)?;
        self.record(TraceEntry::new(TraceKind::Encode, "readable", JsonValue::Null));
        Ok(wire)
    }

    /// The compound encoding as JSON text, ready to hand to a transport.
    pub fn to_json_string(&self, value: &Value) -> Result<String> {
        Ok(serde_json::to_string(&self.encode(value)?)?)
    }

    pub(crate) fn record(&self, entry: TraceEntry) {
        if let Some(telemetry) = &self.inner.telemetry {
            telemetry.record(entry);
        }
    }
}

/// Builder for [`Context`].
#[derive(Default)]
pub struct ContextBuilder {
    signatures: Option<Arc<SignatureRegistry>>,
    promoter: Option<Arc<dyn Promoter>>,
    policy: UnknownTypePolicy,
    telemetry: Option<Arc<dyn Telemetry>>,
}

impl ContextBuilder {
    pub fn signatures(mut self, signatures: SignatureRegistry) -> Self {
        self.signatures = Some(Arc::new(signatures));
        self
    }

    /// Shares a registry that is populated elsewhere (e.g. asynchronously).
    pub fn shared_signatures(mut self, signatures: Arc<SignatureRegistry>) -> Self {
        self.signatures = Some(signatures);
        self
    }

    /// Replaces the standard promotion rules entirely.
    pub fn promoter(mut self, promoter: impl Promoter + 'static) -> Self {
        self.promoter = Some(Arc::new(promoter));
        self
    }

    /// Policy for type names the standard rules don't cover. Ignored when a
    /// custom promoter is set.
    pub fn unknown_type_policy(mut self, policy: UnknownTypePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn build(self) -> Context {
        let policy = self.policy;
        Context {
            inner: Arc::new(ContextInner {
                signatures: self.signatures.unwrap_or_default(),
                promoter: self
                    .promoter
                    .unwrap_or_else(|| Arc::new(TypeRegistry::standard().with_policy(policy))),
                telemetry: self.telemetry,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::semantic::SignatureSource;
    use crate::core::telemetry::MemoryTelemetry;
    use crate::core::semantic::Signature;
    use crate::signature;
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl SignatureSource for Fixed {
        async fn fetch_signatures(&self) -> Result<Vec<Signature>> {
            Ok(vec![signature!("Image.load(id: String) -> Image")])
        }
    }

    #[tokio::test]
    async fn test_shared_registry_populated_later() {
        let registry = Arc::new(SignatureRegistry::new());
        let ctx = Context::builder().shared_signatures(registry.clone()).build();
        assert!(ctx.call("Image.load", vec!["a".into()]).is_err());

        registry.populate(&Fixed).await.unwrap();
        assert!(ctx.call("Image.load", vec!["a".into()]).is_ok());
    }

    #[test]
    fn test_encode_records_trace() {
        let telemetry = Arc::new(MemoryTelemetry::new());
        let ctx = Context::builder()
            .signatures(SignatureRegistry::from_signatures([signature!(
                "Image.load(id: String) -> Image"
            )]))
            .telemetry(telemetry.clone())
            .build();

        let image = ctx.call("Image.load", vec!["a".into()]).unwrap();
        let text = ctx.to_json_string(&image).unwrap();
        assert_eq!(
            text,
            r#"{"type":"Invocation","arguments":{"id":"a"},"functionName":"Image.load"}"#
        );

        let invocations = telemetry.of_kind(TraceKind::Invocation);
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].subject, "Image.load");
        let encodes = telemetry.of_kind(TraceKind::Encode);
        assert_eq!(encodes[0].detail, json!({"slots": 1}));
    }
}
