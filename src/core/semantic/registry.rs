use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::core::error::{GraphError, Result};
use crate::core::semantic::signature::{ArgSpec, Signature, UNTYPED};

/// External supplier of algorithm signatures (typically a network fetch).
#[async_trait]
pub trait SignatureSource: Send + Sync {
    async fn fetch_signatures(&self) -> Result<Vec<Signature>>;
}

/// Maps fully-qualified algorithm names to their signatures.
///
/// The registry is populated exactly once. Until then every lookup fails with
/// [`GraphError::RegistryNotInitialized`]; there is no partially-populated
/// state.
#[derive(Default)]
pub struct SignatureRegistry {
    signatures: OnceCell<HashMap<String, Arc<Signature>>>,
    warned: Mutex<HashSet<String>>,
}

impl SignatureRegistry {
    /// Creates an empty, unpopulated registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that is already populated with `signatures`.
    pub fn from_signatures(signatures: impl IntoIterator<Item = Signature>) -> Self {
        Self {
            signatures: OnceCell::new_with(Some(index(signatures))),
            warned: Mutex::default(),
        }
    }

    /// Builds a populated registry from an algorithm-listing document:
    /// `{"algorithms": [{"name": "algorithms/Image.load", "returnType": ..., "arguments": [...]}]}`.
    pub fn from_algorithms_json(json: &str) -> Result<Self> {
        let listing: AlgorithmListing = serde_json::from_str(json)?;
        Ok(Self::from_signatures(
            listing.algorithms.into_iter().map(Signature::from),
        ))
    }

    /// Populates the registry from `source`. Only the first successful call
    /// fetches; concurrent callers wait for it and later calls are no-ops.
    pub async fn populate(&self, source: &dyn SignatureSource) -> Result<()> {
        self.signatures
            .get_or_try_init(|| async {
                let signatures = source.fetch_signatures().await?;
                log::debug!("Fetched {} algorithm signatures", signatures.len());
                Ok::<_, GraphError>(index(signatures))
            })
            .await?;
        Ok(())
    }

    pub fn is_populated(&self) -> bool {
        self.signatures.initialized()
    }

    /// Resolves `name`, warning once per name if the algorithm is deprecated.
    pub fn lookup(&self, name: &str) -> Result<Arc<Signature>> {
        let signatures = self
            .signatures
            .get()
            .ok_or(GraphError::RegistryNotInitialized)?;
        let signature = signatures
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownFunction(name.to_string()))?;

        if let Some(reason) = &signature.deprecated {
            if let Ok(mut warned) = self.warned.lock() {
                if warned.insert(name.to_string()) {
                    log::warn!("Algorithm {} is deprecated: {}", name, reason);
                }
            }
        }
        Ok(signature)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signatures
            .get()
            .is_some_and(|signatures| signatures.contains_key(name))
    }

    pub fn len(&self) -> usize {
        self.signatures.get().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn index(signatures: impl IntoIterator<Item = Signature>) -> HashMap<String, Arc<Signature>> {
    let mut map: HashMap<String, Arc<Signature>> = HashMap::new();
    for signature in signatures {
        if let Some(existing) = map.get(&signature.name) {
            if existing.structural_hash() != signature.structural_hash() {
                log::warn!(
                    "Conflicting signatures for {}, keeping the last one",
                    signature.name
                );
            }
        }
        map.insert(signature.name.clone(), Arc::new(signature));
    }
    map
}

// ============================================================================
// Algorithm listing document
// ============================================================================

const ALGORITHM_PREFIX: &str = "algorithms/";

fn untyped() -> String {
    UNTYPED.to_string()
}

#[derive(Deserialize)]
struct AlgorithmListing {
    #[serde(default)]
    algorithms: Vec<AlgorithmEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlgorithmEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "untyped")]
    return_type: String,
    #[serde(default)]
    arguments: Vec<ArgumentEntry>,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    deprecation_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArgumentEntry {
    argument_name: String,
    #[serde(rename = "type", default = "untyped")]
    type_name: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    default_value: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
}

impl From<AlgorithmEntry> for Signature {
    fn from(entry: AlgorithmEntry) -> Self {
        let name = entry
            .name
            .strip_prefix(ALGORITHM_PREFIX)
            .unwrap_or(&entry.name)
            .to_string();
        let deprecated = entry.deprecated.then(|| {
            entry
                .deprecation_reason
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "no reason given".to_string())
        });
        Signature {
            name,
            returns: entry.return_type,
            args: entry
                .arguments
                .into_iter()
                .map(|arg| ArgSpec {
                    name: arg.argument_name,
                    type_name: arg.type_name,
                    optional: arg.optional,
                    default: arg.default_value,
                    description: arg.description,
                })
                .collect(),
            description: entry.description,
            deprecated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Vec<Signature>);

    #[async_trait]
    impl SignatureSource for StaticSource {
        async fn fetch_signatures(&self) -> Result<Vec<Signature>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SignatureSource for FailingSource {
        async fn fetch_signatures(&self) -> Result<Vec<Signature>> {
            Err(GraphError::SignatureSource("connection refused".to_string()))
        }
    }

    #[test]
    fn test_lookup_before_population_fails() {
        let registry = SignatureRegistry::new();
        assert!(!registry.is_populated());
        assert!(matches!(
            registry.lookup("Image.load"),
            Err(GraphError::RegistryNotInitialized)
        ));
    }

    #[test]
    fn test_unknown_function() {
        let registry = SignatureRegistry::from_signatures([crate::signature!(
            "Image.load(id: String) -> Image"
        )]);
        assert!(registry.lookup("Image.load").is_ok());
        assert!(matches!(
            registry.lookup("Image.lod"),
            Err(GraphError::UnknownFunction(name)) if name == "Image.lod"
        ));
    }

    #[tokio::test]
    async fn test_populate_once() {
        let registry = SignatureRegistry::new();
        let first = StaticSource(vec![crate::signature!("A() -> Object")]);
        let second = StaticSource(vec![crate::signature!("B() -> Object")]);

        registry.populate(&first).await.unwrap();
        registry.populate(&second).await.unwrap();

        assert!(registry.contains("A"));
        assert!(!registry.contains("B"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_population_can_be_retried() {
        let registry = SignatureRegistry::new();
        assert!(registry.populate(&FailingSource).await.is_err());
        assert!(!registry.is_populated());

        let source = StaticSource(vec![crate::signature!("A() -> Object")]);
        registry.populate(&source).await.unwrap();
        assert!(registry.is_populated());
    }

    #[test]
    fn test_algorithm_listing() {
        let json = r#"{
            "algorithms": [
                {
                    "name": "algorithms/Image.load",
                    "description": "Loads an image.",
                    "returnType": "Image",
                    "arguments": [
                        {"argumentName": "id", "type": "String"},
                        {"argumentName": "version", "type": "Long", "optional": true, "defaultValue": -1}
                    ]
                },
                {
                    "name": "algorithms/Image.old",
                    "returnType": "Image",
                    "deprecated": true,
                    "deprecationReason": "Use Image.load."
                }
            ]
        }"#;
        let registry = SignatureRegistry::from_algorithms_json(json).unwrap();

        let load = registry.lookup("Image.load").unwrap();
        assert_eq!(load.returns, "Image");
        assert_eq!(load.args.len(), 2);
        assert!(load.args[1].optional);
        assert_eq!(load.args[1].default, Some(serde_json::json!(-1)));

        let old = registry.lookup("Image.old").unwrap();
        assert_eq!(old.deprecated.as_deref(), Some("Use Image.load."));
    }
}
