use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::core::error::GraphError;

/// Type name used when a parameter or return type is not declared.
pub const UNTYPED: &str = "Object";

/// A single parameter of a signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArgSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            default: None,
            description: None,
        }
    }
}

/// The declared shape of a callable algorithm.
///
/// Parameter order is load-bearing: it defines positional binding and the
/// order in which missing required arguments are reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signature {
    pub name: String,
    pub returns: String,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
}

impl Signature {
    pub fn new(name: impl Into<String>, returns: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            returns: returns.into(),
            args: Vec::new(),
            description: None,
            deprecated: None,
        }
    }

    /// Add a required parameter.
    pub fn arg(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.args.push(ArgSpec::new(name, type_name));
        self
    }

    /// Add an optional parameter.
    pub fn optional(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let mut spec = ArgSpec::new(name, type_name);
        spec.optional = true;
        self.args.push(spec);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecated = Some(reason.into());
        self
    }

    pub fn arg_spec(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Name for diagnostics; function literals have an empty name.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<anonymous>"
        } else {
            &self.name
        }
    }

    /// Returns a stable, structural hash of the signature.
    /// Descriptions and defaults are excluded; names, types, optionality and
    /// their order are not.
    pub fn structural_hash(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        self.returns.hash(&mut hasher);
        for arg in &self.args {
            arg.name.hash(&mut hasher);
            arg.type_name.hash(&mut hasher);
            arg.optional.hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }
}

impl FromStr for Signature {
    type Err = GraphError;

    /// Parses shorthand syntax: `"Image.add(image1: Image, image2?: Image) -> Image"`.
    ///
    /// A trailing `?` on a parameter name marks it optional. Missing types
    /// (parameter or return) default to `Object`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| GraphError::InvalidSignature(format!("{}: {:?}", why, s));

        let (head, returns) = match s.split_once("->") {
            Some((head, returns)) => (head.trim(), returns.trim()),
            None => (s.trim(), UNTYPED),
        };
        if returns.is_empty() {
            return Err(invalid("empty return type"));
        }

        let open = head.find('(').ok_or_else(|| invalid("missing '('"))?;
        let params = head[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| invalid("missing ')'"))?;

        let mut signature = Signature::new(head[..open].trim(), returns);
        for part in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, type_name) = match part.split_once(':') {
                Some((name, type_name)) => (name.trim(), type_name.trim()),
                None => (part, UNTYPED),
            };
            let (name, optional) = match name.strip_suffix('?') {
                Some(name) => (name.trim(), true),
                None => (name, false),
            };
            if name.is_empty() || type_name.is_empty() {
                return Err(invalid("malformed parameter"));
            }
            signature = if optional {
                signature.optional(name, type_name)
            } else {
                signature.arg(name, type_name)
            };
        }
        Ok(signature)
    }
}

/// Macro for rapid signature creation: `signature!("Image.load(id: String) -> Image")`
#[macro_export]
macro_rules! signature {
    ($s:expr) => {
        $s.parse::<$crate::Signature>()
            .expect("Invalid signature shorthand")
    };
}
