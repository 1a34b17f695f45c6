use thiserror::Error;

/// Errors raised while building or encoding an expression graph.
///
/// Every variant is raised synchronously at the point of construction or
/// encoding; nothing is collected across a whole graph and nothing is retried.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("{function}: missing required argument '{argument}'")]
    MissingRequiredArgument { function: String, argument: String },

    #[error("{function}: too many arguments (expected at most {expected}, got {given})")]
    TooManyArguments {
        function: String,
        expected: usize,
        given: usize,
    },

    #[error("{function}: unrecognized arguments: {}", .arguments.join(", "))]
    UnrecognizedArgument {
        function: String,
        arguments: Vec<String>,
    },

    #[error("unknown algorithm: {0}")]
    UnknownFunction(String),

    #[error("cannot promote {value} to {type_name}")]
    UnpromotableValue { type_name: String, value: String },

    #[error("cannot encode value: {0}")]
    EncodingFailure(String),

    #[error("signature registry has not been populated")]
    RegistryNotInitialized,

    #[error("failed to fetch signatures: {0}")]
    SignatureSource(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn unpromotable(type_name: &str, value: impl std::fmt::Display) -> Self {
        GraphError::UnpromotableValue {
            type_name: type_name.to_string(),
            value: value.to_string(),
        }
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
