//! Error types for graphloom operations.
//!
//! Every variant carries a structured [`ErrorCode`] so callers can branch on
//! the failure kind without matching on message text.

use thiserror::Error;

/// Result type alias for graphloom operations.
pub type LoomResult<T> = Result<T, LoomError>;

/// Main error type for all graphloom operations.
#[derive(Error, Debug)]
pub enum LoomError {
    /// LLM operation failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Graph store operation failed.
    #[error("Graph store error: {message}")]
    GraphStore {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported for the requested operation.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// The graph handle does not belong to the configured backend.
    #[error("Graph handle does not match the configured backend: expected {expected}, got {actual}")]
    BackendMismatch { expected: String, actual: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // LLM (LLM_xxx)
    LlmGenerationFailed,

    // Graph (GRP_xxx)
    GrpConnectionFailed,
    GrpOperationFailed,
    GrpBackendMismatch,

    // Database (DB_xxx)
    DbOperationFailed,

    // Configuration (CFG_xxx)
    CfgInvalid,
    CfgUnsupportedProvider,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::LlmGenerationFailed => "LLM_001",
            ErrorCode::GrpConnectionFailed => "GRP_001",
            ErrorCode::GrpOperationFailed => "GRP_002",
            ErrorCode::GrpBackendMismatch => "GRP_003",
            ErrorCode::DbOperationFailed => "DB_001",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::CfgUnsupportedProvider => "CFG_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl LoomError {
    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create a graph store error.
    pub fn graph_store(message: impl Into<String>) -> Self {
        Self::GraphStore {
            message: message.into(),
            code: ErrorCode::GrpOperationFailed,
            source: None,
        }
    }

    /// Create a graph store connection error.
    pub fn graph_connection(message: impl Into<String>) -> Self {
        Self::GraphStore {
            message: message.into(),
            code: ErrorCode::GrpConnectionFailed,
            source: None,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an unsupported provider error.
    pub fn unsupported_provider(provider: impl std::fmt::Debug) -> Self {
        Self::UnsupportedProvider {
            provider: format!("{:?}", provider),
        }
    }

    /// Create a backend mismatch error.
    pub fn backend_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::BackendMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Llm { code, .. } => *code,
            Self::GraphStore { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::UnsupportedProvider { .. } => ErrorCode::CfgUnsupportedProvider,
            Self::BackendMismatch { .. } => ErrorCode::GrpBackendMismatch,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            Self::GraphStore { .. } => Some("Please check your graph store connection settings"),
            Self::UnsupportedProvider { .. } => {
                Some("Use the embedded, neo4j or memgraph graph provider")
            }
            Self::BackendMismatch { .. } => {
                Some("Pass the graph handle created for the configured provider")
            }
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for LoomError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}
