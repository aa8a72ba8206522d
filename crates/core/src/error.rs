//! Unified error types for quarry.
//!
//! Every fatal pipeline outcome maps to exactly one variant here, with a
//! stable `SCREAMING_CODE:` prefix in the display form so callers can match
//! on failures without parsing prose.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the quarry server.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty question).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Caller exceeded the sliding-window request quota.
    #[error("RATE_LIMITED: request quota exceeded, {remaining} requests remaining in window")]
    RateLimited { remaining: u32 },

    /// Generated SQL failed security validation. Carries every rule that
    /// fired so the caller can see exactly what was rejected.
    #[error("SECURITY_REJECTED: {}", .errors.join("; "))]
    SecurityRejected { errors: Vec<String> },

    /// The language model errored or returned text with no usable statement.
    #[error("GENERATION_FAILED: {0}")]
    GenerationFailed(String),

    /// The relational backend rejected the optimized SQL.
    #[error("EXECUTION_FAILED: {0}")]
    ExecutionFailed(String),

    /// Embedding call failed in a context where the vector is required.
    #[error("EMBEDDING_FAILED: {0}")]
    EmbeddingFailed(String),

    /// Storage layer failure outside of query execution (open, migration).
    #[error("STORAGE_ERROR: {0}")]
    Storage(String),
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::GenerationFailed(_) => -32000,
            Error::SecurityRejected { .. } => -32001,
            Error::ExecutionFailed(_) => -32002,
            Error::RateLimited { .. } => -32003,
            Error::Storage(_) => -32004,
            Error::EmbeddingFailed(_) => -32005,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
