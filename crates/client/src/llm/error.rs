//! Language model client error types.

use std::sync::Arc;

/// Errors from the model provider client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No API key configured.
    #[error("missing API key: QUARRY_LLM_API_KEY not set")]
    MissingApiKey,

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by the provider.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// The model returned no candidate text at all.
    #[error("empty response from model")]
    EmptyResponse,

    /// The model returned text with no usable SQL statement.
    #[error("no usable SQL in model output: {0}")]
    UnusableOutput(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { LlmError::Timeout } else { LlmError::Network(Arc::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LlmError::MissingApiKey;
        assert!(err.to_string().contains("API key"));

        let err = LlmError::UnusableOutput("I cannot help with that".to_string());
        assert!(err.to_string().contains("no usable SQL"));
    }
}
