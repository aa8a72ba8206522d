//! cache_purge tool implementation.
//!
//! Invalidates cached query results by key pattern, by expiry, or wholesale.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use quarry_core::Error;

use crate::pipeline::Pipeline;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Remove entries whose key matches this case-insensitive regex.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Remove entries past their TTL.
    #[serde(default)]
    pub expired_only: bool,

    /// Remove every entry.
    #[serde(default)]
    pub all: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries removed.
    pub removed: usize,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(pipeline: &Pipeline, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.pattern.is_none() && !params.expired_only && !params.all {
        return Err(Error::InvalidInput(
            "At least one of pattern, expired_only, or all must be specified".to_string(),
        )
        .into());
    }

    let mut removed = 0usize;

    if params.all {
        removed += pipeline.cache.invalidate(None).await;
    } else {
        if let Some(pattern) = &params.pattern {
            removed += pipeline.cache.invalidate(Some(pattern)).await;
        }
        if params.expired_only {
            removed += pipeline.cache.cleanup().await;
        }
    }

    let output = CachePurgeOutput { removed };
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}
