//! cache_stats tool implementation.
//!
//! Reports query cache statistics, remaining rate-limit quota for a
//! caller, and the size of the document index.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use quarry_core::CacheStats;

use crate::pipeline::Pipeline;

/// Parameters for the cache_stats tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsParams {
    /// Caller id to report remaining rate-limit quota for
    /// (default "anonymous").
    #[serde(default)]
    pub caller_id: Option<String>,
}

/// Output from the cache_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsOutput {
    pub cache: CacheStats,
    /// Requests the caller has left in the current window.
    pub rate_limit_remaining: u32,
    /// Documents in the vector index, when the store is reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_stored: Option<i64>,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl(pipeline: &Pipeline, params: CacheStatsParams) -> Result<CallToolResult, McpError> {
    let caller_id = params.caller_id.as_deref().unwrap_or("anonymous");

    let output = CacheStatsOutput {
        cache: pipeline.cache.stats().await,
        rate_limit_remaining: pipeline.limiter.remaining(caller_id).await,
        documents_stored: pipeline.store.document_count().await.ok(),
    };

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}
