//! Pipeline request and response types.

use quarry_client::DocumentMatch;
use quarry_core::optimize::CostBucket;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A question submitted to the pipeline, with resolved defaults.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub question: String,
    /// 1-based result page.
    pub page: u32,
    pub page_size: u32,
    pub enable_cache: bool,
    /// Identifier the rate limiter buckets this request under.
    pub caller_id: String,
}

/// Elapsed milliseconds per pipeline stage. Stages that did not run stay 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StageTimings {
    pub rate_check_ms: u64,
    pub cache_lookup_ms: u64,
    pub classify_ms: u64,
    pub generate_sql_ms: u64,
    pub validate_ms: u64,
    pub optimize_ms: u64,
    pub execute_ms: u64,
    pub document_search_ms: u64,
    pub total_ms: u64,
}

/// Timing and cache metadata for one response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Performance {
    /// True when the response was served from the query cache.
    pub cache_hit: bool,
    pub timings: StageTimings,
}

/// Pagination metadata echoed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub offset: u64,
    /// Total matching rows, when the companion COUNT query succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<i64>,
}

/// Everything the pipeline returns for one question.
///
/// This is also the object stored in the query cache; a cache hit returns
/// it verbatim apart from `performance`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryResponse {
    /// How the question was resolved: structured, document, or hybrid.
    pub query_type: String,
    /// The optimized SQL that was executed, when the SQL path ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_results: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_results: Option<Vec<DocumentMatch>>,
    /// Present when document search failed and the response is partial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_warning: Option<String>,
    /// Optimizer hints, merged across stages.
    pub hints: Vec<String>,
    /// Non-blocking findings from security validation.
    pub security_warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<CostBucket>,
    pub performance: Performance,
    pub generated_at: String,
}
