//! query tool implementation.
//!
//! Runs a natural-language question through the full pipeline and returns
//! the assembled response as pretty-printed JSON.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use quarry_client::{LlmClient, LlmConfig};
use quarry_core::Error;

use crate::pipeline::{Pipeline, QueryRequest};

/// Input parameters for the query tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    /// The natural-language question (required).
    pub query: String,

    /// 1-based result page (default 1).
    #[serde(default)]
    pub page: Option<u32>,

    /// Rows per page, 10-1000 (default from configuration).
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Serve from and store into the result cache (default true).
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Identifier used for rate limiting (default "anonymous").
    #[serde(default)]
    pub caller_id: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Implementation of the query tool.
pub async fn query_impl(pipeline: &Pipeline, params: QueryParams) -> Result<CallToolResult, McpError> {
    let question = params.query.trim();
    if question.is_empty() {
        return Err(Error::InvalidInput("query cannot be empty".into()).into());
    }

    let model = build_model(pipeline)?;

    let request = QueryRequest {
        question: question.to_string(),
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(pipeline.config.default_page_size),
        enable_cache: params.enable_cache,
        caller_id: params.caller_id.unwrap_or_else(|| "anonymous".to_string()),
    };

    let response = pipeline.run(&model, request).await?;

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&response).unwrap_or_default(),
    )]))
}

/// Construct the model client from configuration, deferring API-key
/// validation to the first call that needs it.
pub fn build_model(pipeline: &Pipeline) -> Result<LlmClient, McpError> {
    let config = &pipeline.config;
    let api_key = config
        .require_llm_api_key()
        .map_err(|e| Error::GenerationFailed(e.to_string()))?;

    LlmClient::new(LlmConfig::from_app(config, api_key)).map_err(|e| Error::GenerationFailed(e.to_string()).into())
}
