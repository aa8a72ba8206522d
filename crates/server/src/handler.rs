//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::pipeline::Pipeline;
use crate::tools::cache::{CachePurgeParams, CacheStatsParams, purge, stats};
use crate::tools::documents::{DocumentStoreParams, store_impl};
use crate::tools::query::{QueryParams, query_impl};

/// The main MCP server handler for quarry.
#[derive(Clone)]
pub struct QuarryServer {
    pipeline: Arc<Pipeline>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl QuarryServer {
    /// Create a new server handler around shared pipeline state.
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline, tool_router: Self::tool_router() }
    }

    /// Answer a natural-language question.
    #[tool(
        description = "Answer a natural-language question against relational data and/or stored documents. Returns rows, document matches, the executed SQL, optimizer hints, and per-stage timings."
    )]
    async fn query(&self, params: Parameters<QueryParams>) -> Result<CallToolResult, McpError> {
        query_impl(&self.pipeline, params.0).await
    }

    /// Embed and store a document for vector search.
    #[tool(description = "Embed a text document and store it in the vector index for document queries.")]
    async fn document_store(&self, params: Parameters<DocumentStoreParams>) -> Result<CallToolResult, McpError> {
        store_impl(&self.pipeline, params.0).await
    }

    /// Report cache and quota statistics.
    #[tool(description = "Report query cache statistics, remaining rate-limit quota, and document index size.")]
    async fn cache_stats(&self, params: Parameters<CacheStatsParams>) -> Result<CallToolResult, McpError> {
        stats::stats_impl(&self.pipeline, params.0).await
    }

    /// Invalidate cached query results.
    #[tool(description = "Invalidate cached query results by key pattern, by expiry, or entirely.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge::purge_impl(&self.pipeline, params.0).await
    }
}

impl ServerHandler for QuarryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "quarry".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
