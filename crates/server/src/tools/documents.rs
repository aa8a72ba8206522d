//! document_store tool implementation.
//!
//! Embeds a text document and inserts it into the vector index. Unlike
//! query-time document search, a failed embedding here is a hard error:
//! there is nothing useful to store without a vector.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use quarry_client::llm::LanguageModel;
use quarry_core::Error;

use crate::pipeline::Pipeline;
use crate::tools::query::build_model;

/// Parameters for the document_store tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DocumentStoreParams {
    /// Document text to embed and store (required).
    pub content: String,

    /// Label for where the text came from, e.g. a file name.
    #[serde(default)]
    pub source: Option<String>,
}

/// Output from the document_store tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentStoreOutput {
    /// Content hash identifying the stored document.
    pub hash: String,
    /// Stored text length in characters.
    pub chars: usize,
}

/// Implementation of the document_store tool.
pub async fn store_impl(pipeline: &Pipeline, params: DocumentStoreParams) -> Result<CallToolResult, McpError> {
    let content = params.content.trim();
    if content.is_empty() {
        return Err(Error::InvalidInput("content cannot be empty".into()).into());
    }

    let model = build_model(pipeline)?;

    let vectors = model
        .embed(&[content.to_string()])
        .await
        .map_err(|e| Error::EmbeddingFailed(e.to_string()))?;
    let vector = vectors
        .into_iter()
        .next()
        .ok_or_else(|| Error::EmbeddingFailed("no embedding returned".into()))?;

    let hash = pipeline
        .store
        .add_document(content, params.source.as_deref(), &vector)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;

    tracing::debug!("stored document {} ({} chars)", hash, content.len());

    let output = DocumentStoreOutput { hash, chars: content.chars().count() };
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}
