//! External collaborators for quarry.
//!
//! This crate provides the language model client (classification, SQL
//! generation, embeddings) and the storage layer (relational backend plus
//! the document embedding index) consumed by the pipeline.

pub mod llm;
pub mod store;

pub use llm::{LanguageModel, LlmClient, LlmConfig, LlmError, QueryKind, parse_query_kind, sanitize_sql};
pub use store::{DocumentMatch, SchemaInfo, StoreDb, StoreError};
