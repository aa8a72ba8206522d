//! Provider request types and prompt construction.

use serde::Serialize;

/// Body for a `generateContent` call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

impl GenerateContentRequest {
    /// Wrap a single user prompt in the provider's content envelope.
    pub fn from_prompt(prompt: &str) -> Self {
        Self { contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }] }
    }
}

/// Body for a `batchEmbedContents` call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEmbedRequest {
    pub requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedContentRequest {
    pub model: String,
    pub content: Content,
}

impl BatchEmbedRequest {
    /// One embed request per input text, all against `model`.
    pub fn new(model: &str, texts: &[String]) -> Self {
        Self {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: format!("models/{model}"),
                    content: Content { parts: vec![Part { text: text.clone() }] },
                })
                .collect(),
        }
    }
}

/// Prompt asking the model to classify how a question should be resolved.
pub fn classification_prompt(question: &str) -> String {
    format!(
        "Classify the user's question by the data needed to answer it.\n\
         Reply with exactly one word:\n\
         - structured: answerable from relational tables\n\
         - document: answerable from stored document text\n\
         - hybrid: needs both\n\n\
         Question: \"{question}\""
    )
}

/// Prompt asking the model to convert a question into a SELECT statement.
pub fn sql_generation_prompt(question: &str, schema_context: &str) -> String {
    format!(
        "Convert the user's question into a single SQL SELECT query.\n\n\
         Schema:\n{schema_context}\n\n\
         Rules:\n\
         - Output only the SQL statement, nothing else.\n\
         - SELECT or WITH statements only, no DML or DDL.\n\
         - Add LIMIT 1000 if the question does not imply a row count.\n\n\
         Question: \"{question}\""
    )
}
