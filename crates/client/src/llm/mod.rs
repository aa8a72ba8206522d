//! Language model client.
//!
//! Provides classification, SQL generation, and text embedding over a
//! Gemini-style REST API, with rate limiting, output sanitization, and
//! response normalization.
//!
//! ### Specification
//!
//! - **Endpoints**: `models/{model}:generateContent` for text,
//!   `models/{model}:batchEmbedContents` for embeddings.
//! - **Authentication**: `Authorization: Bearer <key>` header.
//! - **Rate Limiting**: minimum interval between provider calls, shared
//!   across all uses of one client.
//! - **Sanitization**: generated SQL is stripped of code fences and label
//!   text before it reaches validation.

pub mod error;
pub mod request;
pub mod response;
pub mod sanitize;

pub use error::LlmError;
pub use request::{classification_prompt, sql_generation_prompt};
pub use sanitize::{parse_query_kind, sanitize_sql};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Default base URL for the model provider.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generation model.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Minimum interval between provider requests.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(200);

/// How a question should be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Resolved with generated SQL against relational tables.
    Structured,
    /// Resolved with vector search over stored documents.
    Document,
    /// Both paths run and the results are combined.
    Hybrid,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Structured => "structured",
            QueryKind::Document => "document",
            QueryKind::Hybrid => "hybrid",
        }
    }

    /// Whether this kind runs the SQL path.
    pub fn needs_sql(&self) -> bool {
        matches!(self, QueryKind::Structured | QueryKind::Hybrid)
    }

    /// Whether this kind runs the document search path.
    pub fn needs_documents(&self) -> bool {
        matches!(self, QueryKind::Document | QueryKind::Hybrid)
    }
}

/// The model operations the pipeline depends on.
///
/// The pipeline only sees this trait, so tests can substitute canned
/// implementations without any network access.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Classify how `question` should be resolved.
    async fn classify(&self, question: &str) -> Result<QueryKind, LlmError>;

    /// Generate a sanitized SQL statement answering `question`.
    async fn generate_sql(&self, question: &str, schema_context: &str) -> Result<String, LlmError>;

    /// Embed each input text, one vector per input.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Model client configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider API key.
    pub api_key: String,
    /// Base URL of the REST API.
    pub base_url: String,
    /// Generation model name.
    pub model: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LlmConfig {
    /// Build a client configuration from application settings.
    ///
    /// The API key is passed separately so callers decide when a missing
    /// key becomes an error.
    pub fn from_app(config: &quarry_core::AppConfig, api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: config.llm_base_url.clone(),
            model: config.llm_model.clone(),
            embedding_model: config.embedding_model.clone(),
            timeout: config.llm_timeout(),
        }
    }
}

/// Rate limiter to enforce request intervals toward the provider.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// HTTP client for the model provider.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl LlmClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(Arc::new(e)))?;

        Ok(Self { http, config, rate_limiter: Arc::new(RateLimiter::new(MIN_REQUEST_INTERVAL)) })
    }

    /// Run one text generation call and return the raw model output.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.rate_limiter.acquire().await;

        let start = Instant::now();
        let url = format!("{}/models/{}:generateContent", self.config.base_url, self.config.model);

        let http_response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request::GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(LlmError::from)?;

        let response: response::GenerateContentResponse = Self::read_json(http_response).await?;
        let text = response.extract_text().ok_or(LlmError::EmptyResponse)?;

        tracing::debug!("generation completed in {:?} ({} chars)", start.elapsed(), text.len());

        Ok(text)
    }

    /// Map provider status codes, then parse the body.
    async fn read_json<T: serde::de::DeserializeOwned>(http_response: reqwest::Response) -> Result<T, LlmError> {
        let status = http_response.status();

        if status == 401 || status == 403 {
            return Err(LlmError::AuthError);
        }
        if status == 429 {
            return Err(LlmError::RateLimited);
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(LlmError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await.map_err(|e| LlmError::Network(Arc::new(e)))?;
        serde_json::from_slice(&bytes).map_err(|e| LlmError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn classify(&self, question: &str) -> Result<QueryKind, LlmError> {
        let raw = self.generate(&classification_prompt(question)).await?;
        let kind = parse_query_kind(&raw);
        tracing::debug!("classified {:?} as {}", question, kind.as_str());
        Ok(kind)
    }

    async fn generate_sql(&self, question: &str, schema_context: &str) -> Result<String, LlmError> {
        let raw = self.generate(&sql_generation_prompt(question, schema_context)).await?;
        sanitize_sql(&raw).ok_or_else(|| LlmError::UnusableOutput(raw.chars().take(120).collect()))
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.rate_limiter.acquire().await;

        let url = format!(
            "{}/models/{}:batchEmbedContents",
            self.config.base_url, self.config.embedding_model
        );

        let http_response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request::BatchEmbedRequest::new(&self.config.embedding_model, texts))
            .send()
            .await
            .map_err(LlmError::from)?;

        let response: response::BatchEmbedResponse = Self::read_json(http_response).await?;

        if response.embeddings.len() != texts.len() {
            return Err(LlmError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}
