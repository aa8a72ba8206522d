//! Query pipeline orchestration.
//!
//! Sequences the stages that turn a natural-language question into a
//! response: rate check, cache lookup, classification, SQL generation and
//! validation, optimization, execution, and document search, with
//! per-stage timings throughout.
//!
//! Failure policy is asymmetric on purpose: rate-limit, security, and SQL
//! execution failures abort the request, while document search failures
//! only degrade it to a partial response with a warning. Nothing is ever
//! cached on a fatal path.

pub mod response;

use std::sync::Arc;
use std::time::{Duration, Instant};

use quarry_client::llm::LanguageModel;
use quarry_client::{DocumentMatch, QueryKind, StoreDb};
use quarry_core::optimize::{OptimizeOptions, OptimizedQuery};
use quarry_core::security::first_statement;
use quarry_core::{AppConfig, Error, QueryCache, RateLimiter, optimize_query, validate_query};
use serde_json::{Value, json};

pub use response::{PageMeta, Performance, QueryRequest, QueryResponse, StageTimings};

/// How many documents a vector search returns.
const DOCUMENT_SEARCH_LIMIT: usize = 5;

/// Shared pipeline state: the process-wide cache and limiter, the store,
/// and the configuration they were built from.
pub struct Pipeline {
    pub config: Arc<AppConfig>,
    pub cache: Arc<QueryCache>,
    pub limiter: Arc<RateLimiter>,
    pub store: StoreDb,
}

impl Pipeline {
    /// Build the pipeline's shared components from configuration.
    pub fn new(config: Arc<AppConfig>, store: StoreDb) -> Self {
        let cache = Arc::new(QueryCache::new(config.cache_max_size, config.cache_ttl()));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_requests,
            Duration::from_millis(config.rate_limit_window_ms),
        ));

        Self { config, cache, limiter, store }
    }

    /// Run one question through every applicable stage.
    pub async fn run(&self, model: &dyn LanguageModel, request: QueryRequest) -> Result<QueryResponse, Error> {
        let total_start = Instant::now();
        let mut timings = StageTimings::default();

        let stage = Instant::now();
        let allowed = self.limiter.is_allowed(&request.caller_id).await;
        timings.rate_check_ms = stage.elapsed().as_millis() as u64;
        if !allowed {
            let remaining = self.limiter.remaining(&request.caller_id).await;
            return Err(Error::RateLimited { remaining });
        }

        let params = json!({"page": request.page, "page_size": request.page_size});
        if request.enable_cache {
            let stage = Instant::now();
            let cached = self.cache.get(&request.question, &params).await;
            let cache_lookup_ms = stage.elapsed().as_millis() as u64;

            if let Some(value) = cached
                && let Ok(mut response) = serde_json::from_value::<QueryResponse>(value)
            {
                tracing::debug!("cache hit for {:?}", request.question);
                response.performance.cache_hit = true;
                response.performance.timings.cache_lookup_ms = cache_lookup_ms;
                response.performance.timings.total_ms = total_start.elapsed().as_millis() as u64;
                return Ok(response);
            }
            timings.cache_lookup_ms = cache_lookup_ms;
        }

        let stage = Instant::now();
        let kind = match model.classify(&request.question).await {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("classification failed, defaulting to structured: {}", e);
                QueryKind::Structured
            }
        };
        timings.classify_ms = stage.elapsed().as_millis() as u64;

        let mut sql_text = None;
        let mut structured_results = None;
        let mut pagination = None;
        let mut estimated_cost = None;
        let mut hints = Vec::new();
        let mut security_warnings = Vec::new();

        if kind.needs_sql() {
            let optimized = self.generate_and_optimize(model, &request, &mut timings, &mut security_warnings).await?;

            let stage = Instant::now();
            let rows = self.execute_bounded(&optimized.sql).await?;
            let total_rows = match self.store.execute_scalar(&optimized.count_sql).await {
                Ok(count) => Some(count),
                Err(e) => {
                    tracing::debug!("count query failed: {}", e);
                    None
                }
            };
            timings.execute_ms = stage.elapsed().as_millis() as u64;

            pagination = Some(PageMeta {
                page: optimized.pagination.page,
                page_size: optimized.pagination.page_size,
                offset: optimized.pagination.offset,
                total_rows,
            });
            estimated_cost = Some(optimized.estimated_cost);
            hints = optimized.hints;
            sql_text = Some(optimized.sql);
            structured_results = Some(rows);
        }

        let mut document_results = None;
        let mut document_warning = None;
        if kind.needs_documents() {
            let stage = Instant::now();
            match self.search_documents(model, &request.question).await {
                Ok(matches) => document_results = Some(matches),
                Err(reason) => {
                    tracing::warn!("document search degraded: {}", reason);
                    document_warning = Some(format!("document search unavailable: {reason}"));
                }
            }
            timings.document_search_ms = stage.elapsed().as_millis() as u64;
        }

        timings.total_ms = total_start.elapsed().as_millis() as u64;

        let response = QueryResponse {
            query_type: kind.as_str().to_string(),
            sql: sql_text,
            structured_results,
            document_results,
            document_warning,
            hints,
            security_warnings,
            pagination,
            estimated_cost,
            performance: Performance { cache_hit: false, timings },
            generated_at: chrono::Utc::now().to_rfc3339(),
        };

        if request.enable_cache {
            match serde_json::to_value(&response) {
                Ok(value) => self.cache.set(&request.question, value, &params, None).await,
                Err(e) => tracing::warn!("failed to serialize response for caching: {}", e),
            }
        }

        Ok(response)
    }

    /// SQL path up to (but not including) execution: introspect, generate,
    /// validate, truncate to one statement, optimize.
    async fn generate_and_optimize(
        &self, model: &dyn LanguageModel, request: &QueryRequest, timings: &mut StageTimings,
        security_warnings: &mut Vec<String>,
    ) -> Result<OptimizedQuery, Error> {
        // Introspection is best-effort: without it, generation gets an
        // empty schema context and optimization runs pagination-only.
        let schema = match self.store.introspect().await {
            Ok(schema) => Some(schema),
            Err(e) => {
                tracing::warn!("schema introspection failed, degrading optimization: {}", e);
                None
            }
        };
        let schema_context = schema.as_ref().map(|s| s.context()).unwrap_or_default();

        let stage = Instant::now();
        let generated = model
            .generate_sql(&request.question, &schema_context)
            .await
            .map_err(|e| Error::GenerationFailed(e.to_string()))?;
        timings.generate_sql_ms = stage.elapsed().as_millis() as u64;

        let stage = Instant::now();
        let report = validate_query(&generated);
        timings.validate_ms = stage.elapsed().as_millis() as u64;
        if !report.safe {
            return Err(Error::SecurityRejected { errors: report.errors });
        }
        security_warnings.extend(report.warnings);

        // Only the first statement goes any further; the multi-statement
        // warning above tells the caller the rest was dropped.
        let statement = first_statement(&generated).to_string();

        let stage = Instant::now();
        let statement_timeout_ms = if self.store.supports_statement_timeout() {
            self.config.statement_timeout_ms
        } else {
            None
        };
        let optimized = match &schema {
            Some(schema) => optimize_query(
                &statement,
                &OptimizeOptions {
                    page: request.page,
                    page_size: request.page_size,
                    indexed_columns: Some(&schema.indexed_columns),
                    table_columns: Some(&schema.tables),
                    statement_timeout_ms,
                },
            ),
            None => optimize_query(&statement, &OptimizeOptions {
                statement_timeout_ms,
                ..OptimizeOptions::pagination_only(request.page, request.page_size)
            }),
        };
        timings.optimize_ms = stage.elapsed().as_millis() as u64;

        Ok(optimized)
    }

    /// Execute SQL, bounding it with the configured statement budget when
    /// the backend cannot enforce one itself.
    async fn execute_bounded(&self, sql: &str) -> Result<Vec<Value>, Error> {
        let execution = self.store.execute(sql);

        let result = match self.config.statement_timeout_ms {
            Some(budget) if !self.store.supports_statement_timeout() => {
                tokio::time::timeout(Duration::from_millis(budget), execution)
                    .await
                    .map_err(|_| Error::ExecutionFailed(format!("statement exceeded {budget}ms budget")))?
            }
            _ => execution.await,
        };

        result.map_err(|e| Error::ExecutionFailed(e.to_string()))
    }

    /// Embed the question and run the vector search. Any failure is
    /// reported as a reason string for the degraded-response warning.
    async fn search_documents(&self, model: &dyn LanguageModel, question: &str) -> Result<Vec<DocumentMatch>, String> {
        let vectors = model.embed(&[question.to_string()]).await.map_err(|e| e.to_string())?;
        let vector = vectors.into_iter().next().ok_or_else(|| "no embedding returned".to_string())?;

        self.store
            .search_documents(&vector, DOCUMENT_SEARCH_LIMIT)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quarry_client::LlmError;

    /// Canned model: `None` in a field makes that operation fail.
    struct MockModel {
        classification: Option<QueryKind>,
        sql: Option<String>,
        embedding: Option<Vec<f32>>,
    }

    impl MockModel {
        fn structured(sql: &str) -> Self {
            Self { classification: Some(QueryKind::Structured), sql: Some(sql.to_string()), embedding: None }
        }
    }

    #[async_trait]
    impl LanguageModel for MockModel {
        async fn classify(&self, _question: &str) -> Result<QueryKind, LlmError> {
            self.classification.ok_or(LlmError::EmptyResponse)
        }

        async fn generate_sql(&self, _question: &str, _schema_context: &str) -> Result<String, LlmError> {
            self.sql.clone().ok_or(LlmError::EmptyResponse)
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            match &self.embedding {
                Some(vector) => Ok(vec![vector.clone(); texts.len()]),
                None => Err(LlmError::EmptyResponse),
            }
        }
    }

    async fn seeded_pipeline(config: AppConfig) -> Pipeline {
        let store = StoreDb::open_in_memory().await.unwrap();
        store
            .execute_batch(
                "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, hire_date TEXT);
                 CREATE INDEX idx_employees_hire_date ON employees(hire_date);
                 INSERT INTO employees (name, hire_date) VALUES ('Ada', '2024-03-01');
                 INSERT INTO employees (name, hire_date) VALUES ('Grace', '2024-07-15');
                 INSERT INTO employees (name, hire_date) VALUES ('Edsger', '2023-01-01');",
            )
            .await
            .unwrap();

        Pipeline::new(Arc::new(config), store)
    }

    fn request(question: &str) -> QueryRequest {
        QueryRequest {
            question: question.to_string(),
            page: 1,
            page_size: 50,
            enable_cache: true,
            caller_id: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_structured_end_to_end_then_cache_hit() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel::structured("SELECT name, hire_date FROM employees WHERE hire_date LIKE '2024%'");

        let first = pipeline.run(&model, request("Show employees hired in 2024")).await.unwrap();
        assert_eq!(first.query_type, "structured");
        assert!(!first.performance.cache_hit);
        assert_eq!(first.structured_results.as_ref().unwrap().len(), 2);
        assert!(first.sql.as_ref().unwrap().contains("LIMIT 50 OFFSET 0"));
        assert_eq!(first.pagination.as_ref().unwrap().total_rows, Some(2));

        let second = pipeline.run(&model, request("Show employees hired in 2024")).await.unwrap();
        assert!(second.performance.cache_hit);
        assert_eq!(second.structured_results, first.structured_results);
    }

    #[tokio::test]
    async fn test_cache_key_includes_pagination() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel::structured("SELECT name FROM employees");

        pipeline.run(&model, request("list employees")).await.unwrap();

        let mut paged = request("list employees");
        paged.page = 2;
        let response = pipeline.run(&model, paged).await.unwrap();
        assert!(!response.performance.cache_hit);
    }

    #[tokio::test]
    async fn test_unsafe_sql_is_rejected_and_not_cached() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel::structured("SELECT * FROM employees; DROP TABLE employees");

        let result = pipeline.run(&model, request("sneaky question")).await;
        assert!(matches!(result, Err(Error::SecurityRejected { ref errors }) if !errors.is_empty()));
        assert_eq!(pipeline.cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_after_quota() {
        let config = AppConfig { rate_limit_requests: 1, ..Default::default() };
        let pipeline = seeded_pipeline(config).await;
        let model = MockModel::structured("SELECT name FROM employees");

        pipeline.run(&model, request("first")).await.unwrap();
        let result = pipeline.run(&model, request("second")).await;
        assert!(matches!(result, Err(Error::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_classifier_failure_fails_open_to_structured() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel {
            classification: None,
            sql: Some("SELECT name FROM employees".to_string()),
            embedding: None,
        };

        let response = pipeline.run(&model, request("ambiguous question")).await.unwrap();
        assert_eq!(response.query_type, "structured");
        assert!(response.structured_results.is_some());
    }

    #[tokio::test]
    async fn test_generation_failure_is_fatal() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel { classification: Some(QueryKind::Structured), sql: None, embedding: None };

        let result = pipeline.run(&model, request("question")).await;
        assert!(matches!(result, Err(Error::GenerationFailed(_))));
    }

    #[tokio::test]
    async fn test_execution_failure_is_fatal_and_not_cached() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel::structured("SELECT name FROM no_such_table");

        let result = pipeline.run(&model, request("question")).await;
        assert!(matches!(result, Err(Error::ExecutionFailed(_))));
        assert_eq!(pipeline.cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_document_soft_failure_keeps_structured_results() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel {
            classification: Some(QueryKind::Hybrid),
            sql: Some("SELECT name FROM employees".to_string()),
            embedding: None,
        };

        let response = pipeline.run(&model, request("hybrid question")).await.unwrap();
        assert_eq!(response.query_type, "hybrid");
        assert!(response.structured_results.is_some());
        assert!(response.document_results.is_none());
        assert!(response.document_warning.as_ref().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_document_only_query_skips_sql() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        pipeline
            .store
            .add_document("The onboarding handbook covers benefits.", Some("handbook.md"), &[1.0, 0.0])
            .await
            .unwrap();

        let model = MockModel {
            classification: Some(QueryKind::Document),
            sql: None,
            embedding: Some(vec![1.0, 0.1]),
        };

        let response = pipeline.run(&model, request("what does the handbook cover?")).await.unwrap();
        assert_eq!(response.query_type, "document");
        assert!(response.sql.is_none());
        assert!(response.pagination.is_none());

        let matches = response.document_results.unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].content.contains("onboarding"));
        assert!(matches[0].similarity > 0.9);
    }

    #[tokio::test]
    async fn test_multi_statement_generation_warns_and_truncates() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel::structured("SELECT name FROM employees; SELECT 2");

        let response = pipeline.run(&model, request("question")).await.unwrap();
        assert!(response.security_warnings.iter().any(|w| w.contains("only the first")));
        assert!(response.sql.as_ref().unwrap().starts_with("SELECT name FROM employees"));
        assert!(!response.sql.as_ref().unwrap().contains("SELECT 2"));
        assert_eq!(response.structured_results.as_ref().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_index_hints_flow_from_introspection() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel::structured("SELECT name FROM employees WHERE hire_date = '2024-03-01'");

        let response = pipeline.run(&model, request("question")).await.unwrap();
        assert!(response.hints.iter().any(|h| h.contains("employees.hire_date")));
    }

    #[tokio::test]
    async fn test_cache_disabled_never_stores() {
        let pipeline = seeded_pipeline(AppConfig::default()).await;
        let model = MockModel::structured("SELECT name FROM employees");

        let mut uncached = request("question");
        uncached.enable_cache = false;
        pipeline.run(&model, uncached.clone()).await.unwrap();

        assert_eq!(pipeline.cache.stats().await.size, 0);
        let again = pipeline.run(&model, uncached).await.unwrap();
        assert!(!again.performance.cache_hit);
    }

    #[tokio::test]
    async fn test_statement_budget_applies_to_sqlite() {
        let config = AppConfig { statement_timeout_ms: Some(5_000), ..Default::default() };
        let pipeline = seeded_pipeline(config).await;
        let model = MockModel::structured("SELECT name FROM employees");

        let response = pipeline.run(&model, request("question")).await.unwrap();
        // SQLite cannot honor SET LOCAL, so the prefix must not be emitted.
        assert!(!response.sql.as_ref().unwrap().contains("statement_timeout"));
        assert!(response.structured_results.is_some());
    }
}
