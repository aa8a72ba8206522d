//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (QUARRY_*)
//! 2. TOML config file (if QUARRY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (QUARRY_*)
/// 2. TOML config file (if QUARRY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the language model provider.
    ///
    /// Set via QUARRY_LLM_API_KEY environment variable.
    /// Required only when a tool actually calls the model.
    #[serde(default)]
    pub llm_api_key: Option<String>,

    /// Base URL of the language model REST API.
    ///
    /// Set via QUARRY_LLM_BASE_URL environment variable.
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,

    /// Model used for classification and SQL generation.
    ///
    /// Set via QUARRY_LLM_MODEL environment variable.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Model used for text embeddings.
    ///
    /// Set via QUARRY_EMBEDDING_MODEL environment variable.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// LLM request timeout in milliseconds.
    ///
    /// Set via QUARRY_LLM_TIMEOUT_MS environment variable.
    #[serde(default = "default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,

    /// Path to the SQLite database holding relational data and documents.
    ///
    /// Set via QUARRY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Maximum number of entries in the query result cache.
    #[serde(default = "default_cache_max_size")]
    pub cache_max_size: usize,

    /// Default TTL for cached query results, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Interval of the background expired-entry sweep, in seconds.
    #[serde(default = "default_cache_sweep_secs")]
    pub cache_sweep_secs: u64,

    /// Requests allowed per caller within the rate-limit window.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    /// Length of the sliding rate-limit window, in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Page size applied when a query request does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Statement timeout budget for SQL execution, in milliseconds.
    ///
    /// Off by default. When set, backends that understand
    /// `SET LOCAL statement_timeout` get it as a SQL prefix; others are
    /// bounded by an async timeout around execution.
    #[serde(default)]
    pub statement_timeout_ms: Option<u64>,
}

fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_embedding_model() -> String {
    "text-embedding-004".into()
}

fn default_llm_timeout_ms() -> u64 {
    20_000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./quarry.sqlite")
}

fn default_cache_max_size() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_sweep_secs() -> u64 {
    300
}

fn default_rate_limit_requests() -> u32 {
    100
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_page_size() -> u32 {
    50
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm_api_key: None,
            llm_base_url: default_llm_base_url(),
            llm_model: default_llm_model(),
            embedding_model: default_embedding_model(),
            llm_timeout_ms: default_llm_timeout_ms(),
            db_path: default_db_path(),
            cache_max_size: default_cache_max_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_sweep_secs: default_cache_sweep_secs(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            default_page_size: default_page_size(),
            statement_timeout_ms: None,
        }
    }
}

impl AppConfig {
    /// LLM timeout as Duration for use with reqwest/tokio.
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    /// Default cache TTL as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `QUARRY_`
    /// 2. TOML file from `QUARRY_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("QUARRY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("QUARRY_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the LLM API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_llm_api_key(&self) -> Result<&str, ConfigError> {
        self.llm_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "llm_api_key".into(),
            hint: "Set QUARRY_LLM_API_KEY environment variable".into(),
        })
    }
}
