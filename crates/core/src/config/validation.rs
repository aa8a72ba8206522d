//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_max_size` is 0
    /// - `rate_limit_requests` is 0
    /// - `rate_limit_window_ms` is less than 1 second
    /// - `llm_timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `default_page_size` is outside the 10-1000 range the optimizer clamps to
    /// - `llm_base_url` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_max_size == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_max_size".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.rate_limit_requests == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit_requests".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.rate_limit_window_ms < 1000 {
            return Err(ConfigError::Invalid {
                field: "rate_limit_window_ms".into(),
                reason: "must be at least 1000ms".into(),
            });
        }

        if self.llm_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "llm_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.llm_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "llm_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.default_page_size < 10 || self.default_page_size > 1000 {
            return Err(ConfigError::Invalid {
                field: "default_page_size".into(),
                reason: "must be between 10 and 1000".into(),
            });
        }

        if self.llm_base_url.is_empty() {
            return Err(ConfigError::Invalid { field: "llm_base_url".into(), reason: "must not be empty".into() });
        }

        if let Some(timeout) = self.statement_timeout_ms
            && timeout == 0
        {
            return Err(ConfigError::Invalid {
                field: "statement_timeout_ms".into(),
                reason: "must be greater than 0 when set".into(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_cache_max_size_zero() {
        let config = AppConfig { cache_max_size: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_max_size"));
    }

    #[test]
    fn test_validate_rate_limit_zero() {
        let config = AppConfig { rate_limit_requests: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "rate_limit_requests"));
    }

    #[test]
    fn test_validate_window_too_small() {
        let config = AppConfig { rate_limit_window_ms: 500, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "rate_limit_window_ms"));
    }

    #[test]
    fn test_validate_llm_timeout_bounds() {
        let config = AppConfig { llm_timeout_ms: 50, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { llm_timeout_ms: 301_000, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let config = AppConfig { default_page_size: 5, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { default_page_size: 2000, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_statement_timeout_zero() {
        let config = AppConfig { statement_timeout_ms: Some(0), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "statement_timeout_ms"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { llm_timeout_ms: 100, default_page_size: 10, ..Default::default() };
        assert!(config.validate().is_ok());

        let config = AppConfig { llm_timeout_ms: 300_000, default_page_size: 1000, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
