//! LIMIT/OFFSET pagination rewriting.
//!
//! Strips whatever pagination the input already carries, then appends a
//! clamped LIMIT/OFFSET pair. A companion COUNT(*) query over the cleaned
//! SQL lets the caller compute the total row count.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Smallest page size the rewrite will emit.
pub const MIN_PAGE_SIZE: u32 = 10;

/// Largest page size the rewrite will emit.
pub const MAX_PAGE_SIZE: u32 = 1000;

static LIMIT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+limit\s+\d+(\s*,\s*\d+)?").unwrap());
static OFFSET_CLAUSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+offset\s+\d+").unwrap());

/// Resolved pagination values after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub offset: u64,
    pub limit: u32,
}

/// Result of the pagination rewrite.
#[derive(Debug, Clone)]
pub struct PaginatedQuery {
    /// Input SQL with LIMIT/OFFSET appended.
    pub sql: String,
    /// COUNT(*) over the cleaned input, for total-row computation.
    pub count_sql: String,
    pub pagination: Pagination,
    pub hints: Vec<String>,
}

/// Apply pagination to `sql`.
///
/// Out-of-range values are clamped silently, with a hint noting the cap.
pub fn paginate(sql: &str, page: u32, page_size: u32) -> PaginatedQuery {
    let mut hints = Vec::new();

    let effective_page = page.max(1);
    if effective_page != page {
        hints.push("page raised to 1".to_string());
    }

    let effective_size = page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
    if page_size > MAX_PAGE_SIZE {
        hints.push(format!("page_size capped at {MAX_PAGE_SIZE}"));
    } else if page_size < MIN_PAGE_SIZE {
        hints.push(format!("page_size raised to {MIN_PAGE_SIZE}"));
    }

    let cleaned = strip_pagination(sql);
    let offset = u64::from(effective_page - 1) * u64::from(effective_size);

    PaginatedQuery {
        sql: format!("{cleaned} LIMIT {effective_size} OFFSET {offset}"),
        count_sql: format!("SELECT COUNT(*) FROM ({cleaned}) AS subquery"),
        pagination: Pagination { page: effective_page, page_size: effective_size, offset, limit: effective_size },
        hints,
    }
}

/// Remove existing LIMIT/OFFSET clauses and any trailing semicolon.
fn strip_pagination(sql: &str) -> String {
    let sql = LIMIT_CLAUSE.replace_all(sql, "");
    let sql = OFFSET_CLAUSE.replace_all(&sql, "");
    sql.trim().trim_end_matches(';').trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_pagination_math() {
        let result = paginate("SELECT * FROM t", 2, 25);
        assert!(result.sql.contains("LIMIT 25"));
        assert!(result.sql.contains("OFFSET 25"));
        assert_eq!(result.pagination.offset, 25);
        assert!(result.hints.is_empty());
    }

    #[test]
    fn test_first_page_has_zero_offset() {
        let result = paginate("SELECT * FROM t", 1, 50);
        assert!(result.sql.ends_with("LIMIT 50 OFFSET 0"));
    }

    #[test]
    fn test_oversized_page_size_is_capped() {
        let result = paginate("SELECT * FROM t", 1, 5000);
        assert!(result.sql.contains("LIMIT 1000"));
        assert!(result.hints.iter().any(|h| h.contains("capped at 1000")));
    }

    #[test]
    fn test_tiny_page_size_is_raised() {
        let result = paginate("SELECT * FROM t", 1, 1);
        assert!(result.sql.contains("LIMIT 10"));
        assert!(result.hints.iter().any(|h| h.contains("raised to 10")));
    }

    #[test]
    fn test_zero_page_is_raised() {
        let result = paginate("SELECT * FROM t", 0, 50);
        assert_eq!(result.pagination.page, 1);
        assert_eq!(result.pagination.offset, 0);
    }

    #[test]
    fn test_existing_limit_offset_stripped() {
        let result = paginate("SELECT * FROM t LIMIT 7 OFFSET 3;", 2, 10);
        assert!(!result.sql.contains("LIMIT 7"));
        assert!(!result.sql.contains("OFFSET 3"));
        assert!(result.sql.ends_with("LIMIT 10 OFFSET 10"));
    }

    #[test]
    fn test_count_sql_wraps_cleaned_query() {
        let result = paginate("SELECT * FROM t LIMIT 5", 1, 20);
        assert_eq!(result.count_sql, "SELECT COUNT(*) FROM (SELECT * FROM t) AS subquery");
    }
}
