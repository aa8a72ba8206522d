//! Model output sanitization.
//!
//! Generation output is prose-prone: code fences, label prefixes, trailing
//! commentary. These helpers cut it down to the usable token stream before
//! validation ever sees it.

use std::sync::LazyLock;

use regex::Regex;

use super::QueryKind;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```(?:sql)?\s*(.*?)```").unwrap());
static SQL_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(select|with)\b").unwrap());

/// Reduce raw model output to a bare SQL statement.
///
/// Strips code fences and any leading label text, then cuts from the first
/// `SELECT`/`WITH` token and drops a trailing semicolon. Returns None when
/// no such token exists, which callers treat as generation failure.
pub fn sanitize_sql(raw: &str) -> Option<String> {
    let fenced = CODE_FENCE.captures(raw).map(|c| c[1].to_string());
    let candidate = fenced.as_deref().unwrap_or(raw);

    let start = SQL_START.find(candidate)?.start();
    let sql = candidate[start..].trim().trim_end_matches(';').trim_end();

    if sql.is_empty() { None } else { Some(sql.to_string()) }
}

/// Parse a classification reply into a [`QueryKind`].
///
/// Tolerant of prose around the answer; anything unrecognized falls back
/// to the structured path, which is deterministic and auditable.
pub fn parse_query_kind(raw: &str) -> QueryKind {
    let lower = raw.to_lowercase();
    if lower.contains("hybrid") {
        QueryKind::Hybrid
    } else if lower.contains("document") {
        QueryKind::Document
    } else {
        QueryKind::Structured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sql_passes_through() {
        assert_eq!(sanitize_sql("SELECT * FROM t"), Some("SELECT * FROM t".to_string()));
    }

    #[test]
    fn test_strips_code_fence() {
        let raw = "```sql\nSELECT name FROM employees;\n```";
        assert_eq!(sanitize_sql(raw), Some("SELECT name FROM employees".to_string()));
    }

    #[test]
    fn test_strips_bare_fence() {
        let raw = "```\nSELECT 1\n```";
        assert_eq!(sanitize_sql(raw), Some("SELECT 1".to_string()));
    }

    #[test]
    fn test_strips_label_prefix() {
        let raw = "Here is the query you asked for:\nSELECT id FROM orders";
        assert_eq!(sanitize_sql(raw), Some("SELECT id FROM orders".to_string()));
    }

    #[test]
    fn test_keeps_cte_start() {
        let raw = "Sure! WITH recent AS (SELECT 1) SELECT * FROM recent;";
        assert_eq!(
            sanitize_sql(raw),
            Some("WITH recent AS (SELECT 1) SELECT * FROM recent".to_string())
        );
    }

    #[test]
    fn test_no_sql_token_is_failure() {
        assert_eq!(sanitize_sql("I cannot answer that question."), None);
        assert_eq!(sanitize_sql(""), None);
    }

    #[test]
    fn test_parse_query_kind_variants() {
        assert_eq!(parse_query_kind("structured"), QueryKind::Structured);
        assert_eq!(parse_query_kind("The answer is: document"), QueryKind::Document);
        assert_eq!(parse_query_kind("hybrid\n"), QueryKind::Hybrid);
        assert_eq!(parse_query_kind("no idea"), QueryKind::Structured);
    }
}
