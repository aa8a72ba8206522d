//! Read-only enforcement.
//!
//! Generated queries must be pure reads: a mutating keyword at the start of
//! any statement is an error, and the query as a whole must begin with
//! SELECT or WITH. Multi-statement input is downgraded to a warning because
//! the pipeline truncates to the first statement before execution.

use std::sync::LazyLock;

use regex::Regex;

use super::SecurityReport;

static MUTATING_AT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*(insert|update|delete|drop|create|alter|truncate|grant|revoke)\b").unwrap()
});

/// Check that `sql` is a read-only statement.
pub fn enforce_read_only(sql: &str) -> SecurityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Some(captures) = MUTATING_AT_START.captures(sql)
        && let Some(keyword) = captures.get(1)
    {
        errors.push(format!("write operation not permitted: {}", keyword.as_str().to_uppercase()));
    }

    let upper = sql.trim_start().to_uppercase();
    if !upper.starts_with("SELECT") && !upper.starts_with("WITH") {
        errors.push("query must start with SELECT or WITH".to_string());
    }

    let statement_count = sql.split(';').filter(|s| !s.trim().is_empty()).count();
    if statement_count > 1 {
        warnings.push(format!(
            "{statement_count} statements detected; only the first will be executed"
        ));
    }

    SecurityReport::from_findings(errors, warnings)
}

/// The first non-empty statement of `sql`, with surrounding whitespace and
/// any trailing statements removed. This is what the executor receives.
pub fn first_statement(sql: &str) -> &str {
    sql.split(';').find(|s| !s.trim().is_empty()).unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_allowed() {
        let report = enforce_read_only("SELECT * FROM employees");
        assert!(report.safe);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_cte_is_allowed() {
        let report = enforce_read_only("WITH x AS (SELECT 1) SELECT * FROM x");
        assert!(report.safe);
    }

    #[test]
    fn test_update_is_rejected() {
        let report = enforce_read_only("UPDATE t SET x=1");
        assert!(!report.safe);
        assert!(report.errors.iter().any(|e| e.contains("UPDATE")));
    }

    #[test]
    fn test_each_mutating_keyword_rejected() {
        for sql in [
            "INSERT INTO t VALUES (1)",
            "DELETE FROM t",
            "DROP TABLE t",
            "CREATE TABLE t (id INT)",
            "ALTER TABLE t ADD c INT",
            "TRUNCATE TABLE t",
            "GRANT ALL ON t TO u",
            "REVOKE ALL ON t FROM u",
        ] {
            assert!(!enforce_read_only(sql).safe, "should reject: {sql}");
        }
    }

    #[test]
    fn test_mutating_after_semicolon_rejected() {
        let report = enforce_read_only("SELECT 1; DELETE FROM t");
        assert!(!report.safe);
        assert!(report.errors.iter().any(|e| e.contains("DELETE")));
    }

    #[test]
    fn test_mutating_keyword_in_literal_is_fine() {
        // "update" only matters at a statement start.
        let report = enforce_read_only("SELECT * FROM logs WHERE action = 'update'");
        assert!(report.safe);
    }

    #[test]
    fn test_must_start_with_select_or_with() {
        let report = enforce_read_only("EXPLAIN SELECT 1");
        assert!(!report.safe);
        assert!(report.errors.iter().any(|e| e.contains("SELECT or WITH")));
    }

    #[test]
    fn test_multiple_statements_warn_only() {
        let report = enforce_read_only("SELECT 1; SELECT 2");
        assert!(report.safe);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("only the first"));
    }

    #[test]
    fn test_trailing_semicolon_is_not_multi_statement() {
        let report = enforce_read_only("SELECT 1;");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_first_statement_truncates() {
        assert_eq!(first_statement("SELECT 1; DROP TABLE t"), "SELECT 1");
        assert_eq!(first_statement("  SELECT 2  "), "SELECT 2");
        assert_eq!(first_statement(";; SELECT 3"), "SELECT 3");
        assert_eq!(first_statement(""), "");
    }
}
