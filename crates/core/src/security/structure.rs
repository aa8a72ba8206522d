//! Structural sanity checks.
//!
//! Cheap text-level checks that catch malformed generation output before it
//! reaches the backend: unbalanced quotes, mismatched parentheses, and
//! size/complexity warnings.

use std::sync::LazyLock;

use regex::Regex;

use super::SecurityReport;

/// Queries longer than this draw a performance warning.
const MAX_QUERY_LENGTH: usize = 10_000;

/// SELECT occurrences beyond this draw a complexity warning.
const MAX_SELECT_COUNT: usize = 10;

/// JOIN occurrences beyond this draw a complexity warning.
const MAX_JOIN_COUNT: usize = 8;

static SELECT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bselect\b").unwrap());
static JOIN_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bjoin\b").unwrap());

/// Validate the structural shape of `sql`.
pub fn check_structure(sql: &str) -> SecurityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if sql.chars().filter(|c| *c == '\'').count() % 2 != 0 {
        errors.push("unbalanced single quotes".to_string());
    }
    if sql.chars().filter(|c| *c == '"').count() % 2 != 0 {
        errors.push("unbalanced double quotes".to_string());
    }

    let mut depth: i32 = 0;
    let mut unmatched_close = false;
    for c in sql.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 && !unmatched_close {
                    unmatched_close = true;
                    errors.push("unmatched closing parenthesis".to_string());
                }
            }
            _ => {}
        }
    }
    if depth > 0 {
        errors.push(format!("unclosed parenthesis ({depth} open)"));
    }

    if sql.len() > MAX_QUERY_LENGTH {
        warnings.push(format!("query length {} exceeds {MAX_QUERY_LENGTH} characters", sql.len()));
    }

    let select_count = SELECT_KEYWORD.find_iter(sql).count();
    if select_count > MAX_SELECT_COUNT {
        warnings.push(format!("{select_count} SELECT keywords; deeply nested queries are slow"));
    }

    let join_count = JOIN_KEYWORD.find_iter(sql).count();
    if join_count > MAX_JOIN_COUNT {
        warnings.push(format!("{join_count} JOINs; consider splitting the query"));
    }

    SecurityReport::from_findings(errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_query_passes() {
        let report = check_structure("SELECT name FROM employees WHERE department = 'Sales'");
        assert!(report.safe);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unbalanced_single_quote() {
        let report = check_structure("SELECT * FROM t WHERE name = 'broken");
        assert!(!report.safe);
        assert!(report.errors.iter().any(|e| e.contains("single quotes")));
    }

    #[test]
    fn test_unbalanced_double_quote() {
        let report = check_structure("SELECT \"col FROM t");
        assert!(!report.safe);
    }

    #[test]
    fn test_unmatched_closing_paren() {
        let report = check_structure("SELECT a FROM t WHERE (x = 1))");
        assert!(!report.safe);
        assert!(report.errors.iter().any(|e| e.contains("unmatched closing")));
    }

    #[test]
    fn test_unclosed_paren() {
        let report = check_structure("SELECT a FROM t WHERE (x = 1");
        assert!(!report.safe);
        assert!(report.errors.iter().any(|e| e.contains("unclosed")));
    }

    #[test]
    fn test_length_warning() {
        let long_list = (0..2000).map(|i| format!("c{i}")).collect::<Vec<_>>().join(", ");
        let report = check_structure(&format!("SELECT {long_list} FROM t"));
        assert!(report.safe);
        assert!(report.warnings.iter().any(|w| w.contains("length")));
    }

    #[test]
    fn test_select_count_warning() {
        let nested = "SELECT ".repeat(11) + "1";
        let report = check_structure(&nested);
        assert!(report.warnings.iter().any(|w| w.contains("SELECT keywords")));
    }

    #[test]
    fn test_join_count_warning() {
        let mut sql = "SELECT * FROM a".to_string();
        for i in 0..9 {
            sql.push_str(&format!(" JOIN t{i} ON a.id = t{i}.id"));
        }
        let report = check_structure(&sql);
        assert!(report.warnings.iter().any(|w| w.contains("JOINs")));
    }
}
