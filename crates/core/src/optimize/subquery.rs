//! Subquery shape analysis.
//!
//! Counts derived-table nesting and flags IN-subqueries that usually
//! rewrite to joins. Advisory only: this stage never modifies the SQL.

use std::sync::LazyLock;

use regex::Regex;

/// Nesting depth beyond which a CTE rewrite is suggested.
const CTE_SUGGESTION_THRESHOLD: usize = 3;

static DERIVED_TABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bfrom\s*\(\s*select\b").unwrap());
static IN_SUBQUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwhere\s+[a-z0-9_.]+\s+(not\s+)?in\s*\(\s*select\b").unwrap());

/// Analyze `sql` for subquery shapes worth calling out.
pub fn analyze_subqueries(sql: &str) -> Vec<String> {
    let mut hints = Vec::new();

    let nested = DERIVED_TABLE.find_iter(sql).count();
    if nested > 0 {
        hints.push(format!("query nests {nested} derived table(s)"));
    }
    if nested > CTE_SUGGESTION_THRESHOLD {
        hints.push("consider restructuring with CTEs (WITH ...)".to_string());
    }

    if IN_SUBQUERY.is_match(sql) {
        hints.push("IN (SELECT ...) can usually be rewritten as a JOIN".to_string());
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_query_has_no_hints() {
        assert!(analyze_subqueries("SELECT * FROM t WHERE x = 1").is_empty());
    }

    #[test]
    fn test_counts_derived_tables() {
        let hints = analyze_subqueries("SELECT a FROM (SELECT a FROM t) AS sub");
        assert!(hints.iter().any(|h| h.contains("1 derived table")));
    }

    #[test]
    fn test_deep_nesting_suggests_ctes() {
        let sql = "SELECT * FROM (SELECT * FROM (SELECT * FROM (SELECT * FROM (SELECT 1) a) b) c) d";
        let hints = analyze_subqueries(sql);
        assert!(hints.iter().any(|h| h.contains("4 derived table")));
        assert!(hints.iter().any(|h| h.contains("CTEs")));
    }

    #[test]
    fn test_in_subquery_suggests_join() {
        let hints = analyze_subqueries("SELECT * FROM orders WHERE customer_id IN (SELECT id FROM customers)");
        assert!(hints.iter().any(|h| h.contains("JOIN")));
    }

    #[test]
    fn test_in_value_list_is_fine() {
        assert!(analyze_subqueries("SELECT * FROM t WHERE status IN ('a', 'b')").is_empty());
    }
}
