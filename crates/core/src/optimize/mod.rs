//! SQL cost optimization.
//!
//! A set of independent text-level transforms over generated SQL:
//!
//! - Pagination rewriting ([`pagination`])
//! - Advisory index hints ([`hints`])
//! - SELECT * elision ([`projection`])
//! - Subquery analysis ([`subquery`])
//! - Heuristic cost scoring ([`cost`])
//!
//! [`optimize_query`] composes them in a fixed order. Everything here is
//! best-effort string rewriting, not AST manipulation: correctness on exotic
//! dialect corners is not guaranteed, and the advisory stages never touch
//! the SQL at all.

pub mod cost;
pub mod hints;
pub mod pagination;
pub mod projection;
pub mod subquery;

use std::collections::HashMap;

pub use cost::{CostBucket, cost_score, estimate_cost};
pub use hints::index_hints;
pub use pagination::{MAX_PAGE_SIZE, MIN_PAGE_SIZE, Pagination, paginate};
pub use projection::rewrite_select_star;
pub use subquery::analyze_subqueries;

/// Statement timeout applied when the wrapper is enabled without an
/// explicit budget.
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 30_000;

/// Inputs to [`optimize_query`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeOptions<'a> {
    pub page: u32,
    pub page_size: u32,
    /// Table name to indexed columns, from backend introspection.
    pub indexed_columns: Option<&'a HashMap<String, Vec<String>>>,
    /// Table name to full column list, from backend introspection.
    pub table_columns: Option<&'a HashMap<String, Vec<String>>>,
    /// When set, prefix the SQL with a `SET LOCAL statement_timeout`.
    pub statement_timeout_ms: Option<u64>,
}

impl<'a> OptimizeOptions<'a> {
    /// Options with pagination only; schema maps absent, timeout off.
    pub fn pagination_only(page: u32, page_size: u32) -> Self {
        Self { page, page_size, ..Default::default() }
    }
}

/// Fully optimized query, composed from the individual stages.
#[derive(Debug, Clone)]
pub struct OptimizedQuery {
    pub sql: String,
    /// COUNT(*) companion for total-row computation.
    pub count_sql: String,
    pub pagination: Pagination,
    pub hints: Vec<String>,
    pub estimated_cost: CostBucket,
}

/// Run every optimization stage over `sql` in a fixed order:
/// pagination, index hints, SELECT * rewrite, subquery analysis, and the
/// opt-in statement-timeout prefix.
pub fn optimize_query(sql: &str, opts: &OptimizeOptions) -> OptimizedQuery {
    let estimated_cost = estimate_cost(sql);

    let paginated = paginate(sql, opts.page, opts.page_size);
    let mut hints = paginated.hints;

    if let Some(indexed) = opts.indexed_columns {
        hints.extend(index_hints(&paginated.sql, indexed));
    }

    let (rewritten, projection_hints) = rewrite_select_star(&paginated.sql, opts.table_columns);
    hints.extend(projection_hints);

    hints.extend(analyze_subqueries(&rewritten));

    let final_sql = match opts.statement_timeout_ms {
        Some(ms) => with_statement_timeout(&rewritten, ms),
        None => rewritten,
    };

    OptimizedQuery {
        sql: final_sql,
        count_sql: paginated.count_sql,
        pagination: paginated.pagination,
        hints,
        estimated_cost,
    }
}

/// Prefix `sql` with a statement-level timeout for backends that honor it.
pub fn with_statement_timeout(sql: &str, timeout_ms: u64) -> String {
    format!("SET LOCAL statement_timeout = {timeout_ms}; {sql}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_pagination_and_cost() {
        let result = optimize_query("SELECT name FROM employees", &OptimizeOptions::pagination_only(1, 50));
        assert!(result.sql.ends_with("LIMIT 50 OFFSET 0"));
        assert_eq!(result.estimated_cost, CostBucket::Low);
        assert_eq!(result.count_sql, "SELECT COUNT(*) FROM (SELECT name FROM employees) AS subquery");
    }

    #[test]
    fn test_star_rewrite_composes_with_pagination() {
        let columns = HashMap::from([("t".to_string(), vec!["a".to_string(), "b".to_string()])]);
        let opts = OptimizeOptions { table_columns: Some(&columns), ..OptimizeOptions::pagination_only(1, 20) };

        let result = optimize_query("SELECT * FROM t", &opts);
        assert!(result.sql.starts_with("SELECT a, b FROM t"));
        assert!(result.sql.ends_with("LIMIT 20 OFFSET 0"));
    }

    #[test]
    fn test_hint_lists_merge_across_stages() {
        let indexed = HashMap::from([("t".to_string(), vec!["id".to_string()])]);
        let opts = OptimizeOptions {
            indexed_columns: Some(&indexed),
            ..OptimizeOptions::pagination_only(1, 5000)
        };

        let result = optimize_query("SELECT * FROM t WHERE id = 1 ORDER BY name", &opts);
        assert!(result.hints.iter().any(|h| h.contains("capped")));
        assert!(result.hints.iter().any(|h| h.contains("t.id")));
        assert!(result.hints.iter().any(|h| h.contains("every column")));
    }

    #[test]
    fn test_timeout_wrapper_is_opt_in() {
        let without = optimize_query("SELECT 1", &OptimizeOptions::pagination_only(1, 10));
        assert!(!without.sql.contains("statement_timeout"));

        let opts = OptimizeOptions {
            statement_timeout_ms: Some(DEFAULT_STATEMENT_TIMEOUT_MS),
            ..OptimizeOptions::pagination_only(1, 10)
        };
        let with = optimize_query("SELECT 1", &opts);
        assert!(with.sql.starts_with("SET LOCAL statement_timeout = 30000;"));
    }
}
