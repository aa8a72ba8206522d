//! SELECT * elision.
//!
//! Replaces `SELECT *` with an explicit column list when the caller can
//! supply one from introspection. Without a column map the stage only emits
//! an advisory hint.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::hints::first_table;

/// Columns listed in the hint before the ellipsis marker.
const HINT_COLUMN_PREVIEW: usize = 5;

static SELECT_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)select\s+\*").unwrap());

/// Rewrite `SELECT *` to an explicit column list for the first table.
///
/// `table_columns` maps table name to its full column list. Returns the
/// (possibly rewritten) SQL and any hints produced.
pub fn rewrite_select_star(sql: &str, table_columns: Option<&HashMap<String, Vec<String>>>) -> (String, Vec<String>) {
    if !SELECT_STAR.is_match(sql) {
        return (sql.to_string(), Vec::new());
    }

    let columns = first_table(sql)
        .and_then(|table| table_columns.and_then(|map| map.get(&table).cloned()))
        .filter(|cols| !cols.is_empty());

    match columns {
        Some(cols) => {
            let rewritten = SELECT_STAR
                .replace(sql, format!("SELECT {}", cols.join(", ")))
                .into_owned();

            let mut preview = cols.iter().take(HINT_COLUMN_PREVIEW).cloned().collect::<Vec<_>>().join(", ");
            if cols.len() > HINT_COLUMN_PREVIEW {
                preview.push_str(", ...");
            }
            let hint = format!("SELECT * replaced with {} columns: {preview}", cols.len());

            (rewritten, vec![hint])
        }
        None => (
            sql.to_string(),
            vec!["SELECT * returns every column; list only the columns you need".to_string()],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> HashMap<String, Vec<String>> {
        HashMap::from([(
            "employees".to_string(),
            vec!["id", "name", "email", "department", "salary", "hire_date"]
                .into_iter()
                .map(String::from)
                .collect(),
        )])
    }

    #[test]
    fn test_rewrites_star_with_known_columns() {
        let (sql, hints) = rewrite_select_star("SELECT * FROM employees WHERE id = 1", Some(&columns()));
        assert!(sql.starts_with("SELECT id, name, email, department, salary, hire_date FROM employees"));
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("6 columns"));
        assert!(hints[0].contains("..."));
    }

    #[test]
    fn test_hint_preview_is_capped_at_five() {
        let (_, hints) = rewrite_select_star("SELECT * FROM employees", Some(&columns()));
        assert!(hints[0].contains("id, name, email, department, salary, ..."));
        assert!(!hints[0].contains("hire_date"));
    }

    #[test]
    fn test_without_column_map_only_hints() {
        let (sql, hints) = rewrite_select_star("SELECT * FROM employees", None);
        assert_eq!(sql, "SELECT * FROM employees");
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("every column"));
    }

    #[test]
    fn test_unknown_table_only_hints() {
        let (sql, hints) = rewrite_select_star("SELECT * FROM mystery", Some(&columns()));
        assert_eq!(sql, "SELECT * FROM mystery");
        assert_eq!(hints.len(), 1);
    }

    #[test]
    fn test_explicit_columns_untouched() {
        let (sql, hints) = rewrite_select_star("SELECT name FROM employees", Some(&columns()));
        assert_eq!(sql, "SELECT name FROM employees");
        assert!(hints.is_empty());
    }
}
