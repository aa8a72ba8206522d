//! Advisory index hints.
//!
//! Compares columns the query filters, sorts, or joins on against the
//! indexed columns the caller supplies (from backend introspection). Emits
//! text hints only; the SQL is never rewritten here.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static FROM_TABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bfrom\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static WHERE_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([a-z_][a-z0-9_]*)\s*(?:=|<>|!=|>=|<=|>|<|\blike\b|\bin\s*\()").unwrap());
static ORDER_BY_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\border\s+by\s+(?:[a-z_][a-z0-9_]*\.)?([a-z_][a-z0-9_]*)").unwrap());
static JOIN_RIGHT_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bjoin\s+([a-z_][a-z0-9_]*)[^;]*?\bon\s+[a-z0-9_.]+\s*=\s*(?:[a-z_][a-z0-9_]*\.)?([a-z_][a-z0-9_]*)")
        .unwrap()
});

/// Produce advisory hints for `sql` against known indexed columns.
///
/// `indexed_columns` maps table name to the columns covered by an index.
pub fn index_hints(sql: &str, indexed_columns: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut hints = Vec::new();

    let Some(table) = first_table(sql) else {
        return hints;
    };
    let table_indexes = indexed_columns.get(&table);

    if let Some(where_pos) = sql.to_lowercase().find("where")
        && let Some(indexes) = table_indexes
    {
        for captures in WHERE_COLUMN.captures_iter(&sql[where_pos..]) {
            let column = captures[1].to_lowercase();
            if indexes.iter().any(|c| c.eq_ignore_ascii_case(&column)) {
                hints.push(format!("index on {table}.{column} can serve the WHERE filter"));
            }
        }
    }

    if let Some(captures) = ORDER_BY_COLUMN.captures(sql) {
        let column = captures[1].to_lowercase();
        let indexed = table_indexes
            .map(|cols| cols.iter().any(|c| c.eq_ignore_ascii_case(&column)))
            .unwrap_or(false);
        if indexed {
            hints.push(format!("index on {table}.{column} can serve the ORDER BY"));
        } else {
            hints.push(format!("consider an index on {table}.{column} to avoid sorting"));
        }
    }

    for captures in JOIN_RIGHT_COLUMN.captures_iter(sql) {
        let joined_table = captures[1].to_lowercase();
        let column = captures[2].to_lowercase();
        let indexed = indexed_columns
            .get(&joined_table)
            .map(|cols| cols.iter().any(|c| c.eq_ignore_ascii_case(&column)))
            .unwrap_or(false);
        if !indexed {
            hints.push(format!("consider an index on {joined_table}.{column} for the join condition"));
        }
    }

    hints
}

/// First table referenced in a FROM clause, lowercased.
pub fn first_table(sql: &str) -> Option<String> {
    FROM_TABLE.captures(sql).map(|c| c[1].to_lowercase())
}
