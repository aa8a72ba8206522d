//! Read-only schema introspection.
//!
//! Builds the table/column/index maps consumed by the SQL generation
//! prompt and the optimizer's hint stages. Internal tables (`documents`,
//! `_migrations`) are excluded: generated SQL targets user data only.

use std::collections::HashMap;

use super::connection::StoreDb;
use super::error::StoreError;

/// Tables internal to quarry, hidden from generated SQL.
const INTERNAL_TABLES: &[&str] = &["documents", "_migrations"];

/// Introspected relational schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaInfo {
    /// Table name to full column list.
    pub tables: HashMap<String, Vec<String>>,
    /// Table name to columns covered by an index.
    pub indexed_columns: HashMap<String, Vec<String>>,
}

impl SchemaInfo {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Render the schema as prompt context, one line per table.
    pub fn context(&self) -> String {
        let mut names: Vec<&String> = self.tables.keys().collect();
        names.sort();

        names
            .iter()
            .map(|name| format!("table {} ({})", name, self.tables[*name].join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl StoreDb {
    /// Introspect user tables, their columns, and their indexed columns.
    ///
    /// Callers treat failure as "no schema available" rather than fatal:
    /// generation falls back to an empty context and optimization to
    /// pagination only.
    pub async fn introspect(&self) -> Result<SchemaInfo, StoreError> {
        self.conn
            .call(|conn| -> Result<SchemaInfo, StoreError> {
                let mut info = SchemaInfo::default();

                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                )?;
                let tables: Vec<String> = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<_, _>>()?;

                for table in tables {
                    if INTERNAL_TABLES.contains(&table.as_str()) {
                        continue;
                    }

                    let mut columns_stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
                    let columns: Vec<String> = columns_stmt
                        .query_map([], |row| row.get::<_, String>(1))?
                        .collect::<Result<_, _>>()?;

                    let mut indexes_stmt = conn.prepare(&format!("PRAGMA index_list(\"{table}\")"))?;
                    let index_names: Vec<String> = indexes_stmt
                        .query_map([], |row| row.get::<_, String>(1))?
                        .collect::<Result<_, _>>()?;

                    let mut indexed = Vec::new();
                    for index in index_names {
                        let mut info_stmt = conn.prepare(&format!("PRAGMA index_info(\"{index}\")"))?;
                        let index_columns: Vec<Option<String>> = info_stmt
                            .query_map([], |row| row.get::<_, Option<String>>(2))?
                            .collect::<Result<_, _>>()?;
                        for column in index_columns.into_iter().flatten() {
                            if !indexed.contains(&column) {
                                indexed.push(column);
                            }
                        }
                    }

                    info.tables.insert(table.clone(), columns);
                    info.indexed_columns.insert(table, indexed);
                }

                Ok(info)
            })
            .await
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_introspect_tables_and_columns() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.execute_batch(
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, department TEXT);
             CREATE INDEX idx_employees_department ON employees(department);",
        )
        .await
        .unwrap();

        let info = db.introspect().await.unwrap();
        assert_eq!(
            info.tables.get("employees"),
            Some(&vec!["id".to_string(), "name".to_string(), "department".to_string()])
        );
        assert!(info.indexed_columns["employees"].contains(&"department".to_string()));
    }

    #[tokio::test]
    async fn test_introspect_hides_internal_tables() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let info = db.introspect().await.unwrap();
        assert!(!info.tables.contains_key("documents"));
        assert!(!info.tables.contains_key("_migrations"));
        assert!(info.is_empty());
    }

    #[tokio::test]
    async fn test_context_renders_sorted_lines() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.execute_batch(
            "CREATE TABLE orders (id INTEGER, total REAL);
             CREATE TABLE customers (id INTEGER, name TEXT);",
        )
        .await
        .unwrap();

        let context = db.introspect().await.unwrap().context();
        assert_eq!(context, "table customers (id, name)\ntable orders (id, total)");
    }
}
