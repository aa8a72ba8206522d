//! Raw SQL execution returning JSON row maps.
//!
//! The pipeline hands over already-validated, already-optimized SQL; this
//! module only runs it and converts rows into `serde_json` objects keyed
//! by column name.

use serde_json::Value;
use tokio_rusqlite::rusqlite::types::ValueRef;

use super::connection::StoreDb;
use super::error::StoreError;

impl StoreDb {
    /// Execute a read query and collect every row as a JSON object.
    pub async fn execute(&self, sql: &str) -> Result<Vec<Value>, StoreError> {
        let sql = sql.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<Value>, StoreError> {
                let mut stmt = conn.prepare(&sql)?;
                let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

                let mut rows = stmt.query([])?;
                let mut results = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut object = serde_json::Map::with_capacity(columns.len());
                    for (index, column) in columns.iter().enumerate() {
                        object.insert(column.clone(), json_value(row.get_ref(index)?));
                    }
                    results.push(Value::Object(object));
                }

                Ok(results)
            })
            .await
            .map_err(StoreError::from)
    }

    /// Execute a query expected to return a single integer, e.g. COUNT(*).
    pub async fn execute_scalar(&self, sql: &str) -> Result<i64, StoreError> {
        let sql = sql.to_string();
        self.conn
            .call(move |conn| -> Result<i64, StoreError> {
                conn.query_row(&sql, [], |row| row.get(0)).map_err(StoreError::from)
            })
            .await
            .map_err(StoreError::from)
    }
}

/// Map a SQLite value to its JSON representation.
fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::String(hex::encode(blob)),
    }
}
