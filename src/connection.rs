//! DuckDB connection wrapper with catalog view registration and query execution.
//!
//! The card database is registered lazily as the `cards` view. The view is
//! built from schema introspection so the different shapes of the public card
//! database export (plain `name`/`type` columns, or a `label` struct and image
//! names) all normalize to the same column set:
//! `setCode, number, name, type, image`.

use crate::cache::CacheManager;
use crate::error::{MetagameError, Result};
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Wraps a DuckDB connection and registers card database files as views.
pub struct Connection {
    conn: DuckDbConnection,
    /// The cache manager used to download/locate data files.
    pub cache: RefCell<CacheManager>,
    registered_views: RefCell<HashSet<String>>,
}

impl Connection {
    /// Create a connection backed by the given cache.
    ///
    /// Opens an in-memory DuckDB database.
    pub fn new(cache: CacheManager) -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self {
            conn,
            cache: RefCell::new(cache),
            registered_views: RefCell::new(HashSet::new()),
        })
    }

    /// Ensure one or more views are registered, downloading data if needed.
    pub fn ensure_views(&self, views: &[&str]) -> Result<()> {
        for name in views {
            if !self.registered_views.borrow().contains(*name) {
                self.ensure_view(name)?;
            }
        }
        Ok(())
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available after the query has executed.
        let (column_names, column_count) = {
            let executed = rows_result.as_ref().ok_or_else(|| {
                MetagameError::InvalidArgument(format!("statement did not execute: {}", sql))
            })?;
            let names: Vec<String> = executed
                .column_names()
                .into_iter()
                .map(|s| s.to_string())
                .collect();
            (names, executed.column_count())
        };

        let mut out = Vec::new();
        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_count);
            for (i, col_name) in column_names.iter().enumerate().take(column_count) {
                map.insert(col_name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        match rows.next()? {
            Some(row) => Ok(Some(convert_value_ref(row.get_ref(0)?))),
            None => Ok(None),
        }
    }

    /// Create a DuckDB table from a newline-delimited JSON file.
    ///
    /// The rows must already use the normalized catalog column names when the
    /// table stands in for the `cards` view.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<()> {
        let path_fwd = ndjson_path.replace('\\', "/");
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}; \
             CREATE TABLE {} AS SELECT * FROM read_json_auto('{}', format='newline_delimited')",
            table_name, table_name, path_fwd
        ))?;
        self.registered_views
            .borrow_mut()
            .insert(table_name.to_string());
        Ok(())
    }

    /// Check whether a view has been registered.
    pub fn has_view(&self, name: &str) -> bool {
        self.registered_views.borrow().contains(name)
    }

    /// Return a list of all registered view names.
    pub fn views(&self) -> Vec<String> {
        let mut views: Vec<String> = self.registered_views.borrow().iter().cloned().collect();
        views.sort();
        views
    }

    /// Clear all registered views so they will be re-created on next access.
    pub fn reset_views(&self) {
        self.registered_views.borrow_mut().clear();
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }

    fn ensure_view(&self, view_name: &str) -> Result<()> {
        if self.registered_views.borrow().contains(view_name) {
            return Ok(());
        }
        if view_name != "cards" {
            return Err(MetagameError::NotFound(format!("Unknown view: {}", view_name)));
        }

        let path = self.cache.borrow_mut().ensure_json("cards")?;
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.register_cards_view(&path_str)
    }

    /// Register the normalized `cards` view over a card database JSON file.
    ///
    /// Only the schema is inspected (DESCRIBE); the data itself is scanned
    /// lazily by DuckDB on each query.
    pub fn register_cards_view(&self, path_str: &str) -> Result<()> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT column_name, column_type FROM \
             (DESCRIBE SELECT * FROM read_json_auto('{}'))",
            path_str
        ))?;

        let mut rows = stmt.query([])?;
        let mut schema: HashMap<String, String> = HashMap::new();
        while let Some(row) = rows.next()? {
            let col_name: String = row.get(0)?;
            let col_type: String = row.get(1)?;
            schema.insert(col_name, col_type);
        }

        let column = |candidates: &[&str]| -> String {
            for candidate in candidates {
                if schema.contains_key(*candidate) {
                    return format!("CAST(\"{}\" AS VARCHAR)", candidate);
                }
            }
            "CAST(NULL AS VARCHAR)".to_string()
        };

        let name_expr = if schema.contains_key("name") {
            column(&["name"])
        } else if schema
            .get("label")
            .map(|t| t.starts_with("STRUCT") && t.contains("eng"))
            .unwrap_or(false)
        {
            "CAST(\"label\".eng AS VARCHAR)".to_string()
        } else {
            column(&[])
        };

        let sql = format!(
            "CREATE OR REPLACE VIEW cards AS SELECT \
             {} AS setCode, {} AS number, {} AS name, {} AS \"type\", {} AS image \
             FROM read_json_auto('{}')",
            column(&["set", "setCode"]),
            column(&["number"]),
            name_expr,
            column(&["type"]),
            column(&["image", "imageName"]),
            path_str
        );
        self.conn.execute_batch(&sql)?;
        self.registered_views.borrow_mut().insert("cards".to_string());
        debug!(path = %path_str, columns = schema.len(), "registered cards view");

        Ok(())
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    use serde_json::Value;
    match val {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Number(n.into()),
        ValueRef::SmallInt(n) => Value::Number(n.into()),
        ValueRef::Int(n) => Value::Number(n.into()),
        ValueRef::BigInt(n) => Value::Number(n.into()),
        ValueRef::UTinyInt(n) => Value::Number(n.into()),
        ValueRef::USmallInt(n) => Value::Number(n.into()),
        ValueRef::UInt(n) => Value::Number(n.into()),
        ValueRef::UBigInt(n) => Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => Value::Number(i.into()),
            Err(_) => Value::String(n.to_string()),
        },
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => Value::Null,
    }
}
