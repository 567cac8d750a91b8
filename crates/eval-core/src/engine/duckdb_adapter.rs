//! Native `duckdb` adapter — the *embedded-analytical* variant (§4.C).
//! Synchronous by nature, unlike the sqlx-backed variants, so this adapter
//! needs no runtime of its own.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Instant;

use duckdb::types::ValueRef;
use duckdb::{Connection, Row as DuckRow};
use regex::Regex;

use crate::dialect::Dialect;
use crate::engine::{normalize_single_statement, EngineAdapter, EngineKind, ExecutionResult};
use crate::error::KernelError;
use crate::schema::{ColumnInfo, ForeignKey, SchemaSnapshot, TableInfo};
use crate::value::{Row, Value};

/// An `EngineAdapter` backed by an in-process DuckDB connection.
///
/// `path` is either a filesystem path or `":memory:"`; the connection opens
/// lazily on `connect` and closes on `Drop`, matching the sqlx adapter's
/// RAII release (§11).
pub struct DuckDbAdapter {
    path: String,
    conn: Option<Connection>,
}

impl DuckDbAdapter {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    fn conn(&self) -> Result<&Connection, KernelError> {
        self.conn.as_ref().ok_or_else(|| KernelError::ConnectionError {
            message: "adapter is not connected".to_string(),
        })
    }
}

impl EngineAdapter for DuckDbAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::EmbeddedAnalytical
    }

    fn dialect(&self) -> Dialect {
        Dialect::Duckdb
    }

    fn connect(&mut self) -> Result<(), KernelError> {
        let conn = if self.path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.path)
        }
        .map_err(|e| KernelError::ConnectionError {
            message: e.to_string(),
        })?;
        self.conn = Some(conn);
        Ok(())
    }

    fn close(&mut self) -> Result<(), KernelError> {
        self.conn = None;
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<ExecutionResult, KernelError> {
        let conn = self.conn()?;
        let stmt = normalize_single_statement(sql);
        let started = Instant::now();

        let outcome = (|| -> Result<(Vec<String>, Vec<Row>), duckdb::Error> {
            let mut prepared = conn.prepare(stmt)?;
            let columns: Vec<String> = prepared.column_names();
            let mut rows = Vec::new();
            let mut result_rows = prepared.query([])?;
            while let Some(duck_row) = result_rows.next()? {
                rows.push(duck_row_to_value_row(duck_row, &columns)?);
            }
            Ok((columns, rows))
        })();

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok((columns, rows)) => Ok(ExecutionResult::success(columns, rows, elapsed_ms, Dialect::Duckdb)),
            Err(e) => Ok(ExecutionResult::failure(e.to_string(), elapsed_ms, Dialect::Duckdb)),
        }
    }

    fn introspect(&mut self) -> Result<SchemaSnapshot, KernelError> {
        let conn = self.conn()?;
        let mut snapshot = SchemaSnapshot::new(Dialect::Duckdb, self.path.clone());

        let mut table_stmt = conn
            .prepare(
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = 'main' ORDER BY table_name",
            )
            .map_err(|e| KernelError::EngineSyntaxError { message: e.to_string() })?;
        let table_names: Vec<String> = table_stmt
            .query_map([], |r| r.get::<_, String>(0))
            .map_err(|e| KernelError::EngineSyntaxError { message: e.to_string() })?
            .filter_map(Result::ok)
            .collect();
        drop(table_stmt);

        for name in &table_names {
            let pk_columns = primary_key_columns(conn, name)?;
            let mut table = TableInfo::new(name.clone());
            let mut col_stmt = conn
                .prepare(
                    "SELECT column_name, data_type, is_nullable = 'YES' \
                     FROM information_schema.columns \
                     WHERE table_name = ? ORDER BY ordinal_position",
                )
                .map_err(|e| KernelError::EngineSyntaxError { message: e.to_string() })?;
            let columns = col_stmt
                .query_map([name], |r| {
                    let col_name: String = r.get(0)?;
                    let data_type: String = r.get(1)?;
                    let nullable: bool = r.get(2)?;
                    Ok((col_name, data_type, nullable))
                })
                .map_err(|e| KernelError::EngineSyntaxError { message: e.to_string() })?;
            for col in columns.filter_map(Result::ok) {
                let is_pk = pk_columns.contains(&col.0.to_lowercase());
                table.push_column(ColumnInfo::new(col.0, col.1).nullable(col.2).primary_key(is_pk));
            }
            snapshot.add_table(table);
        }

        for name in &table_names {
            let fks = foreign_keys_for_table(conn, name)?;
            if !fks.is_empty() {
                snapshot.add_foreign_keys(name.clone(), fks);
            }
        }

        Ok(snapshot)
    }
}

/// Column names (lowercased) that participate in `table`'s primary key, via
/// the sqlite-compatible `pragma_table_info` table function DuckDB exposes.
fn primary_key_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, KernelError> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?) WHERE pk > 0")
        .map_err(|e| KernelError::EngineSyntaxError { message: e.to_string() })?;
    let names = stmt
        .query_map([table], |r| r.get::<_, String>(0))
        .map_err(|e| KernelError::EngineSyntaxError { message: e.to_string() })?
        .filter_map(Result::ok)
        .map(|n| n.to_lowercase())
        .collect();
    Ok(names)
}

/// Extracts this table's foreign keys from `duckdb_constraints()`. DuckDB
/// doesn't expose the referenced table/column as separate fields, so we
/// parse them out of the constraint's DDL text (e.g. `FOREIGN KEY (a) \
/// REFERENCES b(c)`).
fn foreign_keys_for_table(conn: &Connection, table: &str) -> Result<Vec<ForeignKey>, KernelError> {
    static FK_PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = FK_PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?i)foreign\s+key\s*\(\s*"?([\w]+)"?\s*\)\s*references\s+"?([\w]+)"?\s*\(\s*"?([\w]+)"?\s*\)"#,
        )
        .expect("valid regex")
    });

    let mut stmt = conn
        .prepare(
            "SELECT constraint_text FROM duckdb_constraints() \
             WHERE table_name = ? AND constraint_type = 'FOREIGN KEY'",
        )
        .map_err(|e| KernelError::EngineSyntaxError { message: e.to_string() })?;
    let texts: Vec<String> = stmt
        .query_map([table], |r| r.get::<_, String>(0))
        .map_err(|e| KernelError::EngineSyntaxError { message: e.to_string() })?
        .filter_map(Result::ok)
        .collect();

    Ok(texts
        .iter()
        .filter_map(|text| {
            let caps = re.captures(text)?;
            Some(ForeignKey {
                column: caps.get(1)?.as_str().to_string(),
                referenced_table: caps.get(2)?.as_str().to_string(),
                referenced_column: caps.get(3)?.as_str().to_string(),
                name: None,
            })
        })
        .collect())
}

fn duck_row_to_value_row(row: &DuckRow, columns: &[String]) -> Result<Row, duckdb::Error> {
    let mut out = Row::new();
    for (idx, name) in columns.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Boolean(b) => Value::Boolean(b),
            ValueRef::TinyInt(i) => Value::Integer(i as i64),
            ValueRef::SmallInt(i) => Value::Integer(i as i64),
            ValueRef::Int(i) => Value::Integer(i as i64),
            ValueRef::BigInt(i) => Value::Integer(i),
            ValueRef::HugeInt(i) => Value::Integer(i as i64),
            ValueRef::UTinyInt(i) => Value::Integer(i as i64),
            ValueRef::USmallInt(i) => Value::Integer(i as i64),
            ValueRef::UInt(i) => Value::Integer(i as i64),
            ValueRef::UBigInt(i) => Value::Integer(i as i64),
            ValueRef::Float(f) => Value::Float(f as f64),
            ValueRef::Double(f) => Value::Float(f),
            ValueRef::Decimal(d) => Value::Float(d.to_string().parse().unwrap_or(0.0)),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).to_string()),
            ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
            ValueRef::Timestamp(_, v) => Value::Timestamp(v.to_string()),
            ValueRef::Date32(v) => Value::Timestamp(v.to_string()),
            other => Value::Text(format!("{other:?}")),
        };
        out.insert(name.clone(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_adapter_round_trips_a_query() {
        let mut adapter = DuckDbAdapter::in_memory();
        adapter.connect().unwrap();
        let result = adapter.execute("SELECT 1 AS n").unwrap();
        assert!(result.success);
        assert_eq!(result.rows_returned, 1);
        assert_eq!(result.columns, vec!["n".to_string()]);
    }

    #[test]
    fn introspect_reports_created_table() {
        let mut adapter = DuckDbAdapter::in_memory();
        adapter.connect().unwrap();
        adapter.execute("CREATE TABLE widgets (id INTEGER, name VARCHAR)").unwrap();
        let snapshot = adapter.introspect().unwrap();
        assert!(snapshot.has_table("widgets"));
        assert!(snapshot.has_column("widgets", "name"));
    }

    #[test]
    fn introspect_reports_primary_and_foreign_keys() {
        let mut adapter = DuckDbAdapter::in_memory();
        adapter.connect().unwrap();
        adapter
            .execute("CREATE TABLE customers (id INTEGER PRIMARY KEY, name VARCHAR)")
            .unwrap();
        adapter
            .execute(
                "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER, \
                 FOREIGN KEY (customer_id) REFERENCES customers(id))",
            )
            .unwrap();
        let snapshot = adapter.introspect().unwrap();

        let customers = snapshot.get_table("customers").unwrap();
        assert!(customers.get_column("id").unwrap().primary_key);
        assert!(!customers.get_column("name").unwrap().primary_key);

        let orders_fks = snapshot.foreign_keys_for("orders");
        assert_eq!(orders_fks.len(), 1);
        assert_eq!(orders_fks[0].column, "customer_id");
        assert_eq!(orders_fks[0].referenced_table, "customers");
        assert_eq!(orders_fks[0].referenced_column, "id");
        assert!(snapshot.validate_foreign_keys().is_ok());
    }

    #[test]
    fn failed_execution_reports_error_without_fatal_propagation() {
        let mut adapter = DuckDbAdapter::in_memory();
        adapter.connect().unwrap();
        let result = adapter.execute("SELECT * FROM nonexistent_table").unwrap();
        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
