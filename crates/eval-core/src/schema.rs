//! Dialect-agnostic schema model: tables, columns, keys, and the FK graph,
//! with case-insensitive lookup throughout.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// A single column's declared shape.
///
/// Name comparisons anywhere in this module are case-insensitive; the name
/// itself is stored as written by the introspecting adapter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    /// Encoded as `"table.column"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_expr: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary_key: false,
            foreign_key: None,
            default_expr: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    fn name_matches(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

/// A foreign key constraint local to one table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A table's shape: ordered columns, optional approximate row count.
///
/// Invariant: column names are unique under case-insensitive comparison —
/// enforced by `TableInfo::push_column`, not merely documented.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub columns: Vec<ColumnInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_row_count: Option<u64>,
    /// Best-effort index names, supplemental to §4.C (absence degrades
    /// gracefully; nothing downstream depends on this being populated).
    #[serde(default)]
    pub indexes: Vec<String>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            approximate_row_count: None,
            indexes: Vec::new(),
        }
    }

    /// Appends a column, silently replacing any existing column whose name
    /// matches case-insensitively (keeps the invariant true by construction
    /// rather than merely asserting it).
    pub fn push_column(&mut self, column: ColumnInfo) {
        if let Some(existing) = self
            .columns
            .iter_mut()
            .find(|c| c.name_matches(&column.name))
        {
            *existing = column;
        } else {
            self.columns.push(column);
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name_matches(name))
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name_matches(name))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Immutable capture of a database's structure at a moment in time — the
/// ground truth the hallucination detector judges queries against.
///
/// Produced by `EngineAdapter::introspect`; replaced wholesale (never
/// mutated in place) by `refresh_schema`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    pub dialect: Dialect,
    pub database: String,
    tables: HashMap<String, TableInfo>,
    foreign_keys: HashMap<String, Vec<ForeignKey>>,
    #[schemars(with = "String")]
    pub captured_at: DateTime<Utc>,
}

impl SchemaSnapshot {
    pub fn new(dialect: Dialect, database: impl Into<String>) -> Self {
        Self {
            dialect,
            database: database.into(),
            tables: HashMap::new(),
            foreign_keys: HashMap::new(),
            captured_at: Utc::now(),
        }
    }

    /// Inserts (or replaces) a table. Keyed case-insensitively via a
    /// lowercased index key, the table's own `name` retains original casing.
    pub fn add_table(&mut self, table: TableInfo) {
        self.tables.insert(table.name.to_lowercase(), table);
    }

    pub fn add_foreign_keys(&mut self, table: impl Into<String>, fks: Vec<ForeignKey>) {
        self.foreign_keys.insert(table.into().to_lowercase(), fks);
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    pub fn get_table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableInfo> {
        self.tables.values()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.get_table(table)
            .is_some_and(|t| t.has_column(column))
    }

    /// Bare-column lookup: every table that has a column of this name,
    /// used when a column reference carries no qualifier.
    pub fn get_column_anywhere(&self, column: &str) -> Vec<&str> {
        self.tables
            .values()
            .filter(|t| t.has_column(column))
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn foreign_keys_for(&self, table: &str) -> &[ForeignKey] {
        self.foreign_keys
            .get(&table.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Verifies the snapshot's own invariant: every FK's referenced table
    /// and column must exist in the snapshot. Adapters should call this
    /// after introspection in debug/test builds; the kernel otherwise
    /// trusts the snapshot is well-formed.
    pub fn validate_foreign_keys(&self) -> Result<(), String> {
        for fks in self.foreign_keys.values() {
            for fk in fks {
                if !self.has_table(&fk.referenced_table) {
                    return Err(format!(
                        "foreign key references unknown table {}",
                        fk.referenced_table
                    ));
                }
                if !self.has_column(&fk.referenced_table, &fk.referenced_column) {
                    return Err(format!(
                        "foreign key references unknown column {}.{}",
                        fk.referenced_table, fk.referenced_column
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchemaSnapshot {
        let mut snap = SchemaSnapshot::new(Dialect::Sqlite, "bench.db");
        let mut orders = TableInfo::new("orders");
        orders.push_column(ColumnInfo::new("id", "INTEGER").primary_key(true));
        orders.push_column(ColumnInfo::new("customer", "TEXT"));
        orders.push_column(ColumnInfo::new("total", "REAL"));
        snap.add_table(orders);
        snap
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let snap = sample();
        assert!(snap.has_table("ORDERS"));
        assert!(snap.has_column("Orders", "CUSTOMER"));
        assert!(snap.get_table("orders").is_some());
    }

    #[test]
    fn has_column_implies_has_table() {
        let snap = sample();
        for table in snap.tables() {
            for col in table.column_names() {
                assert!(snap.has_column(&table.name, col));
                assert!(snap.has_table(&table.name));
            }
        }
    }

    #[test]
    fn get_column_anywhere_finds_bare_column() {
        let snap = sample();
        assert_eq!(snap.get_column_anywhere("customer"), vec!["orders"]);
        assert!(snap.get_column_anywhere("nonexistent").is_empty());
    }

    #[test]
    fn duplicate_column_push_replaces_not_duplicates() {
        let mut table = TableInfo::new("users");
        table.push_column(ColumnInfo::new("id", "INTEGER"));
        table.push_column(ColumnInfo::new("ID", "BIGINT"));
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.get_column("id").unwrap().data_type, "BIGINT");
    }

    #[test]
    fn validate_foreign_keys_detects_dangling_reference() {
        let mut snap = sample();
        snap.add_foreign_keys(
            "orders",
            vec![ForeignKey {
                column: "customer".into(),
                referenced_table: "customers".into(),
                referenced_column: "id".into(),
                name: None,
            }],
        );
        assert!(snap.validate_foreign_keys().is_err());
    }
}
