//! Schema loading from a DDL file of `CREATE TABLE` statements.
//!
//! Grounded in the teacher's `analyzer/helpers/constraints.rs` constraint
//! extraction (inline and table-level PRIMARY KEY / FOREIGN KEY), adapted
//! to build an `eval_core::SchemaSnapshot` instead of a lineage schema.

use anyhow::{bail, Context, Result};
use sqlparser::ast::{ColumnDef, ColumnOption, Statement, TableConstraint};
use std::collections::HashSet;
use std::path::Path;

use eval_core::{ColumnInfo, Dialect, ForeignKey, SchemaSnapshot, TableInfo};

/// Loads a schema snapshot from a DDL file's `CREATE TABLE` statements.
pub fn load_schema_from_ddl(path: &Path, dialect: Dialect) -> Result<SchemaSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file: {}", path.display()))?;
    parse_schema_ddl(&content, dialect, path.display().to_string())
}

fn parse_schema_ddl(ddl: &str, dialect: Dialect, database: String) -> Result<SchemaSnapshot> {
    let statements = eval_core::parser::parse_statements(ddl, dialect)
        .map_err(|e| anyhow::anyhow!("failed to parse schema DDL: {e}"))?;

    let mut snapshot = SchemaSnapshot::new(dialect, database);
    let mut found_table = false;

    for statement in &statements {
        if let Statement::CreateTable(create) = statement {
            found_table = true;
            let name = create.name.to_string();
            let (table, foreign_keys) = build_table(&name, &create.columns, &create.constraints);
            snapshot.add_table(table);
            if !foreign_keys.is_empty() {
                snapshot.add_foreign_keys(name, foreign_keys);
            }
        }
    }

    if !found_table {
        bail!("schema DDL produced no CREATE TABLE statements");
    }

    Ok(snapshot)
}

fn build_table(
    name: &str,
    columns: &[ColumnDef],
    table_constraints: &[TableConstraint],
) -> (TableInfo, Vec<ForeignKey>) {
    let (pk_columns, table_fks) = extract_table_constraints(table_constraints);
    let pk_set: HashSet<&str> = pk_columns.iter().map(String::as_str).collect();

    let mut table = TableInfo::new(name);
    let mut foreign_keys = table_fks;

    for column in columns {
        let (is_pk, inline_fk) = extract_column_constraints(&column.options);
        let nullable = !column
            .options
            .iter()
            .any(|o| matches!(o.option, ColumnOption::NotNull));

        let mut info = ColumnInfo::new(column.name.value.clone(), column.data_type.to_string())
            .nullable(nullable)
            .primary_key(is_pk || pk_set.contains(column.name.value.as_str()));
        if let Some((ref_table, ref_column)) = &inline_fk {
            info.foreign_key = Some(format!("{ref_table}.{ref_column}"));
        }
        table.push_column(info);

        if let Some((ref_table, ref_column)) = inline_fk {
            foreign_keys.push(ForeignKey {
                column: column.name.value.clone(),
                referenced_table: ref_table,
                referenced_column: ref_column,
                name: None,
            });
        }
    }

    (table, foreign_keys)
}

/// Extracts inline column-level constraints: `(is_primary_key, foreign_key)`.
fn extract_column_constraints(options: &[sqlparser::ast::ColumnOptionDef]) -> (bool, Option<(String, String)>) {
    let mut is_pk = false;
    let mut fk = None;
    for opt in options {
        match &opt.option {
            ColumnOption::Unique { is_primary, .. } if *is_primary => is_pk = true,
            ColumnOption::ForeignKey {
                foreign_table,
                referred_columns,
                ..
            } => {
                if let Some(col) = referred_columns.first() {
                    fk = Some((foreign_table.to_string(), col.value.clone()));
                }
            }
            _ => {}
        }
    }
    (is_pk, fk)
}

/// Extracts table-level constraints: composite PK column names, plus any
/// table-level FOREIGN KEY constraints as fully built `ForeignKey`s.
fn extract_table_constraints(constraints: &[TableConstraint]) -> (Vec<String>, Vec<ForeignKey>) {
    let mut pk_columns = Vec::new();
    let mut foreign_keys = Vec::new();

    for constraint in constraints {
        match constraint {
            TableConstraint::PrimaryKey { columns, .. } => {
                pk_columns.extend(columns.iter().map(|c| c.column.expr.to_string()));
            }
            TableConstraint::ForeignKey {
                columns,
                foreign_table,
                referred_columns,
                ..
            } => {
                let ref_table = foreign_table.to_string();
                for (col, referred) in columns.iter().zip(referred_columns.iter()) {
                    foreign_keys.push(ForeignKey {
                        column: col.value.clone(),
                        referenced_table: ref_table.clone(),
                        referenced_column: referred.value.clone(),
                        name: None,
                    });
                }
            }
            _ => {}
        }
    }

    (pk_columns, foreign_keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_ddl() {
        let ddl = "CREATE TABLE users (id INT PRIMARY KEY, name TEXT NOT NULL, email TEXT);";
        let schema = parse_schema_ddl(ddl, Dialect::Sqlite, "test".into()).unwrap();
        assert!(schema.has_table("users"));
        let users = schema.get_table("users").unwrap();
        assert_eq!(users.columns.len(), 3);
        assert!(users.get_column("id").unwrap().primary_key);
        assert!(!users.get_column("name").unwrap().nullable);
        assert!(users.get_column("email").unwrap().nullable);
    }

    #[test]
    fn parses_multiple_tables_and_foreign_keys() {
        let ddl = "CREATE TABLE customers (id INT PRIMARY KEY, name TEXT);\n\
                   CREATE TABLE orders (id INT PRIMARY KEY, customer_id INT, \
                   FOREIGN KEY (customer_id) REFERENCES customers(id));";
        let schema = parse_schema_ddl(ddl, Dialect::Sqlite, "test".into()).unwrap();
        assert!(schema.has_table("customers"));
        assert!(schema.has_table("orders"));
        let fks = schema.foreign_keys_for("orders");
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].referenced_table, "customers");
        schema.validate_foreign_keys().unwrap();
    }

    #[test]
    fn invalid_ddl_is_an_error() {
        let result = parse_schema_ddl("THIS IS NOT VALID SQL AT ALL ;;;", Dialect::Sqlite, "test".into());
        assert!(result.is_err());
    }

    #[test]
    fn ddl_with_no_tables_is_an_error() {
        let result = parse_schema_ddl("SELECT 1;", Dialect::Sqlite, "test".into());
        assert!(result.is_err());
    }
}
