//! Fuzz target for parse + hallucination detection together.
//!
//! Checks that `detect` never panics once `parse` has produced a
//! `ParsedSQL` for arbitrary SQL against a small, fixed schema — including
//! the degenerate case where the input fails to parse at all.

#![no_main]

use arbitrary::Arbitrary;
use eval_core::{detect, parse, ColumnInfo, Dialect, SchemaSnapshot, TableInfo};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    sql: String,
    dialect_idx: u8,
}

impl FuzzInput {
    fn dialect(&self) -> Dialect {
        match self.dialect_idx % 6 {
            0 => Dialect::Sqlite,
            1 => Dialect::Duckdb,
            2 => Dialect::Postgresql,
            3 => Dialect::Bigquery,
            4 => Dialect::Snowflake,
            _ => Dialect::Mysql,
        }
    }
}

fn fixed_schema(dialect: Dialect) -> SchemaSnapshot {
    let mut snap = SchemaSnapshot::new(dialect, "fuzz");
    let mut orders = TableInfo::new("orders");
    orders.push_column(ColumnInfo::new("id", "INTEGER").primary_key(true));
    orders.push_column(ColumnInfo::new("customer", "TEXT"));
    orders.push_column(ColumnInfo::new("total", "REAL"));
    snap.add_table(orders);
    snap
}

fuzz_target!(|input: FuzzInput| {
    let dialect = input.dialect();
    let parsed = parse(&input.sql, dialect);
    let _report = detect(&parsed, &fixed_schema(dialect), dialect);
});
