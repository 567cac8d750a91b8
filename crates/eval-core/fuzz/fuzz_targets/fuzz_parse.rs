//! Fuzz target for the SQL parser.
//!
//! Checks §8 invariant 3: `parse` is total and never panics on arbitrary
//! input, regardless of dialect.

#![no_main]

use arbitrary::Arbitrary;
use eval_core::{parse, Dialect};
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

fuzz_target!(|input: FuzzInput| {
    let _parsed = parse(&input.sql, input.dialect());
});
