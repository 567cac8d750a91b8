//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// eval-bench - run one SQL candidate through the evaluation kernel and
/// print its multi-dimensional score.
#[derive(Parser, Debug)]
#[command(name = "eval-bench")]
#[command(about = "Score a SQL query against a schema and (optionally) an expected result", long_about = None)]
#[command(version)]
pub struct Args {
    /// SQL file to evaluate (reads from stdin if omitted and --sql is absent)
    #[arg(value_name = "SQL_FILE")]
    pub sql_file: Option<PathBuf>,

    /// SQL text given directly, instead of a file or stdin
    #[arg(long, conflicts_with = "sql_file")]
    pub sql: Option<String>,

    /// Benchmark task JSON ({id, question, database, dialect, difficulty,
    /// goldSql, expectedResult?, tags}). Its dialect/expected_result are
    /// used unless overridden by other flags.
    #[arg(long, value_name = "FILE")]
    pub task: Option<PathBuf>,

    /// SQL dialect; overrides the task file's dialect if both are given
    #[arg(short, long, value_enum)]
    pub dialect: Option<DialectArg>,

    /// Schema DDL file (CREATE TABLE statements) for hallucination detection
    #[arg(short, long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Database connection string to execute against: a file path for
    /// sqlite/duckdb, or a postgres://.../mysql://... URL for server-based
    /// engines. When --schema is omitted, the schema is introspected live
    /// from this connection instead.
    #[arg(long, value_name = "URL_OR_PATH")]
    pub database: Option<String>,

    /// Expected result rows, as a JSON array of row objects; overrides the
    /// task file's expected_result
    #[arg(long, value_name = "FILE")]
    pub expected: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Scoring weights preset
    #[arg(short, long, value_enum, default_value = "default")]
    pub weights: WeightsArg,

    /// Row limit the executor's safety envelope enforces (0 = unlimited)
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Per-query timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Validation strictness before execution
    #[arg(long, value_enum, default_value = "reject-on-error")]
    pub validation: ValidationArg,

    /// Permit non-SELECT statements to execute
    #[arg(long)]
    pub allow_non_select: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress the issues/insights section
    #[arg(short, long)]
    pub quiet: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,
}

/// SQL dialect options, mirroring `eval_core::Dialect`'s closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Sqlite,
    Duckdb,
    Postgresql,
    Bigquery,
    Snowflake,
    Mysql,
}

impl From<DialectArg> for eval_core::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Sqlite => eval_core::Dialect::Sqlite,
            DialectArg::Duckdb => eval_core::Dialect::Duckdb,
            DialectArg::Postgresql => eval_core::Dialect::Postgresql,
            DialectArg::Bigquery => eval_core::Dialect::Bigquery,
            DialectArg::Snowflake => eval_core::Dialect::Snowflake,
            DialectArg::Mysql => eval_core::Dialect::Mysql,
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
}

/// Scoring weights preset, mirroring `eval_core::WeightsPreset`'s named
/// variants (the `Custom` variant has no CLI surface; pass an explicit
/// weight map only through the library API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WeightsArg {
    Default,
    Strict,
    Performance,
    Quality,
}

impl From<WeightsArg> for eval_core::WeightsPreset {
    fn from(w: WeightsArg) -> Self {
        match w {
            WeightsArg::Default => eval_core::WeightsPreset::Default,
            WeightsArg::Strict => eval_core::WeightsPreset::Strict,
            WeightsArg::Performance => eval_core::WeightsPreset::Performance,
            WeightsArg::Quality => eval_core::WeightsPreset::Quality,
        }
    }
}

/// Validation strictness options, mirroring `eval_core::ValidationStrictness`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValidationArg {
    RejectOnError,
    WarnOnly,
    Off,
}

impl From<ValidationArg> for eval_core::ValidationStrictness {
    fn from(v: ValidationArg) -> Self {
        match v {
            ValidationArg::RejectOnError => eval_core::ValidationStrictness::RejectOnError,
            ValidationArg::WarnOnly => eval_core::ValidationStrictness::WarnOnly,
            ValidationArg::Off => eval_core::ValidationStrictness::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_conversion() {
        let dialect: eval_core::Dialect = DialectArg::Postgresql.into();
        assert_eq!(dialect, eval_core::Dialect::Postgresql);
    }

    #[test]
    fn parse_minimal_args() {
        let args = Args::parse_from(["eval-bench", "query.sql"]);
        assert_eq!(args.sql_file.unwrap().to_str().unwrap(), "query.sql");
        assert_eq!(args.format, OutputFormat::Table);
        assert!(args.dialect.is_none());
    }

    #[test]
    fn parse_full_args() {
        let args = Args::parse_from([
            "eval-bench",
            "-d",
            "postgresql",
            "-f",
            "json",
            "-s",
            "schema.sql",
            "-o",
            "output.json",
            "-w",
            "strict",
            "--quiet",
            "--compact",
            "--max-rows",
            "50",
            "--timeout-ms",
            "5000",
            "--validation",
            "warn-only",
            "query.sql",
        ]);
        assert_eq!(args.dialect, Some(DialectArg::Postgresql));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.schema.unwrap().to_str().unwrap(), "schema.sql");
        assert_eq!(args.output.unwrap().to_str().unwrap(), "output.json");
        assert_eq!(args.weights, WeightsArg::Strict);
        assert_eq!(args.max_rows, Some(50));
        assert_eq!(args.timeout_ms, Some(5000));
        assert_eq!(args.validation, ValidationArg::WarnOnly);
        assert!(args.quiet);
        assert!(args.compact);
    }

    #[test]
    fn sql_flag_conflicts_with_positional_file() {
        let result = Args::try_parse_from(["eval-bench", "--sql", "SELECT 1", "query.sql"]);
        assert!(result.is_err());
    }
}
