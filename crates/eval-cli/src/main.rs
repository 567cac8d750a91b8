//! eval-bench: a thin external collaborator over the evaluation kernel.
//!
//! Wires a SQL candidate, an optional task/expected-result file, a schema
//! (DDL file or live introspection), and a connected engine adapter through
//! `eval_core::evaluate`, then prints the resulting `MultiDimensionalScore`.
//! Everything interesting — parsing, hallucination detection, sandboxed
//! execution, comparison, scoring — lives in `eval-core`; this binary only
//! adapts it to a command line.

mod cli;
mod input;
mod logging;
mod output;
mod schema;

use anyhow::{Context, Result};
use clap::Parser;
use eval_core::{Dialect, Difficulty, EngineAdapter, EvalOptions, SchemaSnapshot, Task};
use std::process::ExitCode;

use cli::Args;
use output::{format_json, format_table};

fn main() -> ExitCode {
    logging::init();
    match run() {
        Ok(overall_ok) => {
            if overall_ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("eval-bench: error: {e:#}");
            ExitCode::from(66)
        }
    }
}

fn run() -> Result<bool> {
    let args = Args::parse();

    let sql = input::read_sql(args.sql.as_deref(), args.sql_file.as_deref())?;
    let task = load_or_build_task(&args, &sql)?;
    let dialect = args.dialect.map(Into::into).unwrap_or(task.dialect);

    #[cfg(feature = "adapters")]
    let mut adapter = build_adapter(dialect, args.database.as_deref())?;
    #[cfg(not(feature = "adapters"))]
    let mut adapter = {
        let _ = &args.database;
        anyhow::bail!("built without the `adapters` feature; no engine is available to execute against")
    };

    let schema = load_schema(&args, dialect, adapter.as_mut())?;

    let mut options = EvalOptions::new(dialect);
    if let Some(max_rows) = args.max_rows {
        options.max_rows = max_rows;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        options.timeout_ms = timeout_ms;
    }
    options.validation_strictness = args.validation.into();
    options.allow_non_select = args.allow_non_select;
    options.weights_preset = args.weights.into();
    if let Some(expected_path) = &args.expected {
        options.expected_rows = Some(load_expected_rows(expected_path)?);
    }

    let score = eval_core::evaluate(&sql, &task, &schema, &options, adapter.as_mut())
        .context("evaluation failed")?;

    let rendered = match args.format {
        cli::OutputFormat::Json => format_json(&score, args.compact),
        cli::OutputFormat::Table => format_table(&score, args.quiet, !args.quiet),
    };
    write_output(&args.output, &rendered)?;

    Ok(score.dimensions.correctness >= 0.999 && score.analysis.hallucination.is_clean())
}

fn load_or_build_task(args: &Args, sql: &str) -> Result<Task> {
    if let Some(path) = &args.task {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read task file: {}", path.display()))?;
        return serde_json::from_str(&content).with_context(|| format!("invalid task JSON in {}", path.display()));
    }
    let dialect = args.dialect.map(Into::into).unwrap_or(Dialect::Sqlite);
    Ok(Task {
        id: "adhoc".to_string(),
        question: String::new(),
        database: args.database.clone().unwrap_or_default(),
        dialect,
        difficulty: Difficulty::Medium,
        gold_sql: sql.to_string(),
        expected_result: None,
        tags: Vec::new(),
    })
}

fn load_expected_rows(path: &std::path::Path) -> Result<Vec<eval_core::Row>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read expected-result file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid expected-result JSON in {}", path.display()))
}

fn load_schema(
    args: &Args,
    dialect: Dialect,
    adapter: &mut dyn EngineAdapter,
) -> Result<SchemaSnapshot> {
    match &args.schema {
        Some(path) => schema::load_schema_from_ddl(path, dialect),
        None => adapter
            .introspect()
            .context("no --schema given and live introspection failed"),
    }
}

#[cfg(feature = "adapters")]
fn build_adapter(dialect: Dialect, database: Option<&str>) -> Result<Box<dyn EngineAdapter>> {
    use eval_core::engine::duckdb_adapter::DuckDbAdapter;
    use eval_core::engine::sqlx_adapter::SqlxAdapter;

    let mut adapter: Box<dyn EngineAdapter> = match dialect {
        Dialect::Duckdb => Box::new(DuckDbAdapter::new(database.unwrap_or(":memory:"))),
        Dialect::Sqlite => {
            let url = database
                .map(|d| format!("sqlite://{d}"))
                .unwrap_or_else(|| "sqlite::memory:".to_string());
            Box::new(SqlxAdapter::new(url)?)
        }
        Dialect::Postgresql | Dialect::Mysql => {
            let url = database.context("--database is required for postgresql/mysql")?;
            Box::new(SqlxAdapter::new(url)?)
        }
        Dialect::Bigquery | Dialect::Snowflake => {
            anyhow::bail!("no built-in engine adapter for {dialect:?}; bring your own EngineAdapter via the library API")
        }
    };
    adapter.connect().context("failed to connect to the engine")?;
    Ok(adapter)
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    use std::io::Write;
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write to {}", path.display())),
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(content.as_bytes())
                .context("failed to write to stdout")?;
            if !content.ends_with('\n') {
                writeln!(stdout).ok();
            }
            Ok(())
        }
    }
}
