//! Sandboxed Executor (component F): dialect-correct end-to-end processing
//! of one query — parse, validate, apply a safety envelope, execute, and
//! collect insights.

use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
#[cfg(feature = "tracing")]
use tracing::{info, instrument};

use crate::detector::{self, ValidationResult};
use crate::engine::{EngineAdapter, ExecutionResult};
use crate::error::KernelError;
use crate::schema::SchemaSnapshot;
use crate::task::{issue_codes, EvalOptions, Issue, ValidationStrictness};

/// Outcome status of one `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorStatus {
    Success,
    Failed,
    Cancelled,
}

/// The bundled result of executor processing (§4.F): validation findings,
/// execution outcome, and post-execution insights.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorResult {
    pub status: ExecutorStatus,
    pub validation: ValidationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionResult>,
    pub insights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewritten_sql: Option<String>,
}

impl ExecutorResult {
    fn failed(validation: ValidationResult) -> Self {
        Self {
            status: ExecutorStatus::Failed,
            validation,
            execution: None,
            insights: Vec::new(),
            rewritten_sql: None,
        }
    }
}

static LIMIT_CLAUSE: OnceLock<Regex> = OnceLock::new();

fn has_explicit_limit(sql: &str) -> bool {
    let re = LIMIT_CLAUSE.get_or_init(|| Regex::new(r"(?i)\blimit\s+\d+").expect("valid regex"));
    re.is_match(sql)
}

fn is_row_returning(statement: &Statement) -> bool {
    matches!(statement, Statement::Query(_))
}

/// Appends `LIMIT max_rows` to a single row-returning statement that lacks
/// one, per the §4.F safety envelope. `max_rows == 0` means "no limit" and
/// disables the rewrite entirely.
fn apply_row_limit(sql: &str, statement: &Statement, max_rows: usize) -> Option<String> {
    if max_rows == 0 || !is_row_returning(statement) || has_explicit_limit(sql) {
        return None;
    }
    let trimmed = sql.trim().trim_end_matches(';').trim();
    Some(format!("{trimmed} LIMIT {max_rows}"))
}

/// Executor-only entry point (§6 `process_query`): parse -> validate ->
/// rewrite -> execute -> insights, with no comparison or scoring.
pub fn process(
    sql: &str,
    schema: &SchemaSnapshot,
    options: &EvalOptions,
    adapter: &mut dyn EngineAdapter,
) -> Result<ExecutorResult, KernelError> {
    let parsed = crate::parser::parse(sql, options.dialect);
    if !parsed.is_valid {
        return Ok(ExecutorResult::failed(ValidationResult {
            issues: vec![Issue::error(
                issue_codes::PARSE_ERROR,
                parsed.error.clone().unwrap_or_default(),
            )],
        }));
    }

    let validation = if options.validation_strictness == ValidationStrictness::Off {
        ValidationResult::default()
    } else {
        let report = detector::detect(&parsed, schema, options.dialect);
        let mut result = ValidationResult::default();
        for t in &report.phantom_tables {
            result.issues.push(Issue::error(
                issue_codes::PHANTOM_TABLE,
                format!("table not found in schema: {t}"),
            ));
        }
        for c in &report.phantom_columns {
            result.issues.push(Issue::error(
                issue_codes::PHANTOM_COLUMN,
                format!("column not found in schema: {c}"),
            ));
        }
        for f in &report.phantom_functions {
            result.issues.push(Issue::warning(
                issue_codes::PHANTOM_FUNCTION,
                format!("function not recognized for dialect {:?}: {f}", options.dialect),
            ));
        }
        result
    };

    if options.validation_strictness == ValidationStrictness::RejectOnError && !validation.is_valid() {
        return Ok(ExecutorResult::failed(validation));
    }

    let statement = match parsed.statements().next() {
        Some(s) => s,
        None => return Ok(ExecutorResult::failed(validation)),
    };

    if !options.allow_non_select && !is_row_returning(statement) {
        let mut validation = validation;
        validation.issues.push(Issue::error(
            issue_codes::PARSE_ERROR,
            "non-SELECT statements are not permitted (allow_non_select is false)".to_string(),
        ));
        return Ok(ExecutorResult::failed(validation));
    }

    let rewritten_sql = apply_row_limit(sql, statement, options.max_rows);
    let effective_sql = rewritten_sql.as_deref().unwrap_or(sql);

    let started = Instant::now();
    let execution = run_with_timeout(adapter, effective_sql, options.timeout_ms, started)?;

    let insights = collect_insights(&execution, options);

    let status = if execution.success {
        ExecutorStatus::Success
    } else {
        ExecutorStatus::Failed
    };

    Ok(ExecutorResult {
        status,
        validation,
        execution: Some(execution),
        insights,
        rewritten_sql,
    })
}

/// Runs `adapter.execute`, converting an elapsed-time overrun into a failed
/// `ExecutionResult` rather than trusting the adapter to self-enforce the
/// deadline (most adapters have no native query-level timeout knob).
///
/// A timeout is carried as `success=false` with a `KernelError::
/// ExecutionTimeout`-shaped message rather than propagated as `Err` — per
/// §7 the final score is always produced, even on complete failure, and an
/// `Err` here would abort `process`/`evaluate` before a score exists.
#[cfg_attr(feature = "tracing", instrument(skip(adapter), fields(timeout_ms)))]
fn run_with_timeout(
    adapter: &mut dyn EngineAdapter,
    sql: &str,
    timeout_ms: u64,
    started: Instant,
) -> Result<ExecutionResult, KernelError> {
    let result = adapter.execute(sql)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if timeout_ms > 0 && elapsed_ms > timeout_ms {
        #[cfg(feature = "tracing")]
        info!(elapsed_ms, timeout_ms, "query exceeded configured timeout");
        let timeout = KernelError::ExecutionTimeout {
            elapsed_ms,
            limit_ms: timeout_ms,
        };
        return Ok(ExecutionResult::failure(timeout.to_string(), elapsed_ms, result.dialect));
    }
    Ok(result)
}

fn collect_insights(execution: &ExecutionResult, options: &EvalOptions) -> Vec<String> {
    let mut insights = Vec::new();
    if !execution.success {
        return insights;
    }
    if execution.rows.is_empty() {
        insights.push(issue_codes::EMPTY_RESULT.to_string());
    }
    if options.max_rows > 0 && execution.rows_returned == options.max_rows {
        insights.push(issue_codes::POSSIBLE_TRUNCATION.to_string());
    }
    if execution.execution_time_ms > crate::config::KernelConfig::default().slow_execution_threshold_ms {
        insights.push(issue_codes::SLOW_EXECUTION.to_string());
    }
    for column in &execution.columns {
        let null_count = execution
            .rows
            .iter()
            .filter(|row| row.get(column).map_or(true, |v| v.is_null()))
            .count();
        if !execution.rows.is_empty() && null_count * 2 > execution.rows.len() {
            insights.push(format!("{}:{column}", issue_codes::NULL_HEAVY_COLUMN));
        }
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn has_explicit_limit_detects_clause_case_insensitively() {
        assert!(has_explicit_limit("select * from t limit 10"));
        assert!(has_explicit_limit("SELECT * FROM t LIMIT 10"));
        assert!(!has_explicit_limit("select * from t"));
    }

    #[test]
    fn apply_row_limit_skips_statements_that_already_have_one() {
        let parsed = crate::parser::parse("SELECT * FROM t LIMIT 5", Dialect::Sqlite);
        let stmt = parsed.statements().next().unwrap();
        assert!(apply_row_limit("SELECT * FROM t LIMIT 5", stmt, 100).is_none());
    }

    #[test]
    fn apply_row_limit_appends_when_missing() {
        let parsed = crate::parser::parse("SELECT * FROM t", Dialect::Sqlite);
        let stmt = parsed.statements().next().unwrap();
        let rewritten = apply_row_limit("SELECT * FROM t", stmt, 100).unwrap();
        assert!(rewritten.to_uppercase().ends_with("LIMIT 100"));
    }

    #[test]
    fn apply_row_limit_zero_means_unlimited() {
        let parsed = crate::parser::parse("SELECT * FROM t", Dialect::Sqlite);
        let stmt = parsed.statements().next().unwrap();
        assert!(apply_row_limit("SELECT * FROM t", stmt, 0).is_none());
    }

    #[test]
    fn non_row_returning_statement_is_never_rewritten() {
        let parsed = crate::parser::parse("DELETE FROM t WHERE id = 1", Dialect::Sqlite);
        let stmt = parsed.statements().next().unwrap();
        assert!(apply_row_limit("DELETE FROM t WHERE id = 1", stmt, 100).is_none());
    }

    /// Sleeps past the configured timeout before returning a successful
    /// result, so `run_with_timeout` must intervene on elapsed time alone.
    struct SlowAdapter;

    impl crate::engine::EngineAdapter for SlowAdapter {
        fn kind(&self) -> crate::engine::EngineKind {
            crate::engine::EngineKind::EmbeddedFile
        }
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }
        fn connect(&mut self) -> Result<(), KernelError> {
            Ok(())
        }
        fn close(&mut self) -> Result<(), KernelError> {
            Ok(())
        }
        fn execute(&mut self, _sql: &str) -> Result<ExecutionResult, KernelError> {
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(ExecutionResult::success(vec!["n".to_string()], Vec::new(), 0, Dialect::Sqlite))
        }
        fn introspect(&mut self) -> Result<SchemaSnapshot, KernelError> {
            Ok(SchemaSnapshot::new(Dialect::Sqlite, "slow"))
        }
    }

    #[test]
    fn timeout_surfaces_as_failed_execution_not_a_propagated_error() {
        let mut adapter = SlowAdapter;
        let started = Instant::now();
        let execution = run_with_timeout(&mut adapter, "SELECT 1", 1, started)
            .expect("timeout must be surfaced as a result, not an Err");
        assert!(!execution.success);
        assert!(execution
            .error
            .as_deref()
            .is_some_and(|e| e.to_lowercase().contains("timed out")));
        assert_eq!(
            crate::analyzers::error_taxonomy::classify_message(execution.error.as_deref().unwrap()),
            crate::analyzers::error_taxonomy::ErrorCategory::Timeout
        );
    }
}
