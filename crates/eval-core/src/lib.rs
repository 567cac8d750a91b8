//! A dialect-aware SQL evaluation kernel: given a candidate SQL statement, a
//! target dialect, a schema, and (optionally) an expected result set, this
//! crate parses the SQL, detects hallucinated identifiers, executes it
//! against a sandboxed engine adapter, compares the result against what was
//! expected, and combines every signal into a single `MultiDimensionalScore`.
//!
//! The seven components line up roughly in pipeline order:
//!
//! - [`dialect`] — the closed set of supported SQL dialects and their
//!   capability/function profiles.
//! - [`schema`] — a database schema snapshot the detector and executor both
//!   consult.
//! - [`engine`] — uniform adapters over concrete SQL engines.
//! - [`parser`] — dialect-aware parsing with a fixed fallback chain.
//! - [`detector`] — hallucinated-identifier detection against a schema.
//! - [`executor`] — sandboxed end-to-end query processing.
//! - [`comparator`] — actual-vs-expected result comparison.
//! - [`analyzers`] — independent signal generators (complexity, performance,
//!   plan quality, error taxonomy, best practices, semantic accuracy).
//! - [`scorer`] — combines every signal into a `MultiDimensionalScore`.
//!
//! [`evaluate`] wires the whole pipeline together; [`process_query`] exposes
//! just the executor stage for callers who only want execution, not scoring.

pub mod analyzers;
pub mod comparator;
pub mod config;
pub mod detector;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod executor;
pub mod identifiers;
pub mod parser;
pub mod schema;
pub mod scorer;
pub mod task;
pub mod value;

pub use comparator::{compare, ComparisonResult, MatchStrategy};
pub use detector::{detect, validate, HallucinationReport, ValidationResult};
pub use dialect::{Dialect, DialectRegistry};
pub use engine::{EngineAdapter, EngineKind, ExecutionResult};
pub use error::{KernelError, ParseError};
pub use executor::{process as process_query, ExecutorResult, ExecutorStatus};
pub use parser::{parse, ParsedSQL};
pub use schema::{ColumnInfo, ForeignKey, SchemaSnapshot, TableInfo};
pub use scorer::{score, MultiDimensionalScore, ScoreWeights, ScoringInputs, WeightsPreset};
pub use task::{Difficulty, EvalOptions, Issue, IssueSeverity, Task, ValidationStrictness};
pub use value::{Row, Value};

/// Runs the full pipeline — parse, validate, execute, compare, analyze,
/// score — over one SQL candidate against one task (§6 `evaluate`).
///
/// `adapter` must already be connected; `evaluate` never calls `connect` or
/// `close` itself, mirroring [`EngineAdapter`]'s documented session-scoping
/// contract (the caller owns the adapter's lifetime).
pub fn evaluate(
    sql: &str,
    task: &Task,
    schema: &SchemaSnapshot,
    options: &EvalOptions,
    adapter: &mut dyn EngineAdapter,
) -> Result<MultiDimensionalScore, KernelError> {
    let expected_rows = options
        .expected_rows
        .as_deref()
        .or(task.expected_result.as_deref());

    let executor_result = executor::process(sql, schema, options, adapter)?;

    let parsed = parser::parse(sql, options.dialect);
    let hallucination = detector::detect(&parsed, schema, options.dialect);
    let complexity = analyzers::complexity::analyze(&parsed);
    let best_practices = analyzers::best_practices::analyze(&parsed);
    let plan = options
        .plan_text
        .as_deref()
        .map(analyzers::plan::analyze);

    let actual_rows: &[Row] = executor_result
        .execution
        .as_ref()
        .map(|e| e.rows.as_slice())
        .unwrap_or(&[]);
    let comparison = comparator::compare(actual_rows, expected_rows);
    let semantic = expected_rows.map(|expected| analyzers::semantic::analyze(actual_rows, expected));

    let row_estimate = executor_result
        .execution
        .as_ref()
        .map(|e| e.rows_returned as u64);

    let inputs = ScoringInputs {
        validation: &executor_result.validation,
        hallucination: &hallucination,
        execution: executor_result.execution.as_ref(),
        insights: &executor_result.insights,
        comparison: &comparison,
        complexity: &complexity,
        best_practices: &best_practices,
        dialect: options.dialect,
        row_estimate,
        plan: plan.as_ref(),
        semantic: semantic.as_ref(),
    };

    Ok(scorer::score(inputs, &options.weights_preset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnInfo, TableInfo};

    /// A minimal in-memory adapter for exercising `evaluate` without a real
    /// database driver, mirroring the teacher's pattern of a test-only fake
    /// implementing the same trait as the production adapters.
    struct FakeAdapter {
        dialect: Dialect,
        rows: Vec<Row>,
        columns: Vec<String>,
    }

    impl EngineAdapter for FakeAdapter {
        fn kind(&self) -> EngineKind {
            EngineKind::EmbeddedFile
        }
        fn dialect(&self) -> Dialect {
            self.dialect
        }
        fn connect(&mut self) -> Result<(), KernelError> {
            Ok(())
        }
        fn close(&mut self) -> Result<(), KernelError> {
            Ok(())
        }
        fn execute(&mut self, _sql: &str) -> Result<ExecutionResult, KernelError> {
            Ok(ExecutionResult::success(
                self.columns.clone(),
                self.rows.clone(),
                5,
                self.dialect,
            ))
        }
        fn introspect(&mut self) -> Result<SchemaSnapshot, KernelError> {
            Ok(SchemaSnapshot::new(self.dialect, "fake"))
        }
    }

    fn orders_schema() -> SchemaSnapshot {
        let mut snap = SchemaSnapshot::new(Dialect::Sqlite, "bench.db");
        let mut orders = TableInfo::new("orders");
        orders.push_column(ColumnInfo::new("id", "INTEGER").primary_key(true));
        orders.push_column(ColumnInfo::new("customer", "TEXT"));
        orders.push_column(ColumnInfo::new("total", "REAL"));
        snap.add_table(orders);
        snap
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn s1_valid_aggregation_scores_highly() {
        let schema = orders_schema();
        let task = Task {
            id: "s1".into(),
            question: "total spend per customer".into(),
            database: "bench.db".into(),
            dialect: Dialect::Sqlite,
            difficulty: Difficulty::Easy,
            gold_sql: "SELECT customer, SUM(total) AS total_spent FROM orders GROUP BY customer".into(),
            expected_result: None,
            tags: Vec::new(),
        };
        let expected = vec![row(&[
            ("customer", Value::Text("alice".into())),
            ("total_spent", Value::Float(225.0)),
        ])];
        let mut options = EvalOptions::new(Dialect::Sqlite);
        options.expected_rows = Some(expected.clone());

        let mut adapter = FakeAdapter {
            dialect: Dialect::Sqlite,
            rows: expected,
            columns: vec!["customer".into(), "total_spent".into()],
        };

        let score = evaluate(&task.gold_sql, &task, &schema, &options, &mut adapter).unwrap();
        assert!(score.overall > 0.8, "expected a high score, got {}", score.overall);
        assert!(score.dimensions.correctness >= 0.99);
        assert!(score.dimensions.safety >= 0.99);
    }

    #[test]
    fn phantom_table_drags_down_safety_and_overall() {
        let schema = orders_schema();
        let task = Task {
            id: "phantom".into(),
            question: "bogus".into(),
            database: "bench.db".into(),
            dialect: Dialect::Sqlite,
            difficulty: Difficulty::Easy,
            gold_sql: "SELECT * FROM customers".into(),
            expected_result: None,
            tags: Vec::new(),
        };
        let options = EvalOptions::new(Dialect::Sqlite);
        let mut adapter = FakeAdapter {
            dialect: Dialect::Sqlite,
            rows: Vec::new(),
            columns: Vec::new(),
        };

        let score = evaluate(&task.gold_sql, &task, &schema, &options, &mut adapter).unwrap();
        assert!(score.dimensions.safety < 1.0);
        assert_eq!(score.analysis.hallucination.phantom_tables, vec!["customers".to_string()]);
    }

    #[test]
    fn every_dimension_and_subscore_is_bounded() {
        let schema = orders_schema();
        let task = Task {
            id: "bounds".into(),
            question: "q".into(),
            database: "bench.db".into(),
            dialect: Dialect::Sqlite,
            difficulty: Difficulty::Easy,
            gold_sql: "SELECT customer FROM orders".into(),
            expected_result: None,
            tags: Vec::new(),
        };
        let options = EvalOptions::new(Dialect::Sqlite);
        let mut adapter = FakeAdapter {
            dialect: Dialect::Sqlite,
            rows: vec![row(&[("customer", Value::Text("alice".into()))])],
            columns: vec!["customer".into()],
        };

        let score = evaluate(&task.gold_sql, &task, &schema, &options, &mut adapter).unwrap();
        let dims = [
            score.dimensions.correctness,
            score.dimensions.safety,
            score.dimensions.efficiency,
            score.dimensions.result_completeness,
            score.dimensions.semantic_accuracy,
            score.dimensions.best_practices,
            score.dimensions.plan_quality,
        ];
        for d in dims {
            assert!((0.0..=1.0).contains(&d), "dimension out of bounds: {d}");
        }
        assert!((0.0..=1.0).contains(&score.overall));
    }

    #[test]
    fn overall_equals_weighted_sum_of_dimensions() {
        let schema = orders_schema();
        let task = Task {
            id: "invariant1".into(),
            question: "q".into(),
            database: "bench.db".into(),
            dialect: Dialect::Sqlite,
            difficulty: Difficulty::Easy,
            gold_sql: "SELECT customer FROM orders".into(),
            expected_result: None,
            tags: Vec::new(),
        };
        let options = EvalOptions::new(Dialect::Sqlite);
        let mut adapter = FakeAdapter {
            dialect: Dialect::Sqlite,
            rows: vec![row(&[("customer", Value::Text("alice".into()))])],
            columns: vec!["customer".into()],
        };

        let score = evaluate(&task.gold_sql, &task, &schema, &options, &mut adapter).unwrap();
        let w = &score.weights;
        let d = &score.dimensions;
        let expected_overall = w.correctness * d.correctness
            + w.safety * d.safety
            + w.efficiency * d.efficiency
            + w.result_completeness * d.result_completeness
            + w.semantic_accuracy * d.semantic_accuracy
            + w.best_practices * d.best_practices
            + w.plan_quality * d.plan_quality;
        assert!((score.overall - expected_overall.clamp(0.0, 1.0)).abs() < 1e-9);
    }
}
