//! eval-bench CLI library.
//!
//! Exposes internal modules for testing; the entry point is the
//! `eval-bench` binary.

pub mod cli;
pub mod input;
pub mod output;
pub mod schema;

pub use cli::Args;

#[cfg(test)]
pub(crate) mod test_support {
    use eval_core::{
        analyzers::{best_practices, complexity},
        comparator, parser, scorer, ColumnInfo, Dialect, HallucinationReport, MultiDimensionalScore,
        SchemaSnapshot, TableInfo, ValidationResult,
    };

    /// Builds a small, self-consistent score for output-formatter tests,
    /// exercising the same pipeline `main.rs` does but skipping execution.
    pub fn sample_score() -> MultiDimensionalScore {
        let mut schema = SchemaSnapshot::new(Dialect::Sqlite, "sample.db");
        let mut orders = TableInfo::new("orders");
        orders.push_column(ColumnInfo::new("id", "INTEGER").primary_key(true));
        orders.push_column(ColumnInfo::new("customer", "TEXT"));
        orders.push_column(ColumnInfo::new("total", "REAL"));
        schema.add_table(orders);

        let sql = "SELECT customer, SUM(total) AS total_spent FROM orders GROUP BY customer";
        let parsed = parser::parse(sql, Dialect::Sqlite);
        let hallucination = HallucinationReport {
            phantom_tables: Vec::new(),
            phantom_columns: Vec::new(),
            phantom_functions: Vec::new(),
            dialect: Dialect::Sqlite,
            hallucination_score: 0.0,
            weighted_score: 1.0,
        };
        let complexity = complexity::analyze(&parsed);
        let best_practices = best_practices::analyze(&parsed);
        let comparison = comparator::compare(&[], None);

        let inputs = scorer::ScoringInputs {
            validation: &ValidationResult::default(),
            hallucination: &hallucination,
            execution: None,
            insights: &[],
            comparison: &comparison,
            complexity: &complexity,
            best_practices: &best_practices,
            dialect: Dialect::Sqlite,
            row_estimate: None,
            plan: None,
            semantic: None,
        };
        scorer::score(inputs, &scorer::WeightsPreset::Default)
    }
}
