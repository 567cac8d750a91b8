//! Benchmark task definitions and the options that govern one evaluation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::value::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Enterprise,
}

/// A benchmark task: a natural-language question bound to a known schema,
/// with an optional expected result set for the comparator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub question: String,
    pub database: String,
    pub dialect: Dialect,
    pub difficulty: Difficulty,
    pub gold_sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<Vec<Row>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// How strictly the executor enforces validation findings before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStrictness {
    /// Phantom table/column errors abort execution (default).
    #[default]
    RejectOnError,
    /// Phantom table/column errors are recorded but execution proceeds.
    WarnOnly,
    /// Validation is skipped entirely.
    Off,
}

/// Options governing one `evaluate` / `process_query` call (§6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvalOptions {
    pub dialect: Dialect,
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub validation_strictness: ValidationStrictness,
    #[serde(default)]
    pub allow_non_select: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_rows: Option<Vec<Row>>,
    #[serde(default)]
    pub weights_preset: crate::scorer::WeightsPreset,
}

fn default_max_rows() -> usize {
    100
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl EvalOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            max_rows: default_max_rows(),
            timeout_ms: default_timeout_ms(),
            validation_strictness: ValidationStrictness::default(),
            allow_non_select: false,
            plan_text: None,
            expected_rows: None,
            weights_preset: crate::scorer::WeightsPreset::default(),
        }
    }

    /// Applies `KernelConfig` defaults to any field a caller left unset —
    /// in practice this just re-derives timeout/max_rows from config when
    /// constructing options programmatically instead of via `new`.
    pub fn from_config(dialect: Dialect, config: &crate::config::KernelConfig) -> Self {
        Self {
            dialect,
            max_rows: config.max_sample_rows,
            timeout_ms: config.query_timeout_ms,
            validation_strictness: ValidationStrictness::default(),
            allow_non_select: false,
            plan_text: None,
            expected_rows: None,
            weights_preset: crate::scorer::WeightsPreset::default(),
        }
    }
}

/// Severity of a non-fatal diagnostic accumulated during validation or
/// execution (phantom-function warnings, truncation notices, dialect
/// fallback notices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

/// A single non-fatal diagnostic. Carries a machine-readable `code` from
/// the closed set in [`issue_codes`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: IssueSeverity,
    pub code: String,
    pub message: String,
}

impl Issue {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Info,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Closed, machine-readable issue codes, following the teacher's
/// `issue_codes` module pattern.
pub mod issue_codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const PHANTOM_TABLE: &str = "PHANTOM_TABLE";
    pub const PHANTOM_COLUMN: &str = "PHANTOM_COLUMN";
    pub const PHANTOM_FUNCTION: &str = "PHANTOM_FUNCTION";
    pub const DIALECT_FALLBACK: &str = "DIALECT_FALLBACK";
    pub const EMPTY_RESULT: &str = "EMPTY_RESULT";
    pub const POSSIBLE_TRUNCATION: &str = "POSSIBLE_TRUNCATION";
    pub const SLOW_EXECUTION: &str = "SLOW_EXECUTION";
    pub const NULL_HEAVY_COLUMN: &str = "NULL_HEAVY_COLUMN";
    pub const CANCELLED: &str = "CANCELLED";
}
