//! Engine Adapter (component C): a uniform interface over a concrete SQL
//! engine. The adapter never parses SQL — it is intentionally dumb about
//! semantics; policy (row limits, validation, what's allowed) lives one
//! layer up in the executor.
//!
//! Three variants by capability, per §4.C:
//! - *embedded-file* — sqlite, via [`sqlx_adapter::SqlxAdapter`].
//! - *embedded-analytical* — duckdb, via [`duckdb_adapter::DuckDbAdapter`].
//! - *server-based* — postgresql/mysql, also via [`sqlx_adapter::SqlxAdapter`]
//!   (same transport, different connection string and capability profile).

#[cfg(feature = "adapters")]
pub mod duckdb_adapter;
#[cfg(feature = "adapters")]
pub mod sqlx_adapter;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::KernelError;
use crate::schema::SchemaSnapshot;
use crate::value::Row;

/// Which capability class an adapter belongs to — informational, used by
/// the adaptive performance analyzer's dialect factor and by callers
/// choosing how to report an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    EmbeddedFile,
    EmbeddedAnalytical,
    ServerBased,
}

/// The outcome of executing one statement. Timing excludes validation and
/// post-processing (§3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
    pub rows_returned: usize,
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub dialect: Dialect,
}

impl ExecutionResult {
    pub fn success(columns: Vec<String>, rows: Vec<Row>, execution_time_ms: u64, dialect: Dialect) -> Self {
        let rows_returned = rows.len();
        Self {
            success: true,
            rows,
            columns,
            rows_returned,
            execution_time_ms,
            error: None,
            dialect,
        }
    }

    pub fn failure(error: impl Into<String>, execution_time_ms: u64, dialect: Dialect) -> Self {
        Self {
            success: false,
            rows: Vec::new(),
            columns: Vec::new(),
            rows_returned: 0,
            execution_time_ms,
            error: Some(error.into()),
            dialect,
        }
    }
}

/// Uniform interface over a concrete SQL engine. Not safe for concurrent
/// use from multiple threads — an adapter represents a single connection
/// or session (§5); callers needing concurrency own one adapter per
/// in-flight query.
pub trait EngineAdapter {
    fn kind(&self) -> EngineKind;
    fn dialect(&self) -> Dialect;

    /// Scoped acquisition of a session. Implementations guarantee release
    /// on all exit paths (typically via an RAII `Drop` guard on the
    /// concrete type rather than an explicit `close` call being required).
    fn connect(&mut self) -> Result<(), KernelError>;
    fn close(&mut self) -> Result<(), KernelError>;

    /// Executes a single statement, distinguishing row-returning from
    /// non-row-returning. Always records wall-clock time; on failure,
    /// `success=false` and `error` is the engine's message unwrapped of any
    /// adapter-specific prefix.
    fn execute(&mut self, sql: &str) -> Result<ExecutionResult, KernelError>;

    /// Lists tables in the dialect's default schema, then for each table
    /// lists columns with type/nullability/primary-key/foreign-key info,
    /// and an approximate row count where cheap.
    fn introspect(&mut self) -> Result<SchemaSnapshot, KernelError>;

    /// Re-runs introspection, replacing any cached snapshot atomically.
    fn refresh_schema(&mut self) -> Result<SchemaSnapshot, KernelError> {
        self.introspect()
    }
}

/// Strips a trailing semicolon and surrounding whitespace so callers can
/// uniformly check a single-statement invariant across engines.
pub(crate) fn normalize_single_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim()
}
