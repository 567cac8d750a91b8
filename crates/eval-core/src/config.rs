//! Kernel-wide configuration defaults.
//!
//! The kernel never loads configuration from the environment or a file
//! itself — that is the embedding binary's job (see the "configuration is
//! external" non-goal). `KernelConfig` exists so `EvalOptions` has a single
//! source of truth to fall back to when a caller leaves a field at its
//! default, mirroring the original system's `agentx.core.config.Settings`.

/// Defaults shared by the executor, adapters, and the performance analyzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelConfig {
    /// Bounds a single `execute` call. See `KernelError::ExecutionTimeout`.
    pub query_timeout_ms: u64,
    /// Row-limit envelope the executor appends to unbounded SELECTs.
    pub max_sample_rows: usize,
    /// Bounds `introspect`, separate from the query timeout.
    pub introspection_timeout_ms: u64,
    /// Execution time past which the executor emits a "slow execution" insight.
    pub slow_execution_threshold_ms: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 30_000,
            max_sample_rows: 100,
            introspection_timeout_ms: 10_000,
            slow_execution_threshold_ms: 1_000,
        }
    }
}
