//! Adaptive performance analyzer (§4.H): execution-time thresholds scaled by
//! dialect and query complexity, collapsed into an efficiency score.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analyzers::complexity::ComplexityLevel;
use crate::dialect::Dialect;

const BASE_EXCELLENT_MS: f64 = 10.0;
const BASE_GOOD_MS: f64 = 100.0;
const BASE_ACCEPTABLE_MS: f64 = 1000.0;

fn dialect_factor(dialect: Dialect) -> f64 {
    match dialect {
        Dialect::Sqlite => 0.5,
        Dialect::Duckdb => 1.0,
        Dialect::Postgresql => 1.5,
        Dialect::Mysql => 1.5,
        Dialect::Bigquery => 10.0,
        Dialect::Snowflake => 10.0,
    }
}

fn complexity_factor(level: ComplexityLevel) -> f64 {
    match level {
        ComplexityLevel::Simple => 1.0,
        ComplexityLevel::Moderate => 2.0,
        ComplexityLevel::Complex => 4.0,
        ComplexityLevel::VeryComplex => 8.0,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceThresholds {
    pub excellent_ms: f64,
    pub good_ms: f64,
    pub acceptable_ms: f64,
}

/// Computes the three adaptive thresholds for a dialect/complexity
/// combination, widened logarithmically when `row_estimate` exceeds 1000
/// rows (§4.H).
pub fn adaptive_thresholds(
    dialect: Dialect,
    complexity: ComplexityLevel,
    row_estimate: Option<u64>,
) -> PerformanceThresholds {
    let factor = dialect_factor(dialect) * complexity_factor(complexity);
    let row_factor = match row_estimate {
        Some(rows) if rows > 1000 => 1.0 + (rows as f64 / 1000.0).log10(),
        _ => 1.0,
    };
    let scale = factor * row_factor;
    PerformanceThresholds {
        excellent_ms: BASE_EXCELLENT_MS * scale,
        good_ms: BASE_GOOD_MS * scale,
        acceptable_ms: BASE_ACCEPTABLE_MS * scale,
    }
}

/// Maps a wall-clock execution time to a `[0,1]` efficiency score: 1.0 at or
/// below `excellent`, linearly interpolating to 0.8 at `good` and 0.5 at
/// `acceptable`, then decaying hyperbolically past `acceptable` so the score
/// never climbs back up as time increases (§8 invariant 8).
pub fn score_execution_time(execution_time_ms: u64, thresholds: &PerformanceThresholds) -> f64 {
    let t = execution_time_ms as f64;
    if t <= thresholds.excellent_ms {
        return 1.0;
    }
    if t <= thresholds.good_ms {
        return interpolate(t, thresholds.excellent_ms, thresholds.good_ms, 1.0, 0.8);
    }
    if t <= thresholds.acceptable_ms {
        return interpolate(t, thresholds.good_ms, thresholds.acceptable_ms, 0.8, 0.5);
    }
    (0.5 * thresholds.acceptable_ms / t).clamp(0.0, 0.5)
}

fn interpolate(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if (x1 - x0).abs() < f64::EPSILON {
        return y1;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_query_on_sqlite_scores_perfectly() {
        let thresholds = adaptive_thresholds(Dialect::Sqlite, ComplexityLevel::Simple, None);
        assert_eq!(score_execution_time(2, &thresholds), 1.0);
    }

    #[test]
    fn bigquery_tolerates_much_higher_latency_than_sqlite() {
        let sqlite = adaptive_thresholds(Dialect::Sqlite, ComplexityLevel::Simple, None);
        let bigquery = adaptive_thresholds(Dialect::Bigquery, ComplexityLevel::Simple, None);
        assert!(bigquery.acceptable_ms > sqlite.acceptable_ms);
    }

    #[test]
    fn increasing_time_never_increases_score() {
        let thresholds = adaptive_thresholds(Dialect::Postgresql, ComplexityLevel::Moderate, None);
        let mut previous = 1.1;
        for ms in [1u64, 10, 50, 100, 500, 1000, 5000, 50000] {
            let score = score_execution_time(ms, &thresholds);
            assert!(score <= previous + 1e-9, "score increased at {ms}ms");
            previous = score;
        }
    }

    #[test]
    fn row_estimate_widens_thresholds() {
        let small = adaptive_thresholds(Dialect::Duckdb, ComplexityLevel::Simple, Some(500));
        let large = adaptive_thresholds(Dialect::Duckdb, ComplexityLevel::Simple, Some(1_000_000));
        assert!(large.acceptable_ms > small.acceptable_ms);
    }

    #[test]
    fn score_is_always_in_unit_interval() {
        let thresholds = adaptive_thresholds(Dialect::Snowflake, ComplexityLevel::VeryComplex, Some(2_000_000));
        for ms in [0u64, 1, 100, 100_000, 10_000_000] {
            let score = score_execution_time(ms, &thresholds);
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
