//! Plan analyzer (§4.H): pattern-matches engine-supplied `EXPLAIN` text for
//! scan strategy and cost/row estimates, without parsing any engine's plan
//! format structurally.

use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanStrategy {
    FullTableScan,
    IndexScan,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub strategy: ScanStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_estimate: Option<u64>,
    pub plan_score: f64,
    pub suggestions: Vec<String>,
}

struct Patterns {
    full_scan: Regex,
    index_scan: Regex,
    cost: Regex,
    rows: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        full_scan: Regex::new(r"(?i)\bseq\s*scan\b|\btable\s*scan\b").expect("valid regex"),
        index_scan: Regex::new(r"(?i)\bindex\s*scan\b|\bindex\s*seek\b").expect("valid regex"),
        cost: Regex::new(r"(?i)cost=[\d.]+\.\.(\d+(?:\.\d+)?)|cost[:=]\s*(\d+(?:\.\d+)?)")
            .expect("valid regex"),
        rows: Regex::new(r"(?i)rows=(\d+)|rows[:=]\s*(\d+)").expect("valid regex"),
    })
}

/// Analyzes raw `EXPLAIN` output (§4.H "Plan analyzer"). Returns `None` when
/// no plan text is supplied — the caller (scorer) treats absence as a
/// perfect plan_quality of 1.0 rather than calling this at all.
pub fn analyze(plan_text: &str) -> PlanReport {
    let p = patterns();
    let has_full_scan = p.full_scan.is_match(plan_text);
    let has_index_scan = p.index_scan.is_match(plan_text);

    let strategy = if has_full_scan {
        ScanStrategy::FullTableScan
    } else if has_index_scan {
        ScanStrategy::IndexScan
    } else {
        ScanStrategy::Unknown
    };

    let cost_estimate = p
        .cost
        .captures(plan_text)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .and_then(|m| m.as_str().parse().ok());
    let row_estimate = p
        .rows
        .captures(plan_text)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .and_then(|m| m.as_str().parse().ok());

    let mut score = 1.0;
    let mut suggestions = Vec::new();

    if has_full_scan && !has_index_scan {
        score -= 0.3;
        suggestions.push("consider adding an index to avoid a full table scan".to_string());
    }
    if has_index_scan {
        score += 0.1;
    }
    if let Some(cost) = cost_estimate {
        if cost > 10_000.0 {
            score -= 0.2;
            suggestions.push(format!("estimated cost {cost:.0} is high; review join order and filters"));
        }
    }
    if let Some(rows) = row_estimate {
        if rows > 100_000 {
            score -= 0.15;
            suggestions.push(format!(
                "estimated row count {rows} is large; consider narrowing filters or adding a LIMIT"
            ));
        }
    }

    PlanReport {
        strategy,
        cost_estimate,
        row_estimate,
        plan_score: score.clamp(0.0, 1.0),
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_style_seq_scan_is_penalized() {
        let plan = "Seq Scan on orders (cost=0.00..12345.67 rows=150000 width=32)";
        let report = analyze(plan);
        assert_eq!(report.strategy, ScanStrategy::FullTableScan);
        assert_eq!(report.cost_estimate, Some(12345.67));
        assert_eq!(report.row_estimate, Some(150_000));
        assert!(report.plan_score < 1.0);
        assert!(!report.suggestions.is_empty());
    }

    #[test]
    fn index_scan_is_rewarded() {
        let plan = "Index Scan using orders_pkey on orders (cost=0.29..8.30 rows=1 width=32)";
        let report = analyze(plan);
        assert_eq!(report.strategy, ScanStrategy::IndexScan);
        assert!(report.plan_score >= 1.0);
    }

    #[test]
    fn sqlserver_style_index_seek_is_recognized() {
        let plan = "INDEX SEEK [orders].[orders_pkey] Cost: 0.01 Rows: 1";
        let report = analyze(plan);
        assert_eq!(report.strategy, ScanStrategy::IndexScan);
    }

    #[test]
    fn unknown_plan_text_is_neutral() {
        let report = analyze("some opaque engine plan blob");
        assert_eq!(report.strategy, ScanStrategy::Unknown);
        assert_eq!(report.plan_score, 1.0);
    }

    #[test]
    fn score_is_always_clamped() {
        let plan = "TABLE SCAN cost=50000 rows=999999999";
        let report = analyze(plan);
        assert!((0.0..=1.0).contains(&report.plan_score));
    }
}
