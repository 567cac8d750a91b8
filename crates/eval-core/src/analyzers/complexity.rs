//! Query complexity analyzer (§4.H): a pure-lexical + AST-assisted metric
//! counting the structural features a query exercises, reduced to a single
//! `[0,1]` score with diminishing returns via per-metric caps.

use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::parser::ParsedSQL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityReport {
    pub table_count: usize,
    pub join_count: usize,
    pub subquery_count: usize,
    pub cte_count: usize,
    pub has_aggregation: bool,
    pub has_window_function: bool,
    pub has_distinct: bool,
    pub has_set_operation: bool,
    pub case_expression_count: usize,
    pub where_condition_count: usize,
    pub order_by_arity: usize,
    pub group_by_arity: usize,
    pub complexity_score: f64,
    pub level: ComplexityLevel,
}

const AGGREGATE_FUNCTIONS: &[&str] = &[
    "SUM", "AVG", "COUNT", "MIN", "MAX", "GROUP_CONCAT", "STRING_AGG", "ARRAY_AGG",
];

struct Patterns {
    join: Regex,
    window: Regex,
    distinct: Regex,
    set_op: Regex,
    case_expr: Regex,
    where_clause: Regex,
    and_or: Regex,
    order_by: Regex,
    group_by: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        join: Regex::new(r"(?i)\bjoin\b").expect("valid regex"),
        window: Regex::new(r"(?i)\bover\s*\(").expect("valid regex"),
        distinct: Regex::new(r"(?i)\bdistinct\b").expect("valid regex"),
        set_op: Regex::new(r"(?i)\b(union|intersect|except)\b").expect("valid regex"),
        case_expr: Regex::new(r"(?i)\bcase\b").expect("valid regex"),
        where_clause: Regex::new(r"(?is)\bwhere\b(.*?)(\bgroup\s+by\b|\border\s+by\b|\blimit\b|$)")
            .expect("valid regex"),
        and_or: Regex::new(r"(?i)\b(and|or)\b").expect("valid regex"),
        order_by: Regex::new(r"(?is)\border\s+by\b(.*?)(\blimit\b|$)").expect("valid regex"),
        group_by: Regex::new(r"(?is)\bgroup\s+by\b(.*?)(\bhaving\b|\border\s+by\b|\blimit\b|$)")
            .expect("valid regex"),
    })
}

fn count_comma_separated(text: &str) -> usize {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        0
    } else {
        trimmed.split(',').count()
    }
}

/// Runs the complexity analyzer over an already-parsed query. Falls back to
/// whatever `parsed.raw` contains even when `is_valid` is false — a
/// complexity estimate for a query that failed to parse is still useful
/// signal, unlike hallucination detection which requires a real AST.
pub fn analyze(parsed: &ParsedSQL) -> ComplexityReport {
    let p = patterns();
    let sql = &parsed.raw;

    let table_count = parsed.identifiers.tables.len();
    let join_count = p.join.find_iter(sql).count();
    let subquery_count = parsed
        .identifiers
        .aliases
        .values()
        .filter(|a| matches!(a, crate::identifiers::Alias::Subquery))
        .count();
    let cte_count = parsed
        .identifiers
        .aliases
        .values()
        .filter(|a| matches!(a, crate::identifiers::Alias::Cte))
        .count();
    let has_aggregation = parsed
        .identifiers
        .functions
        .iter()
        .any(|f| AGGREGATE_FUNCTIONS.contains(&f.as_str()));
    let has_window_function = p.window.is_match(sql);
    let has_distinct = p.distinct.is_match(sql);
    let has_set_operation = p.set_op.is_match(sql);
    let case_expression_count = p.case_expr.find_iter(sql).count();

    let where_condition_count = p
        .where_clause
        .captures(sql)
        .map(|c| p.and_or.find_iter(&c[1]).count() + 1)
        .unwrap_or(0);
    let order_by_arity = p
        .order_by
        .captures(sql)
        .map(|c| count_comma_separated(&c[1]))
        .unwrap_or(0);
    let group_by_arity = p
        .group_by
        .captures(sql)
        .map(|c| count_comma_separated(&c[1]))
        .unwrap_or(0);

    let complexity_score = score(
        table_count,
        join_count,
        where_condition_count,
        cte_count,
        subquery_count,
        order_by_arity,
        group_by_arity,
        has_aggregation,
        has_window_function,
        has_distinct,
        has_set_operation,
        case_expression_count,
    );

    ComplexityReport {
        table_count,
        join_count,
        subquery_count,
        cte_count,
        has_aggregation,
        has_window_function,
        has_distinct,
        has_set_operation,
        case_expression_count,
        where_condition_count,
        order_by_arity,
        group_by_arity,
        complexity_score,
        level: level_for(complexity_score),
    }
}

#[allow(clippy::too_many_arguments)]
fn score(
    tables: usize,
    joins: usize,
    conditions: usize,
    ctes: usize,
    subqueries: usize,
    order_by: usize,
    group_by: usize,
    aggregation: bool,
    window: bool,
    distinct: bool,
    set_op: bool,
    case_exprs: usize,
) -> f64 {
    let capped = |count: usize, cap: usize| (count.min(cap) as f64) / (cap as f64);

    0.12 * capped(tables, 5)
        + 0.15 * capped(joins, 5)
        + 0.15 * capped(conditions, 5)
        + 0.08 * capped(ctes, 3)
        + 0.08 * capped(subqueries, 3)
        + 0.05 * capped(order_by, 3)
        + 0.05 * capped(group_by, 3)
        + 0.08 * (aggregation as u8 as f64)
        + 0.10 * (window as u8 as f64)
        + 0.04 * (distinct as u8 as f64)
        + 0.05 * (set_op as u8 as f64)
        + 0.05 * capped(case_exprs, 3)
}

fn level_for(score: f64) -> ComplexityLevel {
    if score < 0.2 {
        ComplexityLevel::Simple
    } else if score < 0.4 {
        ComplexityLevel::Moderate
    } else if score < 0.7 {
        ComplexityLevel::Complex
    } else {
        ComplexityLevel::VeryComplex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn trivial_select_is_simple() {
        let parsed = crate::parser::parse("SELECT id FROM orders", Dialect::Sqlite);
        let report = analyze(&parsed);
        assert_eq!(report.level, ComplexityLevel::Simple);
        assert_eq!(report.join_count, 0);
    }

    #[test]
    fn joins_and_aggregation_raise_complexity() {
        let sql = "SELECT o.id, SUM(p.amount) FROM orders o \
                   JOIN payments p ON p.order_id = o.id \
                   WHERE o.status = 'open' AND o.total > 10 \
                   GROUP BY o.id ORDER BY o.id";
        let parsed = crate::parser::parse(sql, Dialect::Sqlite);
        let report = analyze(&parsed);
        assert_eq!(report.join_count, 1);
        assert!(report.has_aggregation);
        assert_eq!(report.where_condition_count, 2);
        assert_eq!(report.group_by_arity, 1);
        assert!(report.complexity_score > 0.2);
    }

    #[test]
    fn complexity_score_is_bounded() {
        let sql = "SELECT DISTINCT a.x, CASE WHEN a.y > 1 THEN 1 ELSE 0 END \
                   FROM a JOIN b ON a.id=b.id JOIN c ON b.id=c.id JOIN d ON c.id=d.id \
                   JOIN e ON d.id=e.id JOIN f ON e.id=f.id \
                   WHERE a.x > 1 AND a.y > 2 AND a.z > 3 AND a.w > 4 AND a.v > 5 AND a.u > 6 \
                   GROUP BY a.x, a.y, a.z ORDER BY a.x, a.y, a.z \
                   UNION SELECT b.x, 1 FROM b";
        let parsed = crate::parser::parse(sql, Dialect::Sqlite);
        let report = analyze(&parsed);
        assert!(report.complexity_score <= 1.0);
        assert_eq!(report.level, ComplexityLevel::VeryComplex);
    }
}
