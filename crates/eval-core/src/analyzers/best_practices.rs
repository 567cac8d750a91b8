//! Best-practices lint (§4.H): a small set of pattern-and-rule checks,
//! scored additively with a clamp to `[0,1]` (§9 open question — this
//! specification adopts additive-with-clamp over multiplicative stacking).

use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::identifiers::Alias;
use crate::parser::ParsedSQL;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct BestPracticesReport {
    pub score: f64,
    pub violations: Vec<String>,
    pub suggestions: Vec<String>,
}

const AGGREGATE_FUNCTIONS: &[&str] = &[
    "SUM", "AVG", "COUNT", "MIN", "MAX", "GROUP_CONCAT", "STRING_AGG", "ARRAY_AGG",
];

struct Patterns {
    select_star: Regex,
    where_clause: Regex,
    limit_one: Regex,
    comma_join: Regex,
    distinct: Regex,
    group_by: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        select_star: Regex::new(r"(?i)select\s+\*").expect("valid regex"),
        where_clause: Regex::new(r"(?i)\bwhere\b").expect("valid regex"),
        limit_one: Regex::new(r"(?i)\blimit\s+1\b").expect("valid regex"),
        comma_join: Regex::new(r"(?i)\bfrom\s+[\w.\[\]`\x22]+\s*,\s*[\w.\[\]`\x22]+").expect("valid regex"),
        distinct: Regex::new(r"(?i)\bdistinct\b").expect("valid regex"),
        group_by: Regex::new(r"(?i)\bgroup\s+by\b").expect("valid regex"),
    })
}

/// Runs the lint over an already-parsed query (§4.H "Best-practices lint").
pub fn analyze(parsed: &ParsedSQL) -> BestPracticesReport {
    let p = patterns();
    let sql = &parsed.raw;
    let mut score = 1.0f64;
    let mut violations = Vec::new();
    let mut suggestions = Vec::new();

    if p.select_star.is_match(sql) {
        score -= 0.1;
        violations.push("SELECT *".to_string());
        suggestions.push("list only the columns you need instead of SELECT *".to_string());
    }

    if should_flag_missing_where(parsed, p) {
        score -= 0.05;
        violations.push("missing WHERE clause on a scanning SELECT".to_string());
        suggestions.push("add a WHERE clause to avoid scanning the entire table".to_string());
    }

    if p.comma_join.is_match(sql) {
        score -= 0.15;
        violations.push("implicit comma join".to_string());
        suggestions.push("use an explicit JOIN ... ON instead of a comma join".to_string());
    }

    if p.distinct.is_match(sql) && p.group_by.is_match(sql) {
        score -= 0.05;
        violations.push("DISTINCT combined with GROUP BY".to_string());
        suggestions.push("DISTINCT is redundant once GROUP BY already deduplicates by key".to_string());
    }

    if multi_joined_tables_missing_aliases(parsed) {
        suggestions.push("add table aliases to disambiguate columns across joined tables".to_string());
    }

    BestPracticesReport {
        score: score.clamp(0.0, 1.0),
        violations,
        suggestions,
    }
}

fn should_flag_missing_where(parsed: &ParsedSQL, p: &Patterns) -> bool {
    let sql = &parsed.raw;
    if p.where_clause.is_match(sql) || p.limit_one.is_match(sql) {
        return false;
    }
    if parsed.identifiers.tables.is_empty() {
        // A constant select (`SELECT 1`) has no table to scan.
        return false;
    }
    let aggregate_only = parsed
        .identifiers
        .functions
        .iter()
        .any(|f| AGGREGATE_FUNCTIONS.contains(&f.as_str()))
        && !p.group_by.is_match(sql);
    !aggregate_only
}

fn multi_joined_tables_missing_aliases(parsed: &ParsedSQL) -> bool {
    if parsed.identifiers.tables.len() < 2 {
        return false;
    }
    let any_table_aliased = parsed
        .identifiers
        .aliases
        .values()
        .any(|a| matches!(a, Alias::Real(_)));
    !any_table_aliased
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn s6_select_star_and_comma_join() {
        let sql = "SELECT * FROM users, orders WHERE users.id = orders.user_id";
        let parsed = crate::parser::parse(sql, Dialect::Sqlite);
        let report = analyze(&parsed);
        assert!(report.score < 0.8);
        assert!(report.violations.iter().any(|v| v.contains("SELECT *")));
        assert!(report.violations.iter().any(|v| v.contains("comma join")));
    }

    #[test]
    fn clean_query_scores_perfectly() {
        let sql = "SELECT customer, SUM(total) AS total_spent FROM orders GROUP BY customer";
        let parsed = crate::parser::parse(sql, Dialect::Sqlite);
        let report = analyze(&parsed);
        assert_eq!(report.score, 1.0);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn limit_one_select_is_exempt_from_missing_where() {
        let sql = "SELECT * FROM orders LIMIT 1";
        let parsed = crate::parser::parse(sql, Dialect::Sqlite);
        let report = analyze(&parsed);
        assert!(!report.violations.iter().any(|v| v.contains("WHERE")));
    }

    #[test]
    fn aggregate_only_select_is_exempt_from_missing_where() {
        let sql = "SELECT COUNT(*) FROM orders";
        let parsed = crate::parser::parse(sql, Dialect::Sqlite);
        let report = analyze(&parsed);
        assert!(!report.violations.iter().any(|v| v.contains("WHERE")));
    }

    #[test]
    fn replacing_select_star_cannot_decrease_score() {
        let before = crate::parser::parse("SELECT * FROM orders WHERE id = 1", Dialect::Sqlite);
        let after = crate::parser::parse("SELECT id, total FROM orders WHERE id = 1", Dialect::Sqlite);
        let before_score = analyze(&before).score;
        let after_score = analyze(&after).score;
        assert!(after_score >= before_score);
    }
}
