//! Result Comparator (component G): matches an actual row set against an
//! expected one, choosing among four strategies by shape.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::{row_sort_key, Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    SetBased,
    Fuzzy,
    SchemaOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub strategy: MatchStrategy,
    pub matched: bool,
    pub match_score: f64,
    pub details: String,
}

fn columns_of(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default()
}

/// Compares `actual` against `expected` (§4.G). `expected = None` degrades to
/// `schema_only` — the comparator never errors on a missing expectation
/// (§7).
pub fn compare(actual: &[Row], expected: Option<&[Row]>) -> ComparisonResult {
    let expected = match expected {
        Some(rows) => rows,
        None => {
            return ComparisonResult {
                strategy: MatchStrategy::SchemaOnly,
                matched: true,
                match_score: 1.0,
                details: "no expected result".to_string(),
            }
        }
    };

    if actual.is_empty() && expected.is_empty() {
        return ComparisonResult {
            strategy: MatchStrategy::Exact,
            matched: true,
            match_score: 1.0,
            details: "both result sets are empty".to_string(),
        };
    }
    if actual.is_empty() != expected.is_empty() {
        return ComparisonResult {
            strategy: exact_or_set(actual, expected),
            matched: false,
            match_score: 0.0,
            details: "one result set is empty, the other is not".to_string(),
        };
    }

    let actual_cols = columns_of(actual);
    let expected_cols = columns_of(expected);
    let actual_set: HashSet<&str> = actual_cols.iter().map(String::as_str).collect();
    let expected_set: HashSet<&str> = expected_cols.iter().map(String::as_str).collect();

    if actual_cols == expected_cols {
        return compare_exact_or_set(actual, expected, &actual_cols);
    }

    if actual_set == expected_set {
        return compare_set_based(actual, expected);
    }

    if actual_cols.len() == expected_cols.len() {
        return compare_fuzzy(actual, expected, &actual_cols, &expected_cols);
    }

    ComparisonResult {
        strategy: MatchStrategy::Fuzzy,
        matched: false,
        match_score: 0.0,
        details: format!(
            "column count mismatch: actual has {}, expected has {}",
            actual_cols.len(),
            expected_cols.len()
        ),
    }
}

fn exact_or_set(actual: &[Row], expected: &[Row]) -> MatchStrategy {
    if columns_of(actual) == columns_of(expected) {
        MatchStrategy::Exact
    } else {
        MatchStrategy::SetBased
    }
}

/// Row order and column order both match: compare position-by-position;
/// otherwise fall through to multiset comparison under the same column set.
fn compare_exact_or_set(actual: &[Row], expected: &[Row], columns: &[String]) -> ComparisonResult {
    if actual.len() == expected.len() {
        let total_cells = columns.len() * actual.len();
        if total_cells == 0 {
            return ComparisonResult {
                strategy: MatchStrategy::Exact,
                matched: true,
                match_score: 1.0,
                details: "no cells to compare".to_string(),
            };
        }
        let matching_cells: usize = actual
            .iter()
            .zip(expected.iter())
            .map(|(a, e)| {
                columns
                    .iter()
                    .filter(|c| cell_eq(a.get(*c), e.get(*c)))
                    .count()
            })
            .sum();
        let match_score = matching_cells as f64 / total_cells as f64;
        if match_score >= 1.0 - 1e-9 {
            return ComparisonResult {
                strategy: MatchStrategy::Exact,
                matched: true,
                match_score: 1.0,
                details: "exact match, row order and column order identical".to_string(),
            };
        }
        // Row-for-row mismatch at identical shape: try multiset equality
        // before giving up, since result ordering is often non-deterministic.
        let set_result = compare_set_based(actual, expected);
        if set_result.matched {
            return set_result;
        }
        return ComparisonResult {
            strategy: MatchStrategy::Exact,
            matched: false,
            match_score,
            details: format!("{matching_cells}/{total_cells} cells matched by position"),
        };
    }
    compare_set_based(actual, expected)
}

fn cell_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.compare_eq(b),
        (None, None) => true,
        _ => false,
    }
}

/// Multiset comparison of row-maps, ignoring order (§4.G `set_based`).
fn compare_set_based(actual: &[Row], expected: &[Row]) -> ComparisonResult {
    let mut actual_keys: Vec<Vec<String>> = actual.iter().map(row_sort_key).collect();
    let mut expected_keys: Vec<Vec<String>> = expected.iter().map(row_sort_key).collect();
    actual_keys.sort();
    expected_keys.sort();

    let mut expected_remaining = expected_keys.clone();
    let mut intersection = 0usize;
    for key in &actual_keys {
        if let Some(pos) = expected_remaining.iter().position(|k| k == key) {
            expected_remaining.remove(pos);
            intersection += 1;
        }
    }
    let union = actual_keys.len() + expected_keys.len() - intersection;
    let match_score = if union == 0 { 1.0 } else { intersection as f64 / union as f64 };
    ComparisonResult {
        strategy: MatchStrategy::SetBased,
        matched: match_score >= 1.0 - 1e-9,
        match_score,
        details: format!("{intersection} rows matched as a multiset of {union} distinct rows"),
    }
}

/// Greedy alignment of columns by value-distribution similarity when the
/// column names differ but the arities match (§4.G `fuzzy`, §9 open
/// question — we pick greedy alignment with a capped penalty).
fn compare_fuzzy(
    actual: &[Row],
    expected: &[Row],
    actual_cols: &[String],
    expected_cols: &[String],
) -> ComparisonResult {
    let mut remaining_expected: Vec<&String> = expected_cols.iter().collect();
    let mut alignment: Vec<(String, String)> = Vec::new();
    for a_col in actual_cols {
        let a_values = column_values(actual, a_col);
        let best = remaining_expected
            .iter()
            .enumerate()
            .map(|(idx, e_col)| {
                let e_values = column_values(expected, e_col);
                (idx, distribution_similarity(&a_values, &e_values))
            })
            .max_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some((idx, _)) = best {
            let e_col = remaining_expected.remove(idx).clone();
            alignment.push((a_col.clone(), e_col));
        }
    }

    let mut renamed_actual = Vec::with_capacity(actual.len());
    for row in actual {
        let mut renamed = Row::new();
        for (a_col, e_col) in &alignment {
            if let Some(v) = row.get(a_col) {
                renamed.insert(e_col.clone(), v.clone());
            }
        }
        renamed_actual.push(renamed);
    }

    let set_result = compare_set_based(&renamed_actual, expected);
    let misalignment_penalty = 0.3 * (1.0 - (alignment.len() as f64 / actual_cols.len().max(1) as f64));
    let match_score = (set_result.match_score - misalignment_penalty).max(0.0);
    ComparisonResult {
        strategy: MatchStrategy::Fuzzy,
        matched: match_score >= 1.0 - 1e-9,
        match_score,
        details: format!(
            "greedy column alignment ({} of {} columns aligned), then {}",
            alignment.len(),
            actual_cols.len(),
            set_result.details
        ),
    }
}

fn column_values(rows: &[Row], column: &str) -> Vec<Value> {
    rows.iter().filter_map(|r| r.get(column).cloned()).collect()
}

/// Similarity of two value distributions in [0,1]: numeric columns compare
/// mean and range closeness; everything else falls back to Jaccard over
/// case-folded sort keys.
fn distribution_similarity(a: &[Value], b: &[Value]) -> f64 {
    let a_nums: Vec<f64> = a.iter().filter_map(Value::as_f64).collect();
    let b_nums: Vec<f64> = b.iter().filter_map(Value::as_f64).collect();
    if !a_nums.is_empty() && !b_nums.is_empty() && a_nums.len() == a.len() && b_nums.len() == b.len() {
        let mean_a = mean(&a_nums);
        let mean_b = mean(&b_nums);
        let mean_similarity = 1.0 - ((mean_a - mean_b).abs() / (mean_a.abs().max(mean_b.abs()).max(1.0)));
        let range_a = range(&a_nums);
        let range_b = range(&b_nums);
        let range_similarity = 1.0 - ((range_a - range_b).abs() / (range_a.max(range_b).max(1.0)));
        return (mean_similarity.clamp(0.0, 1.0) + range_similarity.clamp(0.0, 1.0)) / 2.0;
    }

    let a_set: HashSet<String> = a.iter().map(Value::sort_key).collect();
    let b_set: HashSet<String> = b.iter().map(Value::sort_key).collect();
    if a_set.is_empty() && b_set.is_empty() {
        return 1.0;
    }
    let intersection = a_set.intersection(&b_set).count();
    let union = a_set.union(&b_set).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn range(values: &[f64]) -> f64 {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    max - min
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn no_expected_is_schema_only() {
        let actual = vec![row(&[("a", Value::Integer(1))])];
        let result = compare(&actual, None);
        assert_eq!(result.strategy, MatchStrategy::SchemaOnly);
        assert!(result.matched);
        assert_eq!(result.match_score, 1.0);
    }

    #[test]
    fn both_empty_matches() {
        let result = compare(&[], Some(&[]));
        assert!(result.matched);
        assert_eq!(result.match_score, 1.0);
    }

    #[test]
    fn one_empty_one_not_fails() {
        let actual = vec![row(&[("a", Value::Integer(1))])];
        let result = compare(&actual, Some(&[]));
        assert!(!result.matched);
        assert_eq!(result.match_score, 0.0);
    }

    #[test]
    fn exact_match_same_order() {
        let actual = vec![
            row(&[("customer", Value::Text("A".into())), ("total", Value::Float(225.0))]),
            row(&[("customer", Value::Text("B".into())), ("total", Value::Float(200.0))]),
        ];
        let expected = actual.clone();
        let result = compare(&actual, Some(&expected));
        assert_eq!(result.strategy, MatchStrategy::Exact);
        assert!(result.matched);
        assert_eq!(result.match_score, 1.0);
    }

    #[test]
    fn set_based_match_different_order() {
        let a = row(&[("customer", Value::Text("A".into())), ("total", Value::Float(225.0))]);
        let b = row(&[("customer", Value::Text("B".into())), ("total", Value::Float(200.0))]);
        let actual = vec![b.clone(), a.clone()];
        let expected = vec![a, b];
        let result = compare(&actual, Some(&expected));
        assert!(result.matched);
        assert!(matches!(result.strategy, MatchStrategy::Exact | MatchStrategy::SetBased));
    }

    #[test]
    fn fuzzy_aligns_differently_named_columns() {
        let actual = vec![row(&[("cust", Value::Text("A".into())), ("amt", Value::Float(225.0))])];
        let expected = vec![row(&[
            ("customer", Value::Text("A".into())),
            ("total", Value::Float(225.0)),
        ])];
        let result = compare(&actual, Some(&expected));
        assert_eq!(result.strategy, MatchStrategy::Fuzzy);
        assert!(result.match_score > 0.0);
    }

    #[test]
    fn numeric_tolerance_is_respected() {
        let actual = vec![row(&[("total", Value::Float(200.0000001))])];
        let expected = vec![row(&[("total", Value::Float(200.0))])];
        let result = compare(&actual, Some(&expected));
        assert!(result.matched);
    }
}
