//! Semantic accuracy analyzer (§4.H): how closely the *values* of actual and
//! expected results agree, independent of the comparator's row-shape
//! strategy selection — used as the scorer's `semantic_accuracy` dimension
//! whenever a task supplies `expected_rows`.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::{Row, Value};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SemanticReport {
    pub value_accuracy: f64,
    pub distribution_similarity: f64,
    pub null_handling_consistency: f64,
    pub type_consistency: f64,
    pub semantic_score: f64,
}

fn common_columns(actual: &[Row], expected: &[Row]) -> Vec<String> {
    let actual_cols: HashSet<&str> = actual.first().map(|r| r.keys().map(String::as_str).collect()).unwrap_or_default();
    let expected_cols: HashSet<&str> = expected.first().map(|r| r.keys().map(String::as_str).collect()).unwrap_or_default();
    actual_cols.intersection(&expected_cols).map(|s| s.to_string()).collect()
}

fn column_values<'a>(rows: &'a [Row], column: &str) -> Vec<&'a Value> {
    rows.iter().filter_map(|r| r.get(column)).collect()
}

fn is_numeric_column(values: &[&Value]) -> bool {
    !values.is_empty() && values.iter().all(|v| v.is_null() || v.as_f64().is_some())
}

fn non_null_numbers(values: &[&Value]) -> Vec<f64> {
    values.iter().filter_map(|v| v.as_f64()).collect()
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn range(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        let min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        max - min
    }
}

fn quartiles(xs: &[f64]) -> [f64; 5] {
    if xs.is_empty() {
        return [0.0; 5];
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let at = |p: f64| -> f64 {
        let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    };
    [at(0.0), at(0.25), at(0.5), at(0.75), at(1.0)]
}

fn closeness(a: f64, b: f64) -> f64 {
    (1.0 - (a - b).abs() / a.abs().max(b.abs()).max(1.0)).clamp(0.0, 1.0)
}

fn categorical_jaccard(a: &[&Value], b: &[&Value]) -> f64 {
    let a_set: HashSet<String> = a.iter().filter_map(|v| v.as_text_lower().or_else(|| Some(v.sort_key()))).collect();
    let b_set: HashSet<String> = b.iter().filter_map(|v| v.as_text_lower().or_else(|| Some(v.sort_key()))).collect();
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

fn column_value_accuracy(a: &[&Value], b: &[&Value]) -> f64 {
    if is_numeric_column(a) && is_numeric_column(b) {
        let an = non_null_numbers(a);
        let bn = non_null_numbers(b);
        let mean_agreement = closeness(mean(&an), mean(&bn));
        let range_agreement = closeness(range(&an), range(&bn));
        0.7 * mean_agreement + 0.3 * range_agreement
    } else {
        categorical_jaccard(a, b)
    }
}

fn column_distribution_similarity(a: &[&Value], b: &[&Value]) -> f64 {
    if is_numeric_column(a) && is_numeric_column(b) {
        let aq = quartiles(&non_null_numbers(a));
        let bq = quartiles(&non_null_numbers(b));
        aq.iter().zip(bq.iter()).map(|(x, y)| closeness(*x, *y)).sum::<f64>() / aq.len() as f64
    } else {
        categorical_jaccard(a, b)
    }
}

fn null_rate(values: &[&Value]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().filter(|v| v.is_null()).count() as f64 / values.len() as f64
    }
}

fn dominant_kind(values: &[&Value]) -> Option<&'static str> {
    use std::collections::HashMap;
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for v in values {
        let kind = match v {
            Value::Null => continue,
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
        };
        *counts.entry(kind).or_insert(0) += 1;
    }
    counts.into_iter().max_by_key(|(_, c)| *c).map(|(k, _)| k)
}

/// Compares actual and expected result sets over their common columns
/// (§4.H "Semantic accuracy"). Returns a neutral report (all scores 1.0)
/// when there are no common columns to compare, rather than dividing by
/// zero.
pub fn analyze(actual: &[Row], expected: &[Row]) -> SemanticReport {
    let columns = common_columns(actual, expected);
    if columns.is_empty() {
        return SemanticReport {
            value_accuracy: 1.0,
            distribution_similarity: 1.0,
            null_handling_consistency: 1.0,
            type_consistency: 1.0,
            semantic_score: 1.0,
        };
    }

    let mut value_accuracy_sum = 0.0;
    let mut distribution_sum = 0.0;
    let mut null_consistency_sum = 0.0;
    let mut type_consistency_sum = 0.0;

    for column in &columns {
        let a_values = column_values(actual, column);
        let b_values = column_values(expected, column);

        value_accuracy_sum += column_value_accuracy(&a_values, &b_values);
        distribution_sum += column_distribution_similarity(&a_values, &b_values);
        null_consistency_sum += 1.0 - (null_rate(&a_values) - null_rate(&b_values)).abs();

        let same_type = match (dominant_kind(&a_values), dominant_kind(&b_values)) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        type_consistency_sum += if same_type { 1.0 } else { 0.0 };
    }

    let n = columns.len() as f64;
    let value_accuracy = value_accuracy_sum / n;
    let distribution_similarity = distribution_sum / n;
    let null_handling_consistency = null_consistency_sum / n;
    let type_consistency = type_consistency_sum / n;

    let semantic_score = 0.50 * value_accuracy
        + 0.20 * distribution_similarity
        + 0.15 * null_handling_consistency
        + 0.15 * type_consistency;

    SemanticReport {
        value_accuracy,
        distribution_similarity,
        null_handling_consistency,
        type_consistency,
        semantic_score: semantic_score.clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn identical_rows_score_perfectly() {
        let rows = vec![
            row(&[("total", Value::Float(100.0))]),
            row(&[("total", Value::Float(200.0))]),
        ];
        let report = analyze(&rows, &rows);
        assert!(report.semantic_score >= 0.999);
    }

    #[test]
    fn no_common_columns_is_neutral() {
        let actual = vec![row(&[("a", Value::Integer(1))])];
        let expected = vec![row(&[("b", Value::Integer(1))])];
        let report = analyze(&actual, &expected);
        assert_eq!(report.semantic_score, 1.0);
    }

    #[test]
    fn wildly_different_numeric_values_reduce_score() {
        let actual = vec![row(&[("total", Value::Float(1.0))])];
        let expected = vec![row(&[("total", Value::Float(1_000_000.0))])];
        let report = analyze(&actual, &expected);
        assert!(report.value_accuracy < 0.5);
    }

    #[test]
    fn categorical_overlap_uses_jaccard() {
        let actual = vec![
            row(&[("status", Value::Text("open".into()))]),
            row(&[("status", Value::Text("closed".into()))]),
        ];
        let expected = vec![
            row(&[("status", Value::Text("OPEN".into()))]),
            row(&[("status", Value::Text("pending".into()))]),
        ];
        let report = analyze(&actual, &expected);
        assert!(report.value_accuracy > 0.0 && report.value_accuracy < 1.0);
    }

    #[test]
    fn type_mismatch_is_detected() {
        let actual = vec![row(&[("id", Value::Integer(1))])];
        let expected = vec![row(&[("id", Value::Text("1".into()))])];
        let report = analyze(&actual, &expected);
        assert_eq!(report.type_consistency, 0.0);
    }
}
