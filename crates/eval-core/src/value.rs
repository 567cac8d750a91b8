//! Dynamic, name-indexed row representation shared by the executor,
//! comparator, and analyzers.
//!
//! The source system carries rows as mappings from string column names to
//! heterogeneous values. We represent that as a tagged sum type (`Value`)
//! plus an ordered, name-indexed `Row`. A result's schema is pinned from its
//! `columns` list; every `Row` in an `ExecutionResult` is expected to carry
//! exactly those names, in order.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single cell value. Dialects that don't support arrays/structs simply
/// never produce `Value::Array` / `Value::Struct`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Bytes(#[schemars(with = "String")] Vec<u8>),
    Timestamp(String),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view used by the comparator's tolerance check and the
    /// semantic-accuracy analyzer's numeric-column aggregation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Case-folded text view, used by case-insensitive string comparison.
    pub fn as_text_lower(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.to_lowercase()),
            Value::Timestamp(s) => Some(s.to_lowercase()),
            _ => None,
        }
    }

    /// Equality under the comparator's rules: numeric tolerance of 1e-6,
    /// case-insensitive text, nulls equal only to nulls.
    pub fn compare_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => {
                if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
                    return (a - b).abs() <= 1e-6;
                }
                if let (Some(a), Some(b)) = (self.as_text_lower(), other.as_text_lower()) {
                    return a == b;
                }
                match (self, other) {
                    (Value::Boolean(a), Value::Boolean(b)) => a == b,
                    (Value::Array(a), Value::Array(b)) => {
                        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.compare_eq(y))
                    }
                    (Value::Struct(a), Value::Struct(b)) => {
                        a.len() == b.len()
                            && a.iter()
                                .all(|(k, v)| b.get(k).is_some_and(|w| v.compare_eq(w)))
                    }
                    _ => false,
                }
            }
        }
    }

    /// A stable sort/hash key, used when the comparator needs multiset
    /// equality (`set_based` strategy) over row-maps.
    pub fn sort_key(&self) -> String {
        match self {
            Value::Null => "\0null".to_string(),
            Value::Integer(i) => format!("i:{i}"),
            Value::Float(f) => format!("f:{f}"),
            Value::Text(s) => format!("t:{}", s.to_lowercase()),
            Value::Boolean(b) => format!("b:{b}"),
            Value::Bytes(b) => format!("x:{b:?}"),
            Value::Timestamp(s) => format!("ts:{}", s.to_lowercase()),
            Value::Array(a) => format!("a:[{}]", a.iter().map(Value::sort_key).collect::<Vec<_>>().join(",")),
            Value::Struct(s) => format!(
                "s:{{{}}}",
                s.iter()
                    .map(|(k, v)| format!("{k}={}", v.sort_key()))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare_eq(other)
    }
}

/// A name-indexed row. Column order mirrors `ExecutionResult::columns`.
pub type Row = indexmap::IndexMap<String, Value>;

/// Orders rows by their `sort_key` sequence for stable multiset comparison.
pub fn row_sort_key(row: &Row) -> Vec<String> {
    row.values().map(Value::sort_key).collect()
}
