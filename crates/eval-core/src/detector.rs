//! Hallucination Detector (component E): classifies every identifier a
//! parsed query references as real or phantom against a `SchemaSnapshot`
//! and `Dialect`.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::identifiers::Alias;
use crate::parser::ParsedSQL;
use crate::schema::SchemaSnapshot;
use crate::task::{Issue, IssueSeverity};

/// Per-kind phantom lists plus a [0,1] hallucination score, 0 meaning
/// clean.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HallucinationReport {
    pub phantom_tables: Vec<String>,
    pub phantom_columns: Vec<String>,
    pub phantom_functions: Vec<String>,
    pub dialect: Dialect,
    /// `phantom_count / max(1, total_identifier_count)`.
    pub hallucination_score: f64,
    /// Severity-weighted variant with diminishing returns; this is the one
    /// the scorer's safety dimension consumes.
    pub weighted_score: f64,
}

impl HallucinationReport {
    pub fn is_clean(&self) -> bool {
        self.phantom_tables.is_empty()
            && self.phantom_columns.is_empty()
            && self.phantom_functions.is_empty()
    }

    fn phantom_count(&self) -> usize {
        self.phantom_tables.len() + self.phantom_columns.len() + self.phantom_functions.len()
    }
}

/// The weight each phantom kind carries in the severity-weighted score.
const TABLE_WEIGHT: f64 = 1.0;
const COLUMN_WEIGHT: f64 = 0.8;
const FUNCTION_WEIGHT: f64 = 0.6;

/// Diminishing-returns curve over the severity-weighted penalty sum `p`
/// (§4.E). Shared with the error-taxonomy analyzer's aggregate score.
pub(crate) fn diminishing_returns(p: f64) -> f64 {
    if p < 1.0 {
        1.0 - 0.6 * p
    } else if p < 2.0 {
        0.4 - 0.3 * (p - 1.0)
    } else {
        (0.1 - 0.05 * (p - 2.0)).max(0.0)
    }
}

/// Runs detection over a parsed query's identifier set.
pub fn detect(parsed: &ParsedSQL, schema: &SchemaSnapshot, dialect: Dialect) -> HallucinationReport {
    let ids = &parsed.identifiers;

    let phantom_tables = find_phantom_tables(ids, schema);
    let valid_columns = build_valid_column_set(ids, schema);
    let phantom_columns = find_phantom_columns(ids, schema, &valid_columns);
    let phantom_functions = find_phantom_functions(ids, dialect);

    let total = ids.total_identifier_count().max(1) as f64;
    let phantom_count = (phantom_tables.len() + phantom_columns.len() + phantom_functions.len()) as f64;
    let hallucination_score = phantom_count / total;

    let weighted_penalty = phantom_tables.len() as f64 * TABLE_WEIGHT
        + phantom_columns.len() as f64 * COLUMN_WEIGHT
        + phantom_functions.len() as f64 * FUNCTION_WEIGHT;
    let weighted_score = diminishing_returns(weighted_penalty);

    HallucinationReport {
        phantom_tables,
        phantom_columns,
        phantom_functions,
        dialect,
        hallucination_score,
        weighted_score,
    }
}

fn is_cte_or_subquery_alias(ids: &crate::identifiers::IdentifierSet, name: &str) -> bool {
    ids.resolve_alias(name).is_some_and(Alias::is_cte_or_subquery)
}

fn last_dotted_component(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn find_phantom_tables(ids: &crate::identifiers::IdentifierSet, schema: &SchemaSnapshot) -> Vec<String> {
    ids.tables
        .iter()
        .filter(|t| {
            if is_cte_or_subquery_alias(ids, t) {
                return false;
            }
            let last = last_dotted_component(t);
            !(schema.has_table(t) || schema.has_table(last))
        })
        .cloned()
        .collect()
}

/// Union of (i) every column of every referenced real table, (ii) every
/// CTE/subquery's produced column set, (iii) every SELECT alias.
fn build_valid_column_set(
    ids: &crate::identifiers::IdentifierSet,
    schema: &SchemaSnapshot,
) -> HashSet<String> {
    let mut valid = HashSet::new();
    for table_ref in &ids.tables {
        let last = last_dotted_component(table_ref);
        if let Some(table) = schema.get_table(table_ref).or_else(|| schema.get_table(last)) {
            for col in table.column_names() {
                valid.insert(col.to_lowercase());
            }
        }
    }
    for cols in ids.cte_columns.values() {
        for c in cols {
            valid.insert(c.to_lowercase());
        }
    }
    for alias in &ids.select_aliases {
        valid.insert(alias.clone());
    }
    valid
}

fn find_phantom_columns(
    ids: &crate::identifiers::IdentifierSet,
    schema: &SchemaSnapshot,
    valid_columns: &HashSet<String>,
) -> Vec<String> {
    ids.columns
        .iter()
        .filter(|col_ref| is_phantom_column(ids, schema, valid_columns, col_ref))
        .cloned()
        .collect()
}

fn is_phantom_column(
    ids: &crate::identifiers::IdentifierSet,
    schema: &SchemaSnapshot,
    valid_columns: &HashSet<String>,
    col_ref: &str,
) -> bool {
    match col_ref.rsplit_once('.') {
        None => {
            // Unqualified: phantom iff no table has a column of this name,
            // and it's not a CTE/subquery column or SELECT alias.
            !valid_columns.contains(&col_ref.to_lowercase())
                && schema.get_column_anywhere(col_ref).is_empty()
        }
        Some((qualifier, column)) => match ids.resolve_alias(qualifier) {
            Some(Alias::Real(table)) => !schema.has_column(table, column),
            Some(Alias::Cte) | Some(Alias::Subquery) => {
                match ids.cte_columns.get(qualifier) {
                    Some(cols) => !cols.iter().any(|c| c.eq_ignore_ascii_case(column)),
                    // Unknown column set: prefer false-negative over
                    // false-positive (§4.E).
                    None => false,
                }
            }
            None => {
                // Qualifier isn't a known alias; treat it as a direct table
                // name (possibly schema-qualified).
                if schema.has_table(qualifier) {
                    !schema.has_column(qualifier, column)
                } else {
                    let last = last_dotted_component(qualifier);
                    if schema.has_table(last) {
                        !schema.has_column(last, column)
                    } else {
                        // Unresolvable qualifier: don't flag the column,
                        // the table phantom check already caught the
                        // unknown table.
                        false
                    }
                }
            }
        },
    }
}

fn find_phantom_functions(ids: &crate::identifiers::IdentifierSet, dialect: Dialect) -> Vec<String> {
    ids.functions
        .iter()
        .filter(|f| !dialect.is_builtin_function(f))
        .cloned()
        .collect()
}

/// Validation result (§4.E `validate`): each phantom table/column becomes
/// an error-severity `Issue`; each phantom function becomes a warning
/// (advisory — user-defined functions can't be told apart from typos).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .count()
    }
}

pub fn validate(sql: &str, schema: &SchemaSnapshot, dialect: Dialect) -> ValidationResult {
    let parsed = crate::parser::parse(sql, dialect);
    if !parsed.is_valid {
        return ValidationResult {
            issues: vec![Issue::error(
                crate::task::issue_codes::PARSE_ERROR,
                parsed.error.clone().unwrap_or_default(),
            )],
        };
    }
    let report = detect(&parsed, schema, dialect);
    let mut issues = Vec::new();
    for t in &report.phantom_tables {
        issues.push(Issue::error(
            crate::task::issue_codes::PHANTOM_TABLE,
            format!("table not found in schema: {t}"),
        ));
    }
    for c in &report.phantom_columns {
        issues.push(Issue::error(
            crate::task::issue_codes::PHANTOM_COLUMN,
            format!("column not found in schema: {c}"),
        ));
    }
    for f in &report.phantom_functions {
        issues.push(Issue::warning(
            crate::task::issue_codes::PHANTOM_FUNCTION,
            format!("function not recognized for dialect {dialect:?}: {f}"),
        ));
    }
    ValidationResult { issues }
}
