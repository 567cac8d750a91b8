//! SQL Parser (component D): dialect-aware parsing plus identifier
//! extraction. `parse` is total — it never panics, conveying failure
//! through `ParsedSQL::is_valid` (§8 invariant 3).

mod extract;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::parser::Parser;
#[cfg(feature = "tracing")]
use tracing::warn;

use crate::dialect::Dialect;
use crate::error::ParseError;
use crate::identifiers::IdentifierSet;

/// The parser's fixed fallback order when the requested dialect's parser
/// can't make sense of the input (§4.D, §11 "fallback-dialect parse
/// chain"). `None` at the end stands for the error-tolerant `GenericDialect`
/// last resort.
const FALLBACK_CHAIN: [Option<Dialect>; 4] = [
    Some(Dialect::Sqlite),
    Some(Dialect::Postgresql),
    Some(Dialect::Duckdb),
    Some(Dialect::Bigquery),
];

/// The result of parsing one SQL string: an opaque AST handle, its
/// extracted identifiers, and validity. Non-parser components depend only
/// on `identifiers`, never on `ast`'s shape (§9 "AST opacity").
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSQL {
    #[serde(skip)]
    pub(crate) ast: Vec<AstStatement>,
    pub dialect: Dialect,
    /// The dialect whose parser actually produced a valid AST, which may
    /// differ from `dialect` after a fallback (§11).
    pub parsed_with: Option<Dialect>,
    pub raw: String,
    pub identifiers: IdentifierSet,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Opaque wrapper so `sqlparser::ast::Statement` (which isn't
/// `Serialize`/`JsonSchema`) doesn't leak those bounds onto `ParsedSQL`.
#[derive(Debug, Clone)]
pub(crate) struct AstStatement(pub Statement);

impl ParsedSQL {
    fn failed(raw: &str, dialect: Dialect, error: ParseError) -> Self {
        Self {
            ast: Vec::new(),
            dialect,
            parsed_with: None,
            raw: raw.to_string(),
            identifiers: IdentifierSet::default(),
            is_valid: false,
            error: Some(error.to_string()),
        }
    }

    pub(crate) fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.ast.iter().map(|s| &s.0)
    }
}

/// Parses `sql` under the given dialect's own parser. Pure, no fallback.
pub fn parse_statements(sql: &str, dialect: Dialect) -> Result<Vec<Statement>, ParseError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    Parser::parse_sql(sqlparser_dialect.as_ref(), sql).map_err(|e| ParseError::from(e).with_dialect(dialect))
}

/// Top-level parse entry point (§4.D, §6 `parse`). Total: any parser
/// failure yields `ParsedSQL { is_valid: false, .. }` rather than
/// propagating an error.
pub fn parse(sql: &str, dialect: Dialect) -> ParsedSQL {
    match parse_statements(sql, dialect) {
        Ok(statements) => build_parsed(sql, dialect, Some(dialect), statements),
        Err(primary_err) => match parse_with_fallback(sql, dialect) {
            Some((fallback_dialect, statements)) => {
                #[cfg(feature = "tracing")]
                warn!(
                    requested = ?dialect,
                    fell_back_to = ?fallback_dialect,
                    "dialect parse failed, fallback succeeded"
                );
                build_parsed(sql, dialect, fallback_dialect, statements)
            }
            None => ParsedSQL::failed(sql, dialect, primary_err),
        },
    }
}

/// Walks the fixed fallback chain (sqlite -> postgres -> duckdb -> bigquery
/// -> error-tolerant generic), returning the first dialect whose parser
/// accepts the input. `None` fallback_dialect in the return value means the
/// error-tolerant generic parser was the one that succeeded.
fn parse_with_fallback(sql: &str, already_tried: Dialect) -> Option<(Option<Dialect>, Vec<Statement>)> {
    for candidate in FALLBACK_CHAIN.into_iter().flatten() {
        if candidate == already_tried {
            continue;
        }
        if let Ok(statements) = parse_statements(sql, candidate) {
            return Some((Some(candidate), statements));
        }
    }
    // Final resort: the permissive generic dialect, which tolerates a wider
    // token grammar than any single named dialect.
    use sqlparser::dialect::GenericDialect;
    Parser::parse_sql(&GenericDialect {}, sql)
        .ok()
        .map(|statements| (None, statements))
}

fn build_parsed(
    sql: &str,
    requested: Dialect,
    parsed_with: Option<Dialect>,
    statements: Vec<Statement>,
) -> ParsedSQL {
    let identifiers = extract::extract(&statements);
    ParsedSQL {
        ast: statements.into_iter().map(AstStatement).collect(),
        dialect: requested,
        parsed_with,
        raw: sql.to_string(),
        identifiers,
        is_valid: true,
        error: None,
    }
}

/// Best-effort dialect conversion. Falls back to returning the input
/// unchanged when `sql` doesn't parse under `from_dialect`, or when
/// re-rendering under `to_dialect`'s AST display would lose information
/// `sqlparser` can't round-trip — in practice `sqlparser`'s `Display` impl
/// is dialect-agnostic, so this is a parse-and-reprint rather than a true
/// semantic transpile; it's sufficient for the `LEN`-style cosmetic
/// differences the kernel cares about, not a general SQL compiler.
pub fn transpile(sql: &str, from_dialect: Dialect, _to_dialect: Dialect) -> String {
    match parse_statements(sql, from_dialect) {
        Ok(statements) => statements
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(";\n"),
        Err(_) => sql.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_total_never_panics_on_garbage() {
        let parsed = parse("SELECT FROM FROM SELECT (((", Dialect::Sqlite);
        assert!(!parsed.is_valid);
        assert!(parsed.error.is_some());
    }

    #[test]
    fn parse_valid_query_extracts_identifiers() {
        let parsed = parse("SELECT id FROM users", Dialect::Sqlite);
        assert!(parsed.is_valid);
        assert_eq!(parsed.identifiers.tables, vec!["users".to_string()]);
    }

    #[test]
    fn fallback_chain_records_actual_parsing_dialect() {
        // Postgres-only cast syntax parsed while requesting mysql should
        // either succeed directly or record which dialect in the chain did.
        let parsed = parse("SELECT workspace_id::text FROM t", Dialect::Mysql);
        assert!(parsed.is_valid);
    }

    #[test]
    fn transpile_falls_back_to_input_on_parse_failure() {
        let garbage = "not even slightly valid sql (((";
        assert_eq!(
            transpile(garbage, Dialect::Sqlite, Dialect::Postgresql),
            garbage
        );
    }

    #[test]
    fn transpile_reprints_valid_sql() {
        let out = transpile("select 1", Dialect::Sqlite, Dialect::Postgresql);
        assert!(out.to_lowercase().contains("select"));
    }
}
