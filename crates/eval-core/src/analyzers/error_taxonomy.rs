//! Error taxonomy analyzer (§4.H): classifies a raw error message into a
//! closed category set by regex probing, independent of whether it arrived
//! as a structured `KernelError` or free-text from an engine.

use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The closed taxonomy §7 commits to. `KernelError::category` maps every
/// fatal variant onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    SyntaxError,
    TableNotFound,
    ColumnNotFound,
    TypeMismatch,
    AmbiguousColumn,
    PermissionDenied,
    ConstraintViolation,
    Timeout,
    ConnectionError,
    ResourceLimit,
    Unknown,
}

impl ErrorCategory {
    /// Severity in `[0,1]`, used as the per-error weight feeding the
    /// aggregate error score.
    pub fn severity(self) -> f64 {
        match self {
            ErrorCategory::SyntaxError => 0.5,
            ErrorCategory::TableNotFound => 0.7,
            ErrorCategory::ColumnNotFound => 0.6,
            ErrorCategory::TypeMismatch => 0.4,
            ErrorCategory::AmbiguousColumn => 0.3,
            ErrorCategory::PermissionDenied => 0.8,
            ErrorCategory::ConstraintViolation => 0.6,
            ErrorCategory::Timeout => 0.7,
            ErrorCategory::ConnectionError => 0.9,
            ErrorCategory::ResourceLimit => 0.8,
            ErrorCategory::Unknown => 0.5,
        }
    }

    /// Whether retrying the same query against the same schema could
    /// plausibly succeed (transient conditions) as opposed to requiring the
    /// query or schema to change.
    pub fn recoverable(self) -> bool {
        matches!(
            self,
            ErrorCategory::Timeout | ErrorCategory::ConnectionError | ErrorCategory::ResourceLimit
        )
    }
}

struct Patterns {
    table_not_found: Regex,
    column_not_found: Regex,
    type_mismatch: Regex,
    ambiguous: Regex,
    permission: Regex,
    constraint: Regex,
    timeout: Regex,
    connection: Regex,
    resource_limit: Regex,
    syntax: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        table_not_found: Regex::new(r"(?i)(table|relation).*(not exist|not found|no such table|unknown table)")
            .expect("valid regex"),
        column_not_found: Regex::new(r"(?i)(column|field).*(not exist|not found|no such column|unknown column)")
            .expect("valid regex"),
        type_mismatch: Regex::new(r"(?i)(type mismatch|cannot cast|incompatible types|invalid input syntax for)")
            .expect("valid regex"),
        ambiguous: Regex::new(r"(?i)ambiguous").expect("valid regex"),
        permission: Regex::new(r"(?i)(permission denied|access denied|not authorized|insufficient privilege)")
            .expect("valid regex"),
        constraint: Regex::new(r"(?i)(constraint|unique violation|foreign key violation|not-null violation)")
            .expect("valid regex"),
        timeout: Regex::new(r"(?i)(timed? ?out|timeout|deadline exceeded)").expect("valid regex"),
        connection: Regex::new(r"(?i)(connection|could not connect|broken pipe|network)").expect("valid regex"),
        resource_limit: Regex::new(r"(?i)(resource|out of memory|too many connections|quota exceeded|disk full)")
            .expect("valid regex"),
        syntax: Regex::new(r"(?i)(syntax error|parse error|unexpected token|expected)").expect("valid regex"),
    })
}

/// Classifies a free-text error message (§4.H). Checked in an order that
/// prefers the more specific categories before the generic `syntax_error`
/// catch-all.
pub fn classify_message(message: &str) -> ErrorCategory {
    let p = patterns();
    if p.table_not_found.is_match(message) {
        ErrorCategory::TableNotFound
    } else if p.column_not_found.is_match(message) {
        ErrorCategory::ColumnNotFound
    } else if p.ambiguous.is_match(message) {
        ErrorCategory::AmbiguousColumn
    } else if p.type_mismatch.is_match(message) {
        ErrorCategory::TypeMismatch
    } else if p.permission.is_match(message) {
        ErrorCategory::PermissionDenied
    } else if p.constraint.is_match(message) {
        ErrorCategory::ConstraintViolation
    } else if p.timeout.is_match(message) {
        ErrorCategory::Timeout
    } else if p.connection.is_match(message) {
        ErrorCategory::ConnectionError
    } else if p.resource_limit.is_match(message) {
        ErrorCategory::ResourceLimit
    } else if p.syntax.is_match(message) {
        ErrorCategory::SyntaxError
    } else {
        ErrorCategory::Unknown
    }
}

/// Aggregate error score over a batch of categorized errors, reusing the
/// same diminishing-returns curve as the hallucination detector's
/// severity-weighted score (§4.H).
pub fn aggregate_error_score(categories: &[ErrorCategory]) -> f64 {
    let severity_sum: f64 = categories.iter().map(|c| c.severity()).sum();
    crate::detector::diminishing_returns(severity_sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_table_not_found() {
        assert_eq!(
            classify_message("ERROR: relation \"ghosts\" does not exist"),
            ErrorCategory::TableNotFound
        );
        assert_eq!(
            classify_message("no such table: ghosts"),
            ErrorCategory::TableNotFound
        );
    }

    #[test]
    fn classifies_timeout_and_connection() {
        assert_eq!(classify_message("query timed out after 30s"), ErrorCategory::Timeout);
        assert_eq!(
            classify_message("could not connect to server"),
            ErrorCategory::ConnectionError
        );
    }

    #[test]
    fn unrecognized_message_is_unknown() {
        assert_eq!(classify_message("something unexpected happened"), ErrorCategory::Unknown);
    }

    #[test]
    fn aggregate_score_decreases_with_more_errors() {
        let one = aggregate_error_score(&[ErrorCategory::SyntaxError]);
        let many = aggregate_error_score(&[
            ErrorCategory::SyntaxError,
            ErrorCategory::ConnectionError,
            ErrorCategory::ResourceLimit,
        ]);
        assert!(many <= one);
    }

    #[test]
    fn no_errors_gives_perfect_score() {
        assert_eq!(aggregate_error_score(&[]), 1.0);
    }

    #[test]
    fn connection_errors_are_recoverable_but_syntax_errors_are_not() {
        assert!(ErrorCategory::ConnectionError.recoverable());
        assert!(!ErrorCategory::SyntaxError.recoverable());
    }
}
