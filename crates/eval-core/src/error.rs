//! Error types for SQL parsing, validation, and execution.
//!
//! # Error handling strategy
//!
//! Two complementary patterns, mirrored from the teacher crate's own
//! `error.rs` doc comment:
//!
//! - [`ParseError`] and [`KernelError`]: fatal, stage-terminating errors.
//!   Returned as `Result<T, E>`.
//! - [`crate::task::Issue`]: non-fatal diagnostics (phantom-function
//!   warnings, truncation notices, dialect-fallback notices) accumulated in
//!   a `Vec<Issue>` alongside a successful result.
//!
//! This keeps the kernel resilient: parsing is total (§8 invariant 3 — see
//! [`crate::parser::parse`]), and a fatal condition at any later stage still
//! produces a complete `ExecutorResult` / `MultiDimensionalScore` rather than
//! an unhandled error (§7).

use crate::dialect::Dialect;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
#[cfg(feature = "tracing")]
use tracing::trace;

/// Error encountered during SQL parsing, preserving structured position
/// information from the underlying parser when available.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: Option<Position>,
    pub dialect: Option<Dialect>,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Category of parse error for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorKind {
    #[default]
    SyntaxError,
    MissingClause,
    UnexpectedEof,
    UnsupportedFeature,
    LexerError,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
            kind: ParseErrorKind::SyntaxError,
        }
    }

    pub fn with_position(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(Position { line, column }),
            dialect: None,
            kind: ParseErrorKind::SyntaxError,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Parses `Line: X, Column: Y` out of a `sqlparser` error message.
    /// Coupled to that crate's error format; gracefully returns `None` when
    /// the expected shape isn't found.
    fn parse_position_from_message(message: &str) -> Option<Position> {
        static POSITION_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = POSITION_REGEX
            .get_or_init(|| Regex::new(r"Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").expect("valid regex"));

        let result = re.captures(message).and_then(|caps| {
            let line: usize = caps.get(1)?.as_str().parse().ok()?;
            let column: usize = caps.get(2)?.as_str().parse().ok()?;
            Some(Position { line, column })
        });

        #[cfg(feature = "tracing")]
        if result.is_none() && (message.contains("Line") || message.contains("Column")) {
            trace!(%message, "failed to extract position from parser error");
        }

        result
    }

    /// Message-sniffing classification for unstructured `sqlparser` errors.
    fn infer_kind_from_message(message: &str) -> ParseErrorKind {
        let lower = message.to_lowercase();
        if lower.contains("unexpected end") || lower.contains("eof") {
            ParseErrorKind::UnexpectedEof
        } else if lower.contains("expected") {
            ParseErrorKind::MissingClause
        } else if lower.contains("not supported") || lower.contains("unsupported") {
            ParseErrorKind::UnsupportedFeature
        } else if lower.contains("lexer") || lower.contains("token") {
            ParseErrorKind::LexerError
        } else {
            ParseErrorKind::SyntaxError
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error")?;
        if let Some(dialect) = self.dialect {
            write!(f, " ({dialect:?})")?;
        }
        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        let message = err.to_string();
        let position = Self::parse_position_from_message(&message);
        let kind = Self::infer_kind_from_message(&message);
        Self {
            message,
            position,
            dialect: None,
            kind,
        }
    }
}

/// Fatal, stage-terminating errors produced anywhere past the parser.
/// Mirrors the closed taxonomy §7 commits to.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("unknown dialect: {name}")]
    UnknownDialect { name: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("engine syntax error: {message}")]
    EngineSyntaxError { message: String },

    #[error("table not found: {table}")]
    TableNotFound { table: String },

    #[error("column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("ambiguous column reference: {message}")]
    AmbiguousColumn { message: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("execution timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    ExecutionTimeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("connection error: {message}")]
    ConnectionError { message: String },

    #[error("resource limit exceeded: {message}")]
    ResourceLimit { message: String },

    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl KernelError {
    /// Classifies into the closed `ErrorCategory` enum the error-taxonomy
    /// analyzer and the scorer's error-severity sub-score both key off.
    pub fn category(&self) -> crate::analyzers::error_taxonomy::ErrorCategory {
        use crate::analyzers::error_taxonomy::ErrorCategory;
        match self {
            Self::UnknownDialect { .. } => ErrorCategory::Unknown,
            Self::Parse(_) => ErrorCategory::SyntaxError,
            Self::EngineSyntaxError { .. } => ErrorCategory::SyntaxError,
            Self::TableNotFound { .. } => ErrorCategory::TableNotFound,
            Self::ColumnNotFound { .. } => ErrorCategory::ColumnNotFound,
            Self::TypeMismatch { .. } => ErrorCategory::TypeMismatch,
            Self::AmbiguousColumn { .. } => ErrorCategory::AmbiguousColumn,
            Self::PermissionDenied { .. } => ErrorCategory::PermissionDenied,
            Self::ExecutionTimeout { .. } => ErrorCategory::Timeout,
            Self::ConnectionError { .. } => ErrorCategory::ConnectionError,
            Self::ResourceLimit { .. } => ErrorCategory::ResourceLimit,
            Self::ConstraintViolation { .. } => ErrorCategory::ConstraintViolation,
            Self::Cancelled => ErrorCategory::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_position_from_message() {
        let msg = "Expected SELECT, found 'INSERT' at Line: 1, Column: 5";
        let pos = ParseError::parse_position_from_message(msg);
        assert_eq!(pos, Some(Position { line: 1, column: 5 }));
    }

    #[test]
    fn parse_position_no_position() {
        assert_eq!(
            ParseError::parse_position_from_message("Unexpected token"),
            None
        );
    }

    #[test]
    fn parse_position_no_whitespace() {
        let pos = ParseError::parse_position_from_message("Error at Line:1,Column:5");
        assert_eq!(pos, Some(Position { line: 1, column: 5 }));
    }

    #[test]
    fn parse_position_malformed_non_numeric() {
        assert_eq!(
            ParseError::parse_position_from_message("Error at Line: abc, Column: 5"),
            None
        );
    }

    #[test]
    fn infer_kind_eof() {
        assert_eq!(
            ParseError::infer_kind_from_message("Unexpected end of input"),
            ParseErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn infer_kind_expected() {
        assert_eq!(
            ParseError::infer_kind_from_message("Expected SELECT keyword"),
            ParseErrorKind::MissingClause
        );
    }

    #[test]
    fn infer_kind_unsupported() {
        assert_eq!(
            ParseError::infer_kind_from_message("Feature not supported"),
            ParseErrorKind::UnsupportedFeature
        );
    }

    #[test]
    fn infer_kind_default() {
        assert_eq!(
            ParseError::infer_kind_from_message("Something went wrong"),
            ParseErrorKind::SyntaxError
        );
    }

    #[test]
    fn display_with_position_and_dialect() {
        let err = ParseError::with_position("Bad syntax", 1, 5).with_dialect(Dialect::Snowflake);
        assert_eq!(
            err.to_string(),
            "parse error (Snowflake) at line 1, column 5: Bad syntax"
        );
    }

    #[test]
    fn kernel_error_category_mapping() {
        let err = KernelError::TableNotFound {
            table: "ghosts".into(),
        };
        assert_eq!(
            err.category(),
            crate::analyzers::error_taxonomy::ErrorCategory::TableNotFound
        );
    }
}
