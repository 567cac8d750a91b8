//! Dialect registry: the closed set of supported SQL dialects, their
//! capability flags, built-in function sets, and cross-dialect function
//! aliases.
//!
//! Dialect values are process-wide constants, built once and never mutated.

use std::collections::HashSet;
use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// A supported SQL dialect, drawn from a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Sqlite,
    Duckdb,
    Postgresql,
    Bigquery,
    Snowflake,
    Mysql,
}

/// Feature flags carried by a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectFeatures {
    pub supports_schemas: bool,
    pub supports_cte: bool,
    pub supports_window_functions: bool,
    pub supports_json: bool,
    pub supports_arrays: bool,
}

impl Dialect {
    /// Parser-facing name, as would be passed on a CLI or config file.
    pub fn parser_name(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Duckdb => "duckdb",
            Self::Postgresql => "postgresql",
            Self::Bigquery => "bigquery",
            Self::Snowflake => "snowflake",
            Self::Mysql => "mysql",
        }
    }

    pub fn default_schema(&self) -> Option<&'static str> {
        match self {
            Self::Postgresql => Some("public"),
            Self::Mysql => None,
            Self::Sqlite => None,
            Self::Duckdb => Some("main"),
            Self::Bigquery => None,
            Self::Snowflake => Some("public"),
        }
    }

    pub fn features(&self) -> DialectFeatures {
        match self {
            Self::Sqlite => DialectFeatures {
                supports_schemas: false,
                supports_cte: true,
                supports_window_functions: true,
                supports_json: true,
                supports_arrays: false,
            },
            Self::Duckdb => DialectFeatures {
                supports_schemas: true,
                supports_cte: true,
                supports_window_functions: true,
                supports_json: true,
                supports_arrays: true,
            },
            Self::Postgresql => DialectFeatures {
                supports_schemas: true,
                supports_cte: true,
                supports_window_functions: true,
                supports_json: true,
                supports_arrays: true,
            },
            Self::Bigquery => DialectFeatures {
                supports_schemas: true,
                supports_cte: true,
                supports_window_functions: true,
                supports_json: true,
                supports_arrays: true,
            },
            Self::Snowflake => DialectFeatures {
                supports_schemas: true,
                supports_cte: true,
                supports_window_functions: true,
                supports_json: true,
                supports_arrays: true,
            },
            Self::Mysql => DialectFeatures {
                supports_schemas: false,
                supports_cte: true,
                supports_window_functions: true,
                supports_json: true,
                supports_arrays: false,
            },
        }
    }

    /// Maps to the `sqlparser` dialect used for AST parsing.
    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{
            BigQueryDialect, DuckDbDialect, GenericDialect, MySqlDialect, PostgreSqlDialect,
            SQLiteDialect, SnowflakeDialect,
        };
        match self {
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::Duckdb => Box::new(DuckDbDialect {}),
            Self::Postgresql => Box::new(PostgreSqlDialect {}),
            Self::Bigquery => Box::new(BigQueryDialect {}),
            Self::Snowflake => Box::new(SnowflakeDialect {}),
            Self::Mysql => Box::new(MySqlDialect {}),
        }
    }

    /// The dialect's closed, uppercased built-in function set.
    pub fn builtin_functions(&self) -> &'static HashSet<&'static str> {
        match self {
            Self::Sqlite => &SQLITE_FUNCTIONS,
            Self::Duckdb => &DUCKDB_FUNCTIONS,
            Self::Postgresql => &POSTGRESQL_FUNCTIONS,
            Self::Bigquery => &BIGQUERY_FUNCTIONS,
            Self::Snowflake => &SNOWFLAKE_FUNCTIONS,
            Self::Mysql => &MYSQL_FUNCTIONS,
        }
    }

    /// True if `name` (any case) is a recognized built-in for this dialect,
    /// directly or via the cross-dialect alias table.
    pub fn is_builtin_function(&self, name: &str) -> bool {
        let upper = name.to_uppercase();
        if self.builtin_functions().contains(upper.as_str()) {
            return true;
        }
        is_function_alias(&upper, self.builtin_functions())
    }
}

/// Lookup table over the closed dialect set.
pub struct DialectRegistry;

impl DialectRegistry {
    /// Case-insensitive lookup by name.
    pub fn get(name: &str) -> Result<Dialect, KernelError> {
        let lower = name.to_lowercase();
        ALL_DIALECTS
            .iter()
            .copied()
            .find(|d| d.parser_name() == lower)
            .ok_or_else(|| KernelError::UnknownDialect {
                name: name.to_string(),
            })
    }

    pub fn all() -> &'static [Dialect] {
        &ALL_DIALECTS
    }
}

const ALL_DIALECTS: [Dialect; 6] = [
    Dialect::Sqlite,
    Dialect::Duckdb,
    Dialect::Postgresql,
    Dialect::Bigquery,
    Dialect::Snowflake,
    Dialect::Mysql,
];

macro_rules! fn_set {
    ($($name:literal),+ $(,)?) => {{
        let mut set = HashSet::new();
        $(set.insert($name);)+
        set
    }};
}

// Common ANSI-ish core shared by every engine; each dialect's set below adds
// its own extensions on top (duplication is intentional — these sets are
// meant to be read and extended independently per dialect).
static COMMON_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    fn_set![
        "COUNT", "SUM", "AVG", "MIN", "MAX", "ABS", "ROUND", "CEIL", "CEILING", "FLOOR", "POWER",
        "SQRT", "MOD", "UPPER", "LOWER", "LENGTH", "TRIM", "LTRIM", "RTRIM", "REPLACE",
        "SUBSTRING", "CONCAT", "COALESCE", "NULLIF", "CAST", "CASE", "EXTRACT", "NOW",
        "CURRENT_TIMESTAMP", "CURRENT_DATE", "CURRENT_TIME", "ROW_NUMBER", "RANK", "DENSE_RANK",
        "LAG", "LEAD", "FIRST_VALUE", "LAST_VALUE", "NTILE", "EXISTS", "DISTINCT",
    ]
});

static SQLITE_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = COMMON_FUNCTIONS.clone();
    set.extend(fn_set![
        "SUBSTR",
        "GROUP_CONCAT",
        "TOTAL",
        "DATETIME",
        "STRFTIME",
        "JULIANDAY",
        "IFNULL",
        "LIKELIHOOD",
        "RANDOM",
        "HEX",
        "INSTR",
        "TYPEOF",
        "ZEROBLOB",
        "JSON_EXTRACT",
        "JSON_ARRAY",
        "JSON_OBJECT",
    ]);
    set
});

static DUCKDB_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = COMMON_FUNCTIONS.clone();
    set.extend(fn_set![
        "LIST_AGGREGATE",
        "LIST_VALUE",
        "UNNEST",
        "READ_CSV",
        "READ_PARQUET",
        "STRUCT_PACK",
        "EPOCH",
        "DATE_TRUNC",
        "REGEXP_MATCHES",
        "REGEXP_REPLACE",
        "STRING_AGG",
        "ARRAY_AGG",
        "TRY_CAST",
        "GENERATE_SERIES",
    ]);
    set
});

static POSTGRESQL_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = COMMON_FUNCTIONS.clone();
    set.extend(fn_set![
        "STRING_AGG",
        "ARRAY_AGG",
        "ARRAY_LENGTH",
        "UNNEST",
        "GENERATE_SERIES",
        "TO_CHAR",
        "TO_DATE",
        "TO_TIMESTAMP",
        "DATE_TRUNC",
        "AGE",
        "REGEXP_REPLACE",
        "REGEXP_MATCHES",
        "JSONB_BUILD_OBJECT",
        "JSON_AGG",
        "COALESCE",
        "GREATEST",
        "LEAST",
    ]);
    set
});

static BIGQUERY_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = COMMON_FUNCTIONS.clone();
    set.extend(fn_set![
        "SAFE_DIVIDE",
        "SAFE_CAST",
        "ARRAY_AGG",
        "GENERATE_ARRAY",
        "STRUCT",
        "PARSE_DATE",
        "FORMAT_DATE",
        "DATE_DIFF",
        "TIMESTAMP_DIFF",
        "REGEXP_CONTAINS",
        "REGEXP_EXTRACT",
        "ST_DISTANCE",
        "APPROX_COUNT_DISTINCT",
        "FARM_FINGERPRINT",
    ]);
    set
});

static SNOWFLAKE_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = COMMON_FUNCTIONS.clone();
    set.extend(fn_set![
        "TRY_CAST",
        "FLATTEN",
        "OBJECT_CONSTRUCT",
        "ARRAY_AGG",
        "ARRAY_CONSTRUCT",
        "DATEADD",
        "DATEDIFF",
        "DATE_PART",
        "TO_VARIANT",
        "PARSE_JSON",
        "LISTAGG",
        "GET",
        "IFF",
    ]);
    set
});

static MYSQL_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = COMMON_FUNCTIONS.clone();
    set.extend(fn_set![
        "GROUP_CONCAT",
        "IFNULL",
        "DATE_FORMAT",
        "STR_TO_DATE",
        "TIMESTAMPDIFF",
        "TIMESTAMPADD",
        "JSON_EXTRACT",
        "JSON_OBJECT",
        "JSON_ARRAY",
        "FIELD",
        "FIND_IN_SET",
    ]);
    set
});

/// Groups of cross-dialect function aliases: different engines' names for
/// the same operation. Deliberately small, data-driven, and advisory —
/// ported from the original benchmark's function-alias table.
static ALIAS_GROUPS: LazyLock<Vec<HashSet<&'static str>>> = LazyLock::new(|| {
    vec![
        fn_set!["LEN", "LENGTH"],
        fn_set!["SUBSTR", "SUBSTRING"],
        fn_set!["CHARINDEX", "POSITION", "INSTR"],
        fn_set!["ISNULL", "IFNULL", "COALESCE", "NVL"],
        fn_set!["NVL", "IFNULL", "COALESCE"],
        fn_set!["GETDATE", "NOW", "CURRENT_TIMESTAMP"],
        fn_set!["DATEPART", "EXTRACT", "DATE_PART"],
        fn_set!["DATEDIFF", "DATE_DIFF", "TIMESTAMPDIFF"],
        fn_set!["DATEADD", "DATE_ADD", "TIMESTAMPADD"],
        fn_set!["INT", "INTEGER", "CAST"],
        fn_set!["VARCHAR", "TEXT", "STRING"],
    ]
});

/// True if `used` (uppercase) names the same operation as some function
/// already present in `available` (e.g. `used` = LEN, `available` has
/// LENGTH).
pub fn is_function_alias(used: &str, available: &HashSet<&'static str>) -> bool {
    ALIAS_GROUPS.iter().any(|group| {
        group.contains(used) && group.iter().any(|candidate| available.contains(candidate))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_is_case_insensitive() {
        assert_eq!(DialectRegistry::get("SQLite").unwrap(), Dialect::Sqlite);
        assert_eq!(DialectRegistry::get("POSTGRESQL").unwrap(), Dialect::Postgresql);
    }

    #[test]
    fn registry_rejects_unknown_dialect() {
        assert!(matches!(
            DialectRegistry::get("oracle"),
            Err(KernelError::UnknownDialect { .. })
        ));
    }

    #[test]
    fn registry_all_returns_six_dialects() {
        assert_eq!(DialectRegistry::all().len(), 6);
    }

    #[test]
    fn builtin_lookup_is_o1_set_membership() {
        assert!(Dialect::Postgresql.is_builtin_function("string_agg"));
        assert!(!Dialect::Sqlite.is_builtin_function("totally_made_up_fn"));
    }

    #[test]
    fn safe_divide_is_bigquery_builtin_but_not_sqlite() {
        assert!(Dialect::Bigquery.is_builtin_function("SAFE_DIVIDE"));
        assert!(!Dialect::Sqlite.is_builtin_function("SAFE_DIVIDE"));
        assert!(!is_function_alias(
            "SAFE_DIVIDE",
            Dialect::Sqlite.builtin_functions()
        ));
    }

    #[test]
    fn len_is_an_alias_of_length() {
        assert!(is_function_alias("LEN", Dialect::Postgresql.builtin_functions()));
    }

    #[test]
    fn ifnull_coalesce_nvl_cross_alias() {
        // sqlite has IFNULL natively; postgresql only has COALESCE.
        assert!(Dialect::Postgresql.is_builtin_function("IFNULL"));
        assert!(Dialect::Postgresql.is_builtin_function("NVL"));
    }
}
