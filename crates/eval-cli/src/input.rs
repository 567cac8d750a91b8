//! Input handling: SQL text from a file, `--sql`, or stdin.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Resolves the SQL text to evaluate: `--sql` takes precedence, then a
/// positional file path, then stdin.
pub fn read_sql(sql_flag: Option<&str>, sql_file: Option<&Path>) -> Result<String> {
    if let Some(sql) = sql_flag {
        return Ok(sql.to_string());
    }
    match sql_file {
        Some(path) => read_from_file(path),
        None => read_from_stdin(),
    }
}

fn read_from_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read SQL file: {}", path.display()))
}

fn read_from_stdin() -> Result<String> {
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("failed to read SQL from stdin")?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn sql_flag_takes_precedence() {
        let sql = read_sql(Some("SELECT 1"), Some(Path::new("ignored.sql"))).unwrap();
        assert_eq!(sql, "SELECT 1");
    }

    #[test]
    fn reads_from_file_when_no_flag() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SELECT * FROM orders").unwrap();

        let sql = read_sql(None, Some(file.path())).unwrap();
        assert!(sql.contains("SELECT * FROM orders"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = read_sql(None, Some(Path::new("/nonexistent/query.sql")));
        assert!(result.is_err());
    }
}
