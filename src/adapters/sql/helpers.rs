//! SQL text helpers

use crate::domain::{DextractError, Result};

/// SQL that loads `ids` into a temporary one-column table for joining
///
/// Produces `DROP TABLE IF EXISTS`, `CREATE TEMP TABLE <table> (<column> BIGINT)` and,
/// when `ids` is non-empty, a single multi-row `INSERT`. Statements are separated by
/// `;\n` so the text can go to [`SqlClient::execute`](super::SqlClient::execute).
///
/// # Errors
///
/// Returns a validation error if `table` or `column` is not a plain SQL identifier.
///
/// # Examples
///
/// ```
/// use dextract::adapters::sql::join_identifiers_sql;
///
/// let sql = join_identifiers_sql("cohort", "user_id", &[3, 5]).unwrap();
/// assert!(sql.contains("CREATE TEMP TABLE cohort (user_id BIGINT)"));
/// assert!(sql.contains("INSERT INTO cohort (user_id) VALUES (3), (5)"));
/// ```
pub fn join_identifiers_sql(table: &str, column: &str, ids: &[i64]) -> Result<String> {
    check_identifier(table)?;
    check_identifier(column)?;

    let mut statements = vec![
        format!("DROP TABLE IF EXISTS {table}"),
        format!("CREATE TEMP TABLE {table} ({column} BIGINT)"),
    ];

    if !ids.is_empty() {
        let values = ids
            .iter()
            .map(|id| format!("({id})"))
            .collect::<Vec<_>>()
            .join(", ");
        statements.push(format!("INSERT INTO {table} ({column}) VALUES {values}"));
    }

    Ok(statements.join(";\n") + ";")
}

fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DextractError::Validation(format!(
            "'{name}' is not a plain SQL identifier"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_full_script() {
        let sql = join_identifiers_sql("ids", "UserId", &[101, -2]).unwrap();
        assert_eq!(
            sql,
            "DROP TABLE IF EXISTS ids;\nCREATE TEMP TABLE ids (UserId BIGINT);\nINSERT INTO ids (UserId) VALUES (101), (-2);"
        );
    }

    #[test]
    fn test_empty_ids_skip_insert() {
        let sql = join_identifiers_sql("ids", "id", &[]).unwrap();
        assert!(!sql.contains("INSERT"));
        assert!(sql.ends_with("(id BIGINT);"));
    }

    #[test_case("ids; DROP TABLE users" ; "injection")]
    #[test_case("1ids" ; "leading digit")]
    #[test_case("" ; "empty")]
    #[test_case("my table" ; "space")]
    fn test_rejects_non_identifiers(name: &str) {
        assert!(join_identifiers_sql(name, "id", &[1]).is_err());
        assert!(join_identifiers_sql("ids", name, &[1]).is_err());
    }
}
