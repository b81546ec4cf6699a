use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{TableError, TableResult};

lazy_static! {
    static ref VALID_IDENTIFIER_REGEX: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap()
    };
    static ref LEADING_KEYWORD_REGEX: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^\s*\(*\s*([a-zA-Z]+)").unwrap()
    };
}

pub fn quote_name_if_needed(name: &str) -> String {
    if VALID_IDENTIFIER_REGEX.is_match(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

pub fn quote_names_if_needed<T: AsRef<str>>(names: &[T]) -> String {
    names
        .iter()
        .map(|name| quote_name_if_needed(name.as_ref()))
        .collect::<Vec<_>>()
        .join(".")
}

/// Rejects empty identifiers before they are sent to the server.
/// `kind` names the identifier in the error message, e.g. "table" or "integration".
pub fn validate_identifier(kind: &str, name: &str) -> TableResult<()> {
    if name.trim().is_empty() {
        Err(TableError::InvalidArgument(format!(
            "{kind} name must not be empty"
        )))
    } else {
        Ok(())
    }
}

/// Returns the statement without surrounding whitespace and trailing semicolons.
pub fn normalize_statement(statement: &str) -> TableResult<&str> {
    let statement = statement.trim().trim_end_matches(';').trim_end();
    if statement.is_empty() {
        Err(TableError::InvalidStatement(
            "statement must not be empty".to_string(),
        ))
    } else {
        Ok(statement)
    }
}

/// Returns the first keyword of the statement in upper case, skipping opening parentheses.
pub fn leading_keyword(statement: &str) -> Option<String> {
    LEADING_KEYWORD_REGEX
        .captures(statement)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Checks that the statement is a query producing rows.
pub fn validate_select(select: &str) -> TableResult<&str> {
    let select = normalize_statement(select)?;
    match leading_keyword(select).as_deref() {
        Some("SELECT") | Some("WITH") => Ok(select),
        _ => Err(TableError::InvalidStatement(format!(
            "expected a SELECT statement: {select}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_name_if_needed() {
        assert_eq!(quote_name_if_needed("sales"), "sales");
        assert_eq!(quote_name_if_needed("_raw2"), "_raw2");
        assert_eq!(quote_name_if_needed("my table"), "`my table`");
        assert_eq!(quote_name_if_needed("2024"), "`2024`");
        assert_eq!(quote_name_if_needed("a`b"), "`a``b`");
        assert_eq!(quote_names_if_needed(&["files", "q3 report"]), "files.`q3 report`");
    }

    #[test]
    fn test_normalize_statement() {
        assert_eq!(
            normalize_statement("  SELECT 1;  ").unwrap(),
            "SELECT 1"
        );
        assert_eq!(normalize_statement("SELECT 1;;").unwrap(), "SELECT 1");
        assert!(matches!(
            normalize_statement(" ; "),
            Err(TableError::InvalidStatement(_))
        ));
    }

    #[test]
    fn test_validate_select() {
        assert_eq!(
            validate_select("select * from raw.sales;").unwrap(),
            "select * from raw.sales"
        );
        assert!(validate_select("(SELECT 1)").is_ok());
        assert!(validate_select("WITH t AS (SELECT 1) SELECT * FROM t").is_ok());
        assert!(matches!(
            validate_select("DELETE FROM sales"),
            Err(TableError::InvalidStatement(_))
        ));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("table", "sales").is_ok());
        assert!(matches!(
            validate_identifier("integration", "  "),
            Err(TableError::InvalidArgument(_))
        ));
    }
}
