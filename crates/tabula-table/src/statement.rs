//! SQL rendering for table operations.
//!
//! Every table operation is executed as exactly one SQL statement on the server.
//! The functions here validate the inputs and render that statement.

use std::fmt;

use crate::error::TableResult;
use crate::utils::{
    normalize_statement, quote_name_if_needed, quote_names_if_needed, validate_identifier,
    validate_select,
};

/// The kind of table operation, used for statement rendering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOperation {
    CreateTable,
    CreateOrReplaceTable,
    DeleteTable,
    UpdateTable,
    InsertTable,
    DeleteFile,
    ListTables,
}

impl TableOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableOperation::CreateTable => "create table",
            TableOperation::CreateOrReplaceTable => "create or replace table",
            TableOperation::DeleteTable => "delete table",
            TableOperation::UpdateTable => "update table",
            TableOperation::InsertTable => "insert into table",
            TableOperation::DeleteFile => "delete file",
            TableOperation::ListTables => "list tables",
        }
    }
}

impl fmt::Display for TableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered SQL statement together with the operation it performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub operation: TableOperation,
    pub sql: String,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

fn qualified_name(integration: &str, name: &str) -> TableResult<String> {
    validate_identifier("table", name)?;
    validate_identifier("integration", integration)?;
    Ok(quote_names_if_needed(&[integration, name]))
}

pub fn create_table(name: &str, integration: &str, select: &str) -> TableResult<Statement> {
    let target = qualified_name(integration, name)?;
    let select = validate_select(select)?;
    Ok(Statement {
        operation: TableOperation::CreateTable,
        sql: format!("CREATE TABLE {target} ({select})"),
    })
}

pub fn create_or_replace_table(
    name: &str,
    integration: &str,
    select: &str,
) -> TableResult<Statement> {
    let target = qualified_name(integration, name)?;
    let select = validate_select(select)?;
    Ok(Statement {
        operation: TableOperation::CreateOrReplaceTable,
        sql: format!("CREATE OR REPLACE TABLE {target} ({select})"),
    })
}

pub fn delete_table(name: &str, integration: &str) -> TableResult<Statement> {
    let target = qualified_name(integration, name)?;
    Ok(Statement {
        operation: TableOperation::DeleteTable,
        sql: format!("DROP TABLE {target}"),
    })
}

/// The update query is passed through verbatim since it already names its target.
pub fn update_table(name: &str, integration: &str, update_query: &str) -> TableResult<Statement> {
    qualified_name(integration, name)?;
    let update_query = normalize_statement(update_query)?;
    Ok(Statement {
        operation: TableOperation::UpdateTable,
        sql: update_query.to_string(),
    })
}

pub fn insert_table(name: &str, integration: &str, select: &str) -> TableResult<Statement> {
    let target = qualified_name(integration, name)?;
    let select = validate_select(select)?;
    Ok(Statement {
        operation: TableOperation::InsertTable,
        sql: format!("INSERT INTO {target} ({select})"),
    })
}

pub fn delete_file(name: &str, files_integration: &str) -> TableResult<Statement> {
    validate_identifier("file", name)?;
    let target = qualified_name(files_integration, name)?;
    Ok(Statement {
        operation: TableOperation::DeleteFile,
        sql: format!("DROP TABLE {target}"),
    })
}

pub fn list_tables(integration: &str) -> TableResult<Statement> {
    validate_identifier("integration", integration)?;
    Ok(Statement {
        operation: TableOperation::ListTables,
        sql: format!("SHOW TABLES FROM {}", quote_name_if_needed(integration)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::TableError;

    #[test]
    fn test_create_statements() {
        let statement = create_table("sales", "my_integration", "SELECT * FROM raw.sales;").unwrap();
        assert_eq!(statement.operation, TableOperation::CreateTable);
        assert_eq!(
            statement.sql,
            "CREATE TABLE my_integration.sales (SELECT * FROM raw.sales)"
        );

        let statement =
            create_or_replace_table("q3 sales", "my_integration", "select 1 as x").unwrap();
        assert_eq!(
            statement.sql,
            "CREATE OR REPLACE TABLE my_integration.`q3 sales` (select 1 as x)"
        );
    }

    #[test]
    fn test_mutation_statements() {
        assert_eq!(
            delete_table("sales", "my_integration").unwrap().sql,
            "DROP TABLE my_integration.sales"
        );
        assert_eq!(
            update_table(
                "sales",
                "my_integration",
                " UPDATE my_integration.sales SET region = 'EU'; "
            )
            .unwrap()
            .sql,
            "UPDATE my_integration.sales SET region = 'EU'"
        );
        assert_eq!(
            insert_table("sales", "my_integration", "SELECT * FROM raw.new_sales")
                .unwrap()
                .sql,
            "INSERT INTO my_integration.sales (SELECT * FROM raw.new_sales)"
        );
        assert_eq!(
            delete_file("home-rentals", "files").unwrap().sql,
            "DROP TABLE files.`home-rentals`"
        );
        assert_eq!(
            list_tables("my-db").unwrap().sql,
            "SHOW TABLES FROM `my-db`"
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            create_table("", "my_integration", "SELECT 1"),
            Err(TableError::InvalidArgument(_))
        ));
        assert!(matches!(
            insert_table("sales", "", "SELECT 1"),
            Err(TableError::InvalidArgument(_))
        ));
        assert!(matches!(
            create_table("sales", "my_integration", "DROP TABLE raw.sales"),
            Err(TableError::InvalidStatement(_))
        ));
        assert!(matches!(
            update_table("sales", "my_integration", "   "),
            Err(TableError::InvalidStatement(_))
        ));
        assert!(matches!(
            delete_file(" ", "files"),
            Err(TableError::InvalidArgument(_))
        ));
    }
}
