mod table;

pub use table::*;

use crate::error::{TableError, TableResult};
use crate::utils::validate_identifier;

/// A trait that defines the table operations supported by a client of the remote database.
/// Tables live in *integrations*, which are named data sources connected to the server.
/// Uploaded files live in a dedicated files integration and are addressed by name alone.
///
/// Each operation is executed as a single statement on the server.
/// An operation either takes effect as a whole or returns an error.
/// No ordering is guaranteed between concurrent calls on the same table.
#[async_trait::async_trait]
pub trait TableOperations: Send + Sync {
    /// Creates a table in an integration from the given SELECT statement.
    /// The result schema of the statement becomes the schema of the table.
    /// Fails if the table already exists.
    async fn create_table(&self, name: &str, integration: &str, select: &str)
        -> TableResult<Table>;

    /// Creates a table in an integration from the given SELECT statement.
    /// If the table already exists, it is dropped first and then recreated.
    async fn create_or_replace_table(
        &self,
        name: &str,
        integration: &str,
        select: &str,
    ) -> TableResult<Table>;

    /// Deletes a table from its integration.
    async fn delete_table(&self, name: &str, integration: &str) -> TableResult<()>;

    /// Updates a table in its integration by running the given SQL UPDATE statement.
    async fn update_table(
        &self,
        name: &str,
        integration: &str,
        update_query: &str,
    ) -> TableResult<()>;

    /// Appends the rows of the given SELECT statement to a table.
    async fn insert_table(&self, name: &str, integration: &str, select: &str) -> TableResult<()>;

    /// Deletes an uploaded file from the files integration.
    async fn delete_file(&self, name: &str) -> TableResult<()>;

    /// Removes a table from its integration.
    /// This is the same operation as [`TableOperations::delete_table`].
    async fn remove_table(&self, name: &str, integration: &str) -> TableResult<()> {
        self.delete_table(name, integration).await
    }

    /// Lists the tables in an integration.
    async fn list_tables(&self, integration: &str) -> TableResult<Vec<Table>>;

    /// Gets a table in an integration.
    async fn get_table(&self, name: &str, integration: &str) -> TableResult<Table> {
        validate_identifier("table", name)?;
        validate_identifier("integration", integration)?;
        self.list_tables(integration)
            .await?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TableError::NotFound("table", name.to_string()))
    }
}
