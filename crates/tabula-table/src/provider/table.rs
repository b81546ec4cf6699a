use std::fmt;

use crate::error::TableResult;
use crate::provider::TableOperations;
use crate::utils::quote_names_if_needed;

/// A reference to a table in an integration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: String,
    pub integration: String,
}

impl Table {
    pub fn new(name: impl Into<String>, integration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            integration: integration.into(),
        }
    }

    /// The quoted name of the table qualified by its integration.
    pub fn qualified_name(&self) -> String {
        quote_names_if_needed(&[&self.integration, &self.name])
    }

    pub async fn update(&self, client: &dyn TableOperations, update_query: &str) -> TableResult<()> {
        client
            .update_table(&self.name, &self.integration, update_query)
            .await
    }

    pub async fn insert(&self, client: &dyn TableOperations, select: &str) -> TableResult<()> {
        client
            .insert_table(&self.name, &self.integration, select)
            .await
    }

    pub async fn delete(&self, client: &dyn TableOperations) -> TableResult<()> {
        client.delete_table(&self.name, &self.integration).await
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}
