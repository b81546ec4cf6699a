use std::collections::{btree_map, BTreeMap};

use dashmap::mapref::one::{Ref, RefMut};
use dashmap::{DashMap, Entry};
use tabula_table::error::{TableError, TableResult};
use tabula_table::provider::{Table, TableOperations};
use tabula_table::utils::{normalize_statement, validate_identifier, validate_select};

pub const DEFAULT_FILES_INTEGRATION: &str = "files";

/// What the provider remembers about a table.
/// Statements are stored in normalized form, without trailing semicolons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryTableDefinition {
    /// The SELECT statement the table was created from.
    /// This is [`None`] for uploaded files.
    pub select: Option<String>,
    pub updates: Vec<String>,
    pub inserts: Vec<String>,
}

#[derive(Default)]
struct MemoryIntegration {
    tables: BTreeMap<String, MemoryTableDefinition>,
}

/// An in-memory implementation of [`TableOperations`].
///
/// Statements are checked for their leading keyword but are not executed.
pub struct MemoryTableProvider {
    files_integration: String,
    integrations: DashMap<String, MemoryIntegration>,
}

impl MemoryTableProvider {
    pub fn new<I, S>(integrations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_files_integration(DEFAULT_FILES_INTEGRATION, integrations)
    }

    pub fn with_files_integration<I, S>(files_integration: impl Into<String>, integrations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files_integration = files_integration.into();
        let map = DashMap::new();
        map.insert(files_integration.clone(), MemoryIntegration::default());
        for integration in integrations {
            map.insert(integration.into(), MemoryIntegration::default());
        }
        Self {
            files_integration,
            integrations: map,
        }
    }

    pub fn files_integration(&self) -> &str {
        &self.files_integration
    }

    /// Adds an integration. Adding an existing integration keeps its tables.
    pub fn add_integration(&self, integration: &str) -> TableResult<()> {
        validate_identifier("integration", integration)?;
        self.integrations
            .entry(integration.to_string())
            .or_default();
        Ok(())
    }

    /// Removes an integration together with all its tables.
    /// The files integration cannot be removed.
    pub fn remove_integration(&self, integration: &str) -> TableResult<()> {
        if integration == self.files_integration {
            return Err(TableError::InvalidArgument(format!(
                "cannot remove the files integration: {integration}"
            )));
        }
        match self.integrations.entry(integration.to_string()) {
            Entry::Occupied(entry) => {
                entry.remove();
                Ok(())
            }
            Entry::Vacant(_) => Err(TableError::NotFound(
                "integration",
                integration.to_string(),
            )),
        }
    }

    /// Adds a file to the files integration, replacing any file with the same name.
    pub fn upload_file(&self, name: &str) -> TableResult<Table> {
        validate_identifier("file", name)?;
        let mut files = self
            .integrations
            .get_mut(&self.files_integration)
            .ok_or_else(|| {
                TableError::Internal(format!(
                    "files integration is missing: {}",
                    self.files_integration
                ))
            })?;
        files
            .tables
            .insert(name.to_string(), MemoryTableDefinition::default());
        Ok(Table::new(name, self.files_integration.as_str()))
    }

    pub fn table_definition(
        &self,
        name: &str,
        integration: &str,
    ) -> TableResult<MemoryTableDefinition> {
        let db = self.get_integration(integration)?;
        db.tables
            .get(name)
            .cloned()
            .ok_or_else(|| TableError::NotFound("table", name.to_string()))
    }

    fn get_integration(
        &self,
        integration: &str,
    ) -> TableResult<Ref<'_, String, MemoryIntegration>> {
        self.integrations
            .get(integration)
            .ok_or_else(|| TableError::NotFound("integration", integration.to_string()))
    }

    fn get_integration_mut(
        &self,
        integration: &str,
    ) -> TableResult<RefMut<'_, String, MemoryIntegration>> {
        self.integrations
            .get_mut(integration)
            .ok_or_else(|| TableError::NotFound("integration", integration.to_string()))
    }

    fn create(
        &self,
        name: &str,
        integration: &str,
        select: &str,
        replace: bool,
    ) -> TableResult<Table> {
        validate_identifier("table", name)?;
        validate_identifier("integration", integration)?;
        let select = validate_select(select)?;
        let mut db = self.get_integration_mut(integration)?;
        let definition = MemoryTableDefinition {
            select: Some(select.to_string()),
            ..Default::default()
        };
        match db.tables.entry(name.to_string()) {
            btree_map::Entry::Occupied(mut entry) => {
                if replace {
                    entry.insert(definition);
                } else {
                    return Err(TableError::AlreadyExists("table", name.to_string()));
                }
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(definition);
            }
        }
        Ok(Table::new(name, integration))
    }

    fn drop_table(&self, kind: &'static str, name: &str, integration: &str) -> TableResult<()> {
        validate_identifier(kind, name)?;
        validate_identifier("integration", integration)?;
        let mut db = self.get_integration_mut(integration)?;
        if db.tables.remove(name).is_some() {
            Ok(())
        } else {
            Err(TableError::NotFound(kind, name.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl TableOperations for MemoryTableProvider {
    async fn create_table(
        &self,
        name: &str,
        integration: &str,
        select: &str,
    ) -> TableResult<Table> {
        self.create(name, integration, select, false)
    }

    async fn create_or_replace_table(
        &self,
        name: &str,
        integration: &str,
        select: &str,
    ) -> TableResult<Table> {
        self.create(name, integration, select, true)
    }

    async fn delete_table(&self, name: &str, integration: &str) -> TableResult<()> {
        self.drop_table("table", name, integration)
    }

    async fn update_table(
        &self,
        name: &str,
        integration: &str,
        update_query: &str,
    ) -> TableResult<()> {
        validate_identifier("table", name)?;
        validate_identifier("integration", integration)?;
        let update_query = normalize_statement(update_query)?;
        let mut db = self.get_integration_mut(integration)?;
        let table = db
            .tables
            .get_mut(name)
            .ok_or_else(|| TableError::NotFound("table", name.to_string()))?;
        table.updates.push(update_query.to_string());
        Ok(())
    }

    async fn insert_table(&self, name: &str, integration: &str, select: &str) -> TableResult<()> {
        validate_identifier("table", name)?;
        validate_identifier("integration", integration)?;
        let select = validate_select(select)?;
        let mut db = self.get_integration_mut(integration)?;
        let table = db
            .tables
            .get_mut(name)
            .ok_or_else(|| TableError::NotFound("table", name.to_string()))?;
        table.inserts.push(select.to_string());
        Ok(())
    }

    async fn delete_file(&self, name: &str) -> TableResult<()> {
        self.drop_table("file", name, &self.files_integration)
    }

    async fn list_tables(&self, integration: &str) -> TableResult<Vec<Table>> {
        validate_identifier("integration", integration)?;
        let db = self.get_integration(integration)?;
        Ok(db
            .tables
            .keys()
            .map(|name| Table::new(name.as_str(), integration))
            .collect())
    }

    async fn get_table(&self, name: &str, integration: &str) -> TableResult<Table> {
        validate_identifier("table", name)?;
        validate_identifier("integration", integration)?;
        let db = self.get_integration(integration)?;
        if db.tables.contains_key(name) {
            Ok(Table::new(name, integration))
        } else {
            Err(TableError::NotFound("table", name.to_string()))
        }
    }
}
