use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use tabula_common::config::AppConfig;
use tabula_table::error::{TableError, TableResult};
use tabula_table::provider::{Table, TableOperations};
use tabula_table::statement::{self, Statement};
use tabula_table::utils::validate_identifier;

use crate::auth::{Credentials, Session};
use crate::executor::{classify_server_error, non_empty_or_status, SqlExecutor};
use crate::models::ErrorResponse;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:47334";
pub const DEFAULT_DATABASE: &str = "mindsdb";
pub const DEFAULT_FILES_INTEGRATION: &str = "files";
pub const DEFAULT_LOGIN_PATH: &str = "/api/login";

const FILES_PATH: &str = "/api/files";

/// Characters escaped in a path segment. Unreserved characters are kept as they are.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~');

/// A client that performs table operations by running SQL statements
/// on the server over HTTP.
///
/// Cloning the client is cheap. All clones share the connection pool
/// and the login session.
///
/// # Examples
///
/// ```rust,no_run
/// use tabula_table::provider::TableOperations;
/// use tabula_table_http::HttpTableClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpTableClient::builder()
///     .base_url("http://127.0.0.1:47334")
///     .build()?;
///
/// let table = client
///     .create_table("sales", "my_integration", "SELECT * FROM raw.sales")
///     .await?;
/// client.delete_table(&table.name, &table.integration).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTableClient {
    executor: SqlExecutor,
    files_integration: String,
}

impl HttpTableClient {
    pub fn builder() -> HttpTableClientBuilder {
        HttpTableClientBuilder::new()
    }

    pub fn try_from_config(config: &AppConfig) -> TableResult<Self> {
        let mut builder = Self::builder()
            .base_url(&config.http.base_url)
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .connect_timeout(Duration::from_secs(config.http.connect_timeout_secs))
            .max_retries(config.http.max_retries)
            .login_path(&config.http.login_path)
            .database(&config.sql.database)
            .files_integration(&config.sql.files_integration);
        if let (Some(username), Some(password)) = (&config.auth.username, &config.auth.password) {
            builder = builder.credentials(Credentials {
                username: username.clone(),
                password: SecretString::from(password.expose_secret().to_string()),
            });
        }
        builder.build()
    }

    pub fn executor(&self) -> &SqlExecutor {
        &self.executor
    }

    pub fn files_integration(&self) -> &str {
        &self.files_integration
    }

    /// Uploads a file to the files integration under the given name.
    /// The uploaded file can be queried as a table and removed with
    /// [`TableOperations::delete_file`].
    pub async fn upload_file(
        &self,
        name: &str,
        original_file_name: &str,
        content: Vec<u8>,
    ) -> TableResult<Table> {
        validate_identifier("file", name)?;
        validate_identifier("original file", original_file_name)?;
        let url = self.executor.url(&format!(
            "{FILES_PATH}/{}",
            utf8_percent_encode(name, PATH_SEGMENT)
        ));
        debug!("uploading file '{name}' ({} bytes)", content.len());
        let response = self
            .executor
            .send(|client| {
                let part = Part::bytes(content.clone()).file_name(original_file_name.to_string());
                let form = Form::new()
                    .text("original_file_name", original_file_name.to_string())
                    .part("file", part);
                client.put(&url).multipart(form)
            })
            .await?;
        let status = response.status();
        if status.is_success() {
            info!("uploaded file '{name}'");
            return Ok(Table::new(name, self.files_integration.as_str()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| TableError::Transport(format!("failed to read response: {e}")))?;
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(ErrorResponse::message)
            .unwrap_or_else(|| non_empty_or_status(body, status));
        warn!("failed to upload file '{name}': {message}");
        Err(classify_server_error(
            "file",
            Some(i64::from(status.as_u16())),
            message,
        ))
    }

    async fn run(&self, statement: Statement) -> TableResult<()> {
        self.executor.execute(&statement).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TableOperations for HttpTableClient {
    async fn create_table(
        &self,
        name: &str,
        integration: &str,
        select: &str,
    ) -> TableResult<Table> {
        self.run(statement::create_table(name, integration, select)?)
            .await?;
        Ok(Table::new(name, integration))
    }

    async fn create_or_replace_table(
        &self,
        name: &str,
        integration: &str,
        select: &str,
    ) -> TableResult<Table> {
        self.run(statement::create_or_replace_table(name, integration, select)?)
            .await?;
        Ok(Table::new(name, integration))
    }

    async fn delete_table(&self, name: &str, integration: &str) -> TableResult<()> {
        self.run(statement::delete_table(name, integration)?).await
    }

    async fn update_table(
        &self,
        name: &str,
        integration: &str,
        update_query: &str,
    ) -> TableResult<()> {
        self.run(statement::update_table(name, integration, update_query)?)
            .await
    }

    async fn insert_table(&self, name: &str, integration: &str, select: &str) -> TableResult<()> {
        self.run(statement::insert_table(name, integration, select)?)
            .await
    }

    async fn delete_file(&self, name: &str) -> TableResult<()> {
        self.run(statement::delete_file(name, &self.files_integration)?)
            .await
    }

    async fn list_tables(&self, integration: &str) -> TableResult<Vec<Table>> {
        let response = self
            .executor
            .execute(&statement::list_tables(integration)?)
            .await?;
        Ok(response
            .first_column()
            .into_iter()
            .map(|name| Table::new(name, integration))
            .collect())
    }
}

/// Builder for [`HttpTableClient`].
#[derive(Debug)]
pub struct HttpTableClientBuilder {
    base_url: String,
    timeout: Duration,
    connect_timeout: Duration,
    max_retries: usize,
    login_path: String,
    credentials: Option<Credentials>,
    database: String,
    files_integration: String,
}

impl Default for HttpTableClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTableClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 0,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            credentials: None,
            database: DEFAULT_DATABASE.to_string(),
            files_integration: DEFAULT_FILES_INTEGRATION.to_string(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The number of times a request is retried when the connection cannot be established.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// The database used as the context of SQL statements.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn files_integration(mut self, integration: impl Into<String>) -> Self {
        self.files_integration = integration.into();
        self
    }

    pub fn build(self) -> TableResult<HttpTableClient> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| TableError::InvalidArgument(format!("invalid base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TableError::InvalidArgument(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        validate_identifier("files integration", &self.files_integration)?;
        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| TableError::Internal(format!("failed to build HTTP client: {e}")))?;
        let session = self.credentials.map(|credentials| {
            Arc::new(Session::new(
                credentials,
                format!("{base_url}{}", self.login_path),
            ))
        });
        let executor = SqlExecutor::new(
            base_url,
            http_client,
            self.database,
            self.max_retries,
            session,
        );
        Ok(HttpTableClient {
            executor,
            files_integration: self.files_integration,
        })
    }
}
