//! SQL statement execution over HTTP.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::{RequestBuilder, Response, StatusCode};
use tabula_table::error::{TableError, TableResult};
use tabula_table::statement::{Statement, TableOperation};

use crate::auth::Session;
use crate::models::{QueryContext, QueryRequest, QueryResponse, ResponseKind};

const SQL_QUERY_PATH: &str = "/api/sql/query";
const RETRY_BACKOFF: Duration = Duration::from_millis(100);
const STATEMENT_PREVIEW_LENGTH: usize = 80;

/// Sends SQL statements to the server and interprets the responses.
#[derive(Debug, Clone)]
pub struct SqlExecutor {
    base_url: String,
    http_client: reqwest::Client,
    database: String,
    max_retries: usize,
    session: Option<Arc<Session>>,
}

impl SqlExecutor {
    pub(crate) fn new(
        base_url: String,
        http_client: reqwest::Client,
        database: String,
        max_retries: usize,
        session: Option<Arc<Session>>,
    ) -> Self {
        Self {
            base_url,
            http_client,
            database,
            max_retries,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Executes the statement and returns the response of the server.
    /// A response of the error kind is returned as an error.
    pub async fn execute(&self, statement: &Statement) -> TableResult<QueryResponse> {
        let request = QueryRequest {
            query: &statement.sql,
            context: QueryContext { db: &self.database },
        };
        debug!(
            "executing {}: \"{}\"",
            statement.operation,
            preview(&statement.sql)
        );
        let start = Instant::now();
        let url = self.url(SQL_QUERY_PATH);
        let response = self
            .send(|client| client.post(&url).json(&request))
            .await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TableError::Transport(format!("failed to read response: {e}")))?;
        debug!(
            "{} finished: status={} duration_ms={}",
            statement.operation,
            status,
            start.elapsed().as_millis()
        );

        let parsed = serde_json::from_str::<QueryResponse>(&body);
        match parsed {
            Ok(response) if status.is_success() && response.kind != ResponseKind::Error => {
                Ok(response)
            }
            Ok(response) => {
                let code = response
                    .error_code
                    .or_else(|| (!status.is_success()).then(|| i64::from(status.as_u16())));
                let message = response
                    .error_message
                    .unwrap_or_else(|| format!("request failed with status {status}"));
                warn!("{} failed: {message}", statement.operation);
                Err(classify_server_error(
                    object_kind(statement.operation),
                    code,
                    message,
                ))
            }
            Err(_) if !status.is_success() => {
                warn!("{} failed: status={status}", statement.operation);
                Err(classify_server_error(
                    object_kind(statement.operation),
                    Some(i64::from(status.as_u16())),
                    non_empty_or_status(body, status),
                ))
            }
            Err(e) => Err(TableError::Internal(format!(
                "failed to parse response of {}: {e}",
                statement.operation
            ))),
        }
    }

    /// Sends a request built by `build`, logging in first if needed.
    /// The request is retried only if the connection could not be established,
    /// so a statement is never submitted twice.
    pub(crate) async fn send<F>(&self, build: F) -> TableResult<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = match &self.session {
            Some(session) => session.token(&self.http_client).await?,
            None => None,
        };
        let mut retries = 0;
        loop {
            let mut request = build(&self.http_client);
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && retries < self.max_retries => {
                    retries += 1;
                    warn!(
                        "connection failed (attempt {}/{}): {e}",
                        retries,
                        self.max_retries + 1
                    );
                    tokio::time::sleep(RETRY_BACKOFF * retries as u32).await;
                }
                Err(e) => {
                    warn!("request failed: {e}");
                    return Err(TableError::Transport(e.to_string()));
                }
            }
        }
    }
}

/// The kind of object an operation fails on when the server reports it as missing.
fn object_kind(operation: TableOperation) -> &'static str {
    match operation {
        TableOperation::DeleteFile => "file",
        TableOperation::ListTables => "integration",
        _ => "table",
    }
}

fn preview(sql: &str) -> String {
    let sql = sql.replace('\n', " ");
    match sql.char_indices().nth(STATEMENT_PREVIEW_LENGTH) {
        Some((index, _)) => format!("{}...", &sql[..index]),
        None => sql,
    }
}

pub(crate) fn non_empty_or_status(body: String, status: StatusCode) -> String {
    if body.trim().is_empty() {
        format!("request failed with status {status}")
    } else {
        body
    }
}

/// Maps an error message of the server to the most specific error variant.
/// The server reports all failures with free-form messages, so the mapping
/// is based on the wording of the message.
///
/// The wording does not say which object is missing. A missing source table
/// in a SELECT, or a missing column in an UPDATE, is reported as `NotFound`
/// of `kind` as well. The server message is kept verbatim and is the only
/// way to tell these cases apart.
pub(crate) fn classify_server_error(
    kind: &'static str,
    code: Option<i64>,
    message: String,
) -> TableError {
    let lower = message.to_lowercase();
    if lower.contains("already exists") {
        TableError::AlreadyExists(kind, message)
    } else if lower.contains("does not exist")
        || lower.contains("doesn't exist")
        || lower.contains("not found")
        || lower.contains("unknown table")
        || lower.contains("unknown database")
    {
        let names_integration = lower.contains("database") || lower.contains("integration");
        let kind = if kind == "table" && names_integration && !lower.contains("table") {
            "integration"
        } else {
            kind
        };
        TableError::NotFound(kind, message)
    } else if lower.contains("syntax") || lower.contains("parse") {
        TableError::InvalidStatement(message)
    } else {
        TableError::Server { code, message }
    }
}
