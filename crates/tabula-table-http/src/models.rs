use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub query: &'a str,
    pub context: QueryContext<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryContext<'a> {
    pub db: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// The body of a successful login.
/// Older servers only set a session cookie and return an empty object.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Ok,
    Table,
    Error,
}

/// The result of a SQL statement executed by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    #[serde(default)]
    pub column_names: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl QueryResponse {
    /// Returns the string values of the first column.
    /// Rows whose first value is not a string are skipped.
    pub fn first_column(&self) -> Vec<String> {
        self.data
            .iter()
            .filter_map(|row| row.first())
            .filter_map(|value| value.as_str())
            .map(|s| s.to_string())
            .collect()
    }
}

/// The error body of non-SQL endpoints such as file uploads.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn message(self) -> Option<String> {
        match (self.title, self.detail) {
            (Some(title), Some(detail)) => Some(format!("{title}: {detail}")),
            (title, detail) => detail.or(title),
        }
    }
}
