use thiserror::Error;

pub type TableResult<T> = Result<T, TableError>;

/// The failure of a table operation.
///
/// All operations report failures through this single type.
/// The variant describes the cause as far as it is known to the client.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
    #[error("{0} already exists: {1}")]
    AlreadyExists(&'static str, String),
    #[error("invalid statement: {0}")]
    InvalidStatement(String),
    #[error("server error: {}", display_server_error(.code, .message))]
    Server { code: Option<i64>, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl TableError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TableError::NotFound(..))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, TableError::AlreadyExists(..))
    }
}

fn display_server_error(code: &Option<i64>, message: &str) -> String {
    match code {
        Some(code) => format!("{message} (code {code})"),
        None => message.to_string(),
    }
}
