use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};
use tabula_table::error::{TableError, TableResult};
use tokio::sync::OnceCell;

use crate::models::{LoginRequest, LoginResponse};

/// The user name and password used to log in to the server.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// A login session shared by all clones of a client.
///
/// The login happens once, before the first request.
/// The server either sets a session cookie, which is kept by the cookie store
/// of the HTTP client, or returns a token to be sent as a bearer token.
#[derive(Debug)]
pub(crate) struct Session {
    credentials: Credentials,
    login_url: String,
    token: OnceCell<Option<String>>,
}

impl Session {
    pub fn new(credentials: Credentials, login_url: String) -> Self {
        Self {
            credentials,
            login_url,
            token: OnceCell::new(),
        }
    }

    pub async fn token(&self, client: &reqwest::Client) -> TableResult<Option<&str>> {
        let token = self
            .token
            .get_or_try_init(|| self.login(client))
            .await?;
        Ok(token.as_deref())
    }

    async fn login(&self, client: &reqwest::Client) -> TableResult<Option<String>> {
        debug!(
            "logging in as '{}' at {}",
            self.credentials.username, self.login_url
        );
        let request = LoginRequest {
            username: &self.credentials.username,
            password: self.credentials.password.expose_secret(),
        };
        let response = client
            .post(&self.login_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TableError::Transport(format!("failed to log in: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TableError::Transport(format!("failed to read login response: {e}")))?;
        if !status.is_success() {
            warn!("login failed: status={status}");
            return Err(TableError::Server {
                code: Some(i64::from(status.as_u16())),
                message: format!("login failed for user '{}'", self.credentials.username),
            });
        }
        parse_login_response(&body)
    }
}

/// Returns the bearer token in the body of a successful login, if any.
/// An empty body means the session is carried by a cookie.
fn parse_login_response(body: &str) -> TableResult<Option<String>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let response: LoginResponse = serde_json::from_str(body)
        .map_err(|e| TableError::Internal(format!("failed to parse login response: {e}")))?;
    Ok(response.token)
}
