use figment::providers::{Env, Format, Toml};
use figment::Figment;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// The environment variable prefix for configuration overrides.
/// Nested keys are separated by `__`, e.g. `TABULA__HTTP__BASE_URL`.
pub const CONFIG_ENV_PREFIX: &str = "TABULA__";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub sql: SqlConfig,
}

impl AppConfig {
    pub fn load() -> CommonResult<Self> {
        Self::extract(
            Self::defaults().admerge(
                Env::prefixed(CONFIG_ENV_PREFIX).map(|p| p.as_str().replace("__", ".").into()),
            ),
        )
    }

    /// Loads the configuration with the given TOML text merged over the defaults.
    /// Environment variables are not consulted.
    pub fn load_with_overrides(toml: &str) -> CommonResult<Self> {
        Self::extract(Self::defaults().admerge(Toml::string(toml)))
    }

    fn defaults() -> Figment {
        Figment::from(Toml::string(DEFAULT_CONFIG))
    }

    fn extract(figment: Figment) -> CommonResult<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| CommonError::InvalidArgument(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CommonResult<()> {
        if self.http.base_url.trim().is_empty() {
            return Err(CommonError::invalid("http.base_url must not be empty"));
        }
        if !self.http.login_path.starts_with('/') {
            return Err(CommonError::invalid(format!(
                "http.login_path must start with '/': {}",
                self.http.login_path
            )));
        }
        if self.sql.files_integration.trim().is_empty() {
            return Err(CommonError::invalid(
                "sql.files_integration must not be empty",
            ));
        }
        if self.auth.username.is_some() != self.auth.password.is_some() {
            return Err(CommonError::invalid(
                "auth.username and auth.password must be set together",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_retries: usize,
    pub login_path: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// An empty value means the server does not require a login.
    #[serde(deserialize_with = "deserialize_non_empty_string")]
    pub username: Option<String>,
    #[serde(deserialize_with = "deserialize_non_empty_secret")]
    pub password: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqlConfig {
    /// The default database sent as the statement context.
    pub database: String,
    pub files_integration: String,
}

pub fn deserialize_non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

pub fn deserialize_non_empty_secret<'de, D>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_non_empty_string(deserializer)?.map(SecretString::from))
}
