mod auth;
mod executor;
mod models;
mod provider;

pub use auth::Credentials;
pub use executor::SqlExecutor;
pub use models::{QueryResponse, ResponseKind};
pub use provider::*;
