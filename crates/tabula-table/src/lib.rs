pub mod error;
pub mod provider;
pub mod statement;
pub mod utils;
