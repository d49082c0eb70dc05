//! Application-wide error types.
//!
//! Request-scoped failures live next to the code that raises them
//! ([`crate::llm::ProviderError`], [`crate::gateway::QueryError`]); this enum
//! covers startup and server lifecycle failures that end the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
