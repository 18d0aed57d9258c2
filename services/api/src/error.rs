//! services/api/src/error.rs
//!
//! Failures that can stop the `api` binary before or while it serves.
//! Per-request failures never reach this type; handlers map `FlowError`
//! to a status code themselves.

use crate::config::ConfigError;
use medha_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required variable was missing or unparsable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An adapter could not be constructed (e.g. the HTTP client for image search).
    #[error("adapter setup failed: {0}")]
    Port(#[from] PortError),

    #[error("database unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Binding the listener or serving connections.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Bad values discovered while wiring adapters (voice name, CORS origin).
    #[error("startup: {0}")]
    Internal(String),
}
