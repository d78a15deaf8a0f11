//! Error types for the command-line interface.

use readcoach_core::EngineError;
use readcoach_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User '{0}' does not exist. Create it with `readcoach create-user {0}`")]
    UserNotFound(String),

    #[error("No API configured for user '{0}'. Add one with `readcoach api set {0} <provider> --key <key>`")]
    NoApiConfig(String),

    #[error("Test #{index} not found, user has {count} saved test(s)")]
    LogNotFound { index: usize, count: usize },
}

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
