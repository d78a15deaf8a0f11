//! Error types for the file store.

use std::path::PathBuf;

use readcoach_core::EngineError;
use thiserror::Error;

/// Main error type for the file store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// User names become directory names, so path syntax is rejected.
    #[error("Invalid user name: '{0}'. Use letters, digits, '-', '_' or '.' (not leading)")]
    InvalidUserName(String),

    #[error("User not found: '{0}'")]
    UserNotFound(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Storage(Box::new(err))
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use readcoach_core::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = StoreError::InvalidUserName("../etc".to_string());
        assert!(err.to_string().contains("../etc"));
    }

    #[test]
    fn test_converts_to_storage_error() {
        let err: EngineError = StoreError::UserNotFound("alice".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "storage error: User not found: 'alice'");
    }
}
