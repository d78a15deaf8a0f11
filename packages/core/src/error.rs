//! Error types for the reading coach core.
//!
//! Every variant belongs to one [`ErrorKind`]. The generation pipeline retries
//! the backend, parse and schema kinds internally; configuration and storage
//! errors are surfaced to the caller straight away.

use thiserror::Error;

/// Coarse classification used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport, authentication, rate limit or malformed provider reply.
    Backend,
    /// The reply contained no recoverable JSON payload.
    Parse,
    /// The payload parsed but failed the required-shape checks.
    Schema,
    /// Missing credentials, unsupported provider, bad input. Never retried.
    Configuration,
    /// Persistence backend failure. Never retried.
    Storage,
}

/// Failure to recover a JSON payload from model output.
///
/// Keeps the raw text so callers can log what the model actually said.
#[derive(Debug, Clone, Error)]
#[error("no JSON payload found in model response ({reason})")]
pub struct ParseFailure {
    pub reason: String,
    pub raw: String,
}

/// Main error type for core operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// HTTP request to the provider failed before a status was received.
    #[error("LLM API request failed: {0}")]
    LlmApiRequest(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("LLM API error (status {status}): {message}")]
    LlmApiError { status: u16, message: String },

    /// Provider asked us to slow down.
    #[error("LLM rate limited, retry after {retry_after_secs}s")]
    LlmRateLimited { retry_after_secs: u64 },

    /// Provider reply did not have the documented shape.
    #[error("malformed LLM response from {provider}: {message}")]
    LlmResponseFormat { provider: String, message: String },

    #[error("LLM returned empty response")]
    LlmEmptyResponse,

    #[error(transparent)]
    ResponseParse(#[from] ParseFailure),

    #[error("schema validation failed: {}", errors.join(", "))]
    SchemaViolation { errors: Vec<String> },

    /// A bundled JSON schema could not be compiled.
    #[error("schema load error: {0}")]
    SchemaLoad(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported provider: '{0}'. Expected one of: anthropic, openai, dashscope")]
    UnsupportedProvider(String),

    #[error("word bank has {found} words, at least {required} are needed")]
    InsufficientWords { found: usize, required: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No generated test is waiting for answers in the session.
    #[error("no active test, generate content first")]
    NoActiveTest,

    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl EngineError {
    /// Classify this error for the retry policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LlmApiRequest(_)
            | Self::LlmApiError { .. }
            | Self::LlmRateLimited { .. }
            | Self::LlmResponseFormat { .. }
            | Self::LlmEmptyResponse => ErrorKind::Backend,
            Self::ResponseParse(_) => ErrorKind::Parse,
            Self::SchemaViolation { .. } => ErrorKind::Schema,
            Self::SchemaLoad(_)
            | Self::Config(_)
            | Self::UnsupportedProvider(_)
            | Self::InsufficientWords { .. }
            | Self::InvalidInput(_)
            | Self::NoActiveTest => ErrorKind::Configuration,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Backend | ErrorKind::Parse | ErrorKind::Schema
        )
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InsufficientWords {
            found: 3,
            required: 5,
        };
        assert_eq!(
            err.to_string(),
            "word bank has 3 words, at least 5 are needed"
        );

        let err = EngineError::SchemaViolation {
            errors: vec!["missing article".into(), "bad score".into()],
        };
        assert_eq!(
            err.to_string(),
            "schema validation failed: missing article, bad score"
        );
    }

    #[test]
    fn test_parse_failure_keeps_raw_text() {
        let err: EngineError = ParseFailure {
            reason: "no braces".into(),
            raw: "I cannot help with that".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Parse);
        if let EngineError::ResponseParse(failure) = err {
            assert_eq!(failure.raw, "I cannot help with that");
        }
    }

    #[test]
    fn test_retry_classification() {
        assert!(EngineError::LlmEmptyResponse.is_retryable());
        assert!(EngineError::LlmRateLimited {
            retry_after_secs: 10
        }
        .is_retryable());
        assert!(EngineError::SchemaViolation { errors: vec![] }.is_retryable());
        assert!(!EngineError::Config("missing key".into()).is_retryable());
        assert!(!EngineError::UnsupportedProvider("bard".into()).is_retryable());
        assert!(!EngineError::InsufficientWords {
            found: 0,
            required: 5
        }
        .is_retryable());
        assert_eq!(
            EngineError::Storage("disk full".into()).kind(),
            ErrorKind::Storage
        );
    }
}
