//! Generation backends.
//!
//! A backend turns a user prompt (plus optional system prompt) into free text.
//! One adapter exists per provider; [`create_backend`] picks the adapter for a
//! [`BackendConfig`]. Adapters never retry: the attempt budget belongs to the
//! pipeline.

mod anthropic;
mod dashscope;
mod openai;

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::config::{BackendConfig, Provider};
use crate::error::{EngineError, Result};

pub use anthropic::AnthropicBackend;
pub use dashscope::DashScopeBackend;
pub use openai::OpenAiBackend;

/// User agent sent with every provider request.
const USER_AGENT: &str = concat!("readcoach/", env!("CARGO_PKG_VERSION"));

/// Rate-limit wait assumed when the provider sends no `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Trait for text generation backends, enabling mocking in tests.
pub trait GenerationBackend: Send + Sync {
    /// Send one prompt and return the raw reply text.
    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String>;

    /// Provider identifier used in log lines.
    fn name(&self) -> &str;
}

/// Create the adapter for `config.provider`.
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn GenerationBackend>> {
    if config.api_key.trim().is_empty() {
        return Err(EngineError::Config(format!(
            "API key not found for {}",
            config.provider
        )));
    }

    let backend: Box<dyn GenerationBackend> = match config.provider {
        Provider::Anthropic => Box::new(AnthropicBackend::new(config)?),
        Provider::OpenAi => Box::new(OpenAiBackend::new(config)?),
        Provider::DashScope => Box::new(DashScopeBackend::new(config)?),
    };
    tracing::debug!(provider = %config.provider, model = %config.model, "created backend");
    Ok(backend)
}

/// Create an adapter from a case-insensitive provider identifier.
pub fn create_backend_for(
    provider: &str,
    api_key: &str,
    model: Option<&str>,
) -> Result<Box<dyn GenerationBackend>> {
    let provider = Provider::parse(provider)?;
    let mut builder = BackendConfig::builder(provider, api_key);
    if let Some(model) = model {
        builder = builder.model(model);
    }
    create_backend(&builder.build())
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: Role,
    pub content: &'a str,
}

/// Chat messages for providers that carry the system prompt in-band.
pub(crate) fn chat_messages<'a>(
    prompt: &'a str,
    system_prompt: Option<&'a str>,
) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage {
            role: Role::System,
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: Role::User,
        content: prompt,
    });
    messages
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Map a provider response to its body text, or to a backend error.
pub(crate) fn read_body(response: Response, provider: Provider) -> Result<String> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        tracing::warn!(%provider, retry_after_secs, "LLM rate limited");
        return Err(EngineError::LlmRateLimited { retry_after_secs });
    }

    let body = response.text()?;

    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.map(|e| e.message).or(b.message))
            .unwrap_or(body);
        tracing::warn!(%provider, status, message = %message, "LLM API error");
        return Err(EngineError::LlmApiError { status, message });
    }

    Ok(body)
}

/// Decode a successful provider body into its response type.
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(body: &str, provider: Provider) -> Result<T> {
    serde_json::from_str(body).map_err(|e| EngineError::LlmResponseFormat {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

/// Reject blank replies.
pub(crate) fn non_empty(content: String) -> Result<String> {
    if content.trim().is_empty() {
        Err(EngineError::LlmEmptyResponse)
    } else {
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_messages_with_system() {
        let messages = chat_messages("hello", Some("be brief"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn test_chat_messages_without_system() {
        let messages = chat_messages("hello", None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn test_create_backend_per_provider() {
        for (provider, name) in [
            (Provider::Anthropic, "anthropic"),
            (Provider::OpenAi, "openai"),
            (Provider::DashScope, "dashscope"),
        ] {
            let config = BackendConfig::builder(provider, "key").build();
            let backend = create_backend(&config).expect("backend");
            assert_eq!(backend.name(), name);
        }
    }

    #[test]
    fn test_create_backend_for_unknown_provider() {
        let err = create_backend_for("bard", "key", None)
            .err()
            .expect("unknown provider");
        assert!(matches!(err, EngineError::UnsupportedProvider(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_create_backend_requires_key() {
        let err = create_backend_for("OpenAI", "  ", None)
            .err()
            .expect("missing key");
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_non_empty() {
        assert!(matches!(
            non_empty("   ".into()),
            Err(EngineError::LlmEmptyResponse)
        ));
        assert_eq!(non_empty("{}".into()).ok().as_deref(), Some("{}"));
    }
}
