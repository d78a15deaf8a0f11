use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{chat_messages, decode, http_client, non_empty, read_body, ChatMessage, GenerationBackend};
use crate::config::{BackendConfig, Provider};
use crate::error::{EngineError, Result};

/// OpenAI chat completions adapter.
///
/// Also works against OpenAI-compatible servers through `api_base_url`.
pub struct OpenAiBackend {
    http: Client,
    api_key: String,
    api_base_url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(config.timeout_secs)?,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

impl GenerationBackend for OpenAiBackend {
    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages: chat_messages(prompt, system_prompt),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, "sending OpenAI request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let text = read_body(response, Provider::OpenAi)?;
        let parsed: CompletionResponse = decode(&text, Provider::OpenAi)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::LlmResponseFormat {
                provider: Provider::OpenAi.to_string(),
                message: "response has no choices".into(),
            })?
            .message
            .content
            .unwrap_or_default();
        non_empty(content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
