use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{decode, http_client, non_empty, read_body, ChatMessage, GenerationBackend, Role};
use crate::config::{BackendConfig, Provider};
use crate::error::Result;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API adapter.
///
/// NOTE: Do NOT derive `Debug` on this struct, `api_key` would be exposed.
pub struct AnthropicBackend {
    http: Client,
    api_key: String,
    api_base_url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl AnthropicBackend {
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

impl GenerationBackend for AnthropicBackend {
    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let url = format!("{}/v1/messages", self.api_base_url);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system_prompt,
            messages: [ChatMessage {
                role: Role::User,
                content: prompt,
            }],
        };

        tracing::debug!(model = %self.model, "sending Anthropic request");
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()?;

        let text = read_body(response, Provider::Anthropic)?;
        let parsed: MessagesResponse = decode(&text, Provider::Anthropic)?;

        let content = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        non_empty(content)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
