use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{chat_messages, decode, http_client, non_empty, read_body, ChatMessage, GenerationBackend};
use crate::config::{BackendConfig, Provider};
use crate::error::{EngineError, Result};

/// DashScope text generation adapter (Qwen models).
pub struct DashScopeBackend {
    http: Client,
    api_key: String,
    api_base_url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    input: Input<'a>,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Input<'a> {
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct Parameters {
    result_format: &'static str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Deserialize)]
struct GenerationResponse {
    output: Output,
}

#[derive(Deserialize)]
struct Output {
    #[serde(default)]
    choices: Vec<Choice>,
    // Older text-format replies put the reply here instead of `choices`.
    text: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl DashScopeBackend {
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

impl GenerationBackend for DashScopeBackend {
    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let url = format!(
            "{}/services/aigc/text-generation/generation",
            self.api_base_url
        );
        let body = GenerationRequest {
            model: &self.model,
            input: Input {
                messages: chat_messages(prompt, system_prompt),
            },
            parameters: Parameters {
                result_format: "message",
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            },
        };

        tracing::debug!(model = %self.model, "sending DashScope request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let text = read_body(response, Provider::DashScope)?;
        let parsed: GenerationResponse = decode(&text, Provider::DashScope)?;

        let output = parsed.output;
        let content = match output.choices.into_iter().next() {
            Some(choice) => choice.message.content.unwrap_or_default(),
            None => output.text.ok_or_else(|| EngineError::LlmResponseFormat {
                provider: Provider::DashScope.to_string(),
                message: "response has no choices".into(),
            })?,
        };
        non_empty(content)
    }

    fn name(&self) -> &str {
        "dashscope"
    }
}
