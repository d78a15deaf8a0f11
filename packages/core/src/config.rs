//! Configuration constants and LLM backend configuration.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{EngineError, Result};

/// Age used when a learner has no saved profile.
pub const DEFAULT_AGE: u32 = 12;

/// Lexile level used when a learner has no saved profile.
pub const DEFAULT_LEXILE: u32 = 600;

/// Minimum word bank size before an article can be generated.
pub const MIN_WORDS: usize = 5;

/// Number of words shown verbatim in the article prompt.
///
/// The remainder is summarised by count to keep the prompt bounded.
pub const PROMPT_WORD_LIMIT: usize = 50;

/// Questions per generated test.
pub const NUM_QUESTIONS: usize = 5;

/// Required question composition per type.
pub const MULTIPLE_CHOICE_COUNT: usize = 2;
pub const FILL_BLANK_COUNT: usize = 2;
pub const TRUE_FALSE_COUNT: usize = 1;

/// Options per multiple choice question.
pub const NUM_OPTIONS: usize = 4;

/// Character floor enforced on the generated article.
pub const MIN_ARTICLE_CHARS: usize = 50;

/// Article length band requested from the model, in words.
pub const MIN_ARTICLE_WORDS: usize = 150;
pub const MAX_ARTICLE_WORDS: usize = 250;

/// Share of the word bank the article must use.
pub const WORD_USAGE_THRESHOLD: f64 = 0.8;

/// Total attempts per pipeline call (first try plus retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const MAX_SCORE: f64 = 100.0;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// HTTP timeout for a single backend call.
///
/// Generating an article plus questions regularly takes over a minute on
/// slower models.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Supported model providers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Provider {
    Anthropic,
    OpenAi,
    DashScope,
}

impl Provider {
    /// Parse a provider identifier, mapping unknown names to a configuration error.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name.trim()).map_err(|_| EngineError::UnsupportedProvider(name.into()))
    }

    /// Default API base URL.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::DashScope => "https://dashscope.aliyuncs.com/api/v1",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-5-20250929",
            Self::OpenAi => "gpt-4o-mini",
            Self::DashScope => "qwen-plus",
        }
    }
}

/// Configuration for a single generation backend.
///
/// NOTE: `Debug` is implemented by hand so the API key never ends up in logs.
#[derive(Clone)]
pub struct BackendConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    pub api_base_url: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| EngineError::Config("LLM_API_KEY not set".into()))?;

        let provider = match std::env::var("LLM_PROVIDER") {
            Ok(name) => Provider::parse(&name)?,
            Err(_) => Provider::Anthropic,
        };

        let mut builder = Self::builder(provider, api_key);

        if let Ok(model) = std::env::var("LLM_MODEL") {
            builder = builder.model(model);
        }
        if let Ok(url) = std::env::var("LLM_API_BASE_URL") {
            builder = builder.api_base_url(url);
        }
        if let Some(max_tokens) = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = std::env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            builder = builder.temperature(temperature);
        }
        if let Some(timeout_secs) = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            builder = builder.timeout_secs(timeout_secs);
        }

        Ok(builder.build())
    }

    /// Create a config builder with provider defaults.
    pub fn builder(provider: Provider, api_key: impl Into<String>) -> BackendConfigBuilder {
        BackendConfigBuilder {
            provider,
            model: provider.default_model().into(),
            api_key: api_key.into(),
            api_base_url: provider.default_base_url().into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Builder for [`BackendConfig`].
pub struct BackendConfigBuilder {
    provider: Provider,
    model: String,
    api_key: String,
    api_base_url: String,
    max_tokens: u32,
    temperature: Option<f64>,
    timeout_secs: u64,
}

impl BackendConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn build(self) -> BackendConfig {
        BackendConfig {
            provider: self.provider,
            model: self.model,
            api_key: self.api_key,
            api_base_url: self.api_base_url,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Credentials and model list for one provider in a user's API config.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub api_key: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("api_key", &"<redacted>")
            .field("models", &self.models)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Per-user provider credentials, keyed by provider identifier.
///
/// Serialised as a JSON object:
///
/// ```json
/// {"anthropic": {"api_key": "sk-ant-...", "models": ["claude-sonnet-4-5-20250929"]}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiConfig {
    providers: BTreeMap<String, ProviderEntry>,
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Configured provider identifiers, sorted.
    pub fn providers(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Models listed for `provider`, empty if unknown.
    pub fn models(&self, provider: &str) -> &[String] {
        self.providers
            .get(&provider.to_lowercase())
            .map(|entry| entry.models.as_slice())
            .unwrap_or_default()
    }

    pub fn entry(&self, provider: &str) -> Option<&ProviderEntry> {
        self.providers.get(&provider.to_lowercase())
    }

    /// Insert or replace the entry for `provider`.
    pub fn set(&mut self, provider: Provider, entry: ProviderEntry) {
        self.providers.insert(provider.to_string(), entry);
    }

    /// Resolve a backend config for `provider`, using `model` or the first listed model.
    pub fn backend_config(&self, provider: &str, model: Option<&str>) -> Result<BackendConfig> {
        let parsed = Provider::parse(provider)?;
        let entry = self
            .entry(parsed.as_ref())
            .filter(|entry| !entry.api_key.trim().is_empty())
            .ok_or_else(|| EngineError::Config(format!("API key not found for {parsed}")))?;

        let mut builder = BackendConfig::builder(parsed, entry.api_key.trim());
        if let Some(model) = model.or_else(|| entry.models.first().map(String::as_str)) {
            builder = builder.model(model);
        }
        if let Some(ref url) = entry.base_url {
            builder = builder.api_base_url(url.as_str());
        }
        Ok(builder.build())
    }
}
