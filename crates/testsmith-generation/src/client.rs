//! HTTP clients for the supported providers.
//!
//! - OpenAI-compatible completions: `{model, prompt, ...}` -> `choices[0].text`
//! - OpenRouter / chat completions: `{model, messages, ...}` -> `choices[0].message.content`
//! - Ollama: `{model, prompt, stream: false, options}` -> `response`

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use testsmith_core::settings::{AiSettings, Provider};
use tracing::{debug, trace, warn};

use crate::backend::GenerationBackend;
use crate::cleanup::clean_response;
use crate::error::{GenerationError, Result};

/// Default request timeout. Local models can be slow.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection parameters for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl GenerationConfig {
    /// Creates a config with default sampling parameters.
    pub fn new(provider: Provider, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            endpoint: endpoint.into(),
            api_key: None,
            model: model.into(),
            max_tokens: 4096,
            temperature: 0.2,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds a config from the `[ai]` settings section.
    pub fn from_settings(settings: &AiSettings) -> Result<Self> {
        let endpoint = settings.resolved_endpoint().ok_or_else(|| {
            GenerationError::Configuration(format!("no endpoint configured for {}", settings.provider))
        })?;
        Ok(Self::new(settings.provider, endpoint, settings.model.clone())
            .with_api_key(settings.api_key.clone())
            .with_max_tokens(settings.max_tokens)
            .with_temperature(settings.temperature))
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Generation backend over HTTP.
#[derive(Clone)]
pub struct HttpGenerationClient {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl HttpGenerationClient {
    /// Creates a client for `config`.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Sends `prompt` and returns the raw text of the first choice.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let body = request_body(&self.config, prompt)?;
        trace!(provider = %self.config.provider, "Sending generation request: {}", body);

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }
        if self.config.provider == Provider::OpenRouter {
            request = request.header("X-Title", "testsmith");
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        let text = extract_text(self.config.provider, &json)?;
        debug!(
            provider = %self.config.provider,
            chars = text.len(),
            "Generation response received"
        );
        Ok(text)
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationClient {
    async fn generate(&self, prompt: &str) -> String {
        match self.complete(prompt).await {
            Ok(text) => clean_response(&text),
            Err(e) => {
                warn!(provider = %self.config.provider, error = %e, "Generation request failed");
                String::new()
            }
        }
    }
}

fn request_body(config: &GenerationConfig, prompt: &str) -> Result<Value> {
    let value = match config.provider {
        Provider::OpenAi => serde_json::to_value(CompletionRequest {
            model: &config.model,
            prompt,
            stream: false,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }),
        Provider::OpenRouter => serde_json::to_value(ChatRequest {
            model: &config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }),
        Provider::Ollama => serde_json::to_value(OllamaRequest {
            model: &config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            },
        }),
    };
    value.map_err(|e| GenerationError::InvalidResponse(format!("failed to encode request: {}", e)))
}

fn extract_text(provider: Provider, json: &Value) -> Result<String> {
    let text = match provider {
        Provider::OpenAi => json.pointer("/choices/0/text"),
        Provider::OpenRouter => json.pointer("/choices/0/message/content"),
        Provider::Ollama => json.get("response"),
    };
    text.and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GenerationError::InvalidResponse(format!("no text in {} response", provider)))
}
