use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::errors::ModelError;
use crate::agent::prompt::Prompt;

pub const DEFAULT_MODEL: &str = "databricks-llama-4-maverick";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the model's reply text for `prompt`.
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError>;
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub timeout: Duration
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>
}

/// Client for any OpenAI-compatible `chat/completions` endpoint. Single request, no streaming.
pub struct ChatCompletionsClient {
    http: Client,
    url: String,
    settings: ModelSettings
}

impl ChatCompletionsClient {
    pub fn new(settings: ModelSettings) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|error| ModelError::Client(error.to_string()))?;

        Ok(Self {
            http,
            url: format!("{}/chat/completions", settings.endpoint.trim_end_matches('/')),
            settings
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user }
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature
        };

        debug!("Sending [{}] prompt chars to [{}]", prompt.system.len() + prompt.user.len(), self.url);

        let mut request = self.http.post(&self.url).json(&body);

        if let Some(api_key) = &self.settings.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()
            .await
            .map_err(|source| ModelError::Unreachable { endpoint: self.url.clone(), source })?;

        let status = response.status();
        let text = response.text()
            .await
            .map_err(|source| ModelError::Unreachable { endpoint: self.url.clone(), source })?;

        if !status.is_success() {
            return Err(ModelError::Status {
                endpoint: self.url.clone(),
                status: status.as_u16(),
                message: text.chars().take(512).collect()
            });
        }

        extract_content(&self.url, &text)
    }
}

pub(crate) fn extract_content(endpoint: &str, body: &str) -> Result<String, ModelError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|error| ModelError::malformed(endpoint, error))?;

    let content = response.choices.into_iter()
        .next()
        .ok_or_else(|| ModelError::malformed(endpoint, "response has no choices"))?
        .message
        .and_then(|message| message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(ModelError::Empty { endpoint: endpoint.to_string() });
    }

    Ok(content)
}
