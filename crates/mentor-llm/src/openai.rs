//! OpenAI-compatible `/chat/completions` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mentor_core::config::CompletionConfig;

use crate::client::{CompletionClient, WireMessage};
use crate::error::LlmError;
use crate::schema::{parse_structured, response_format, StructuredAnswer};

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    /// Build a client from configuration, reading the key from the
    /// environment variable the config names.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let mut client = Self::new(api_key)
            .with_base_url(&config.api_base)
            .with_model(&config.model)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature);
        if config.request_timeout_secs > 0 {
            client = client.with_timeout(Duration::from_secs(config.request_timeout_secs))?;
        }
        Ok(client)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
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

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Send one request and return the first choice's content.
    async fn request(
        &self,
        messages: &[WireMessage],
        response_format: Option<Value>,
    ) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_format,
        };

        tracing::debug!(
            model = %self.model,
            turns = messages.len(),
            structured = body.response_format.is_some(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(LlmError::Api { status, body });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(LlmError::Refusal(refusal));
        }

        message
            .content
            .ok_or_else(|| LlmError::InvalidResponse("response message has no content".to_string()))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete_text(&self, messages: &[WireMessage]) -> Result<String, LlmError> {
        let content = self.request(messages, None).await?;
        Ok(content.trim().to_string())
    }

    async fn complete_structured(
        &self,
        messages: &[WireMessage],
    ) -> Result<StructuredAnswer, LlmError> {
        let content = self.request(messages, Some(response_format())).await?;
        parse_structured(&content)
    }
}
