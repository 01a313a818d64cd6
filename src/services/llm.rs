use crate::config::LlmSettings;
use crate::services::UpstreamError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for an OpenAI-compatible chat completions gateway
///
/// Used by both the query interpreter and the recommender. A client without an
/// API key still constructs; every call then fails with `ConfigurationMissing`.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

/// Per-call sampling parameters
#[derive(Debug, Clone, Copy)]
pub struct ChatParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            client,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, UpstreamError> {
        Self::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            settings.model.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one system + user exchange and return the assistant text.
    ///
    /// An empty or missing message content is reported as `MalformedResponse`.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        params: ChatParams,
    ) -> Result<String, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::ConfigurationMissing("llm"))?;

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Chat gateway returned {}: {}", status, body);
            return Err(UpstreamError::Status(format!("chat completion failed: {}", status)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::MalformedResponse(format!("chat completion body: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| UpstreamError::MalformedResponse("no content returned".into()))
    }
}
