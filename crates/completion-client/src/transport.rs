use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::ClientConfig;
use crate::error::{AttemptError, BuildError};
use crate::types::{ChatMessage, CompletionRequest, CompletionResponse};

// ─── Transport ────────────────────────────────────────────────────────────

/// Performs exactly one request to the completion endpoint.
///
/// Retrying is the caller's job (see [`crate::CompletionClient`]); keeping
/// the two apart lets the retry policy be exercised without a network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, messages: &[ChatMessage], max_tokens: u32)
        -> Result<String, AttemptError>;
}

// ─── HttpTransport ────────────────────────────────────────────────────────

/// reqwest-backed transport speaking the OpenAI chat-completions wire format.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    referer: Option<String>,
    title: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, api_key: impl Into<String>) -> Result<Self, BuildError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    /// Build a transport reading the API key from `config.api_key_env`.
    pub fn from_env(config: &ClientConfig) -> Result<Self, BuildError> {
        let key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| BuildError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, key)
    }

    fn classify(&self, err: reqwest::Error) -> AttemptError {
        if err.is_timeout() {
            AttemptError::Timeout(self.timeout)
        } else {
            AttemptError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, AttemptError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens,
        };

        let mut req = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(referer) = &self.referer {
            req = req.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            req = req.header("X-Title", title);
        }

        let response = req.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptError::RateLimited(text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AttemptError::Timeout(self.timeout)
            } else {
                AttemptError::MalformedResponse(e.to_string())
            }
        })?;

        parsed
            .into_text()
            .ok_or_else(|| AttemptError::MalformedResponse("no completion choice".into()))
    }
}
