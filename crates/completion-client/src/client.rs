use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::backend::CompletionBackend;
use crate::error::CompletionError;
use crate::types::{ApiErrorBody, ChatRequest, ChatResponse};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const UNKNOWN_PROVIDER_ERROR: &str = "Erro desconhecido";

/// Connection settings for [`CompletionClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for an OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl CompletionClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("leadflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and return the decoded response.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        if status.is_success() {
            return res
                .json::<ChatResponse>()
                .await
                .map_err(|e| CompletionError::Decode(e.to_string()));
        }

        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.to_string());

        tracing::debug!(status = status.as_u16(), %message, "completion provider returned an error");
        Err(CompletionError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let response = self.send(request).await?;
        Ok(response.content().to_string())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Transport(e.to_string())
    }
}
