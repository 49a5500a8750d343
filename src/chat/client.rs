use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::models::{Completion, LlmMessage, RequestBody};
use super::response::parse_completion;
use crate::config::LlmConfig;
use crate::error::{Result, SmartCustomError};

/// The language-model backend the orchestrator talks to.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// `tools` are function definitions in the OpenAI format; empty means none offered.
    async fn complete(&self, messages: &[LlmMessage], tools: &[Value]) -> Result<Completion>;
}

/// Non-streaming client for OpenAI-compatible chat-completions endpoints.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            SmartCustomError::Config(
                "No API key configured (set SMARTCUSTOM_API_KEY or OPENROUTER_API_KEY)".to_string(),
            )
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                SmartCustomError::Config(format!("Invalid authorization header: {}", e))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[LlmMessage], tools: &[Value]) -> Result<Completion> {
        let body = RequestBody {
            model: &self.model,
            messages,
            stream: false,
            tools: (!tools.is_empty()).then_some(tools),
        };

        debug!(model = %self.model, messages = messages.len(), tools = tools.len(), "Sending chat completion");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SmartCustomError::Timeout
                } else {
                    SmartCustomError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SmartCustomError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = response.json().await?;
        parse_completion(&json)
    }
}
