//! Chat-completion client.
//!
//! One POST to `{base_url}/chat/completions` with bearer authentication.
//! Non-2xx responses come back as [`OrchestratorError::UpstreamCall`]
//! values, never panics; callers decide whether a failed completion is
//! fatal for their response.

use serde_json::json;
use std::time::Duration;

use crate::config::ChatConfig;
use crate::error::OrchestratorError;

pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: &ChatConfig) -> Result<Self, OrchestratorError> {
        let model = config.model.clone().ok_or_else(|| {
            OrchestratorError::UpstreamCall("chat.model is not configured".to_string())
        })?;
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| {
                OrchestratorError::UpstreamCall("chat.base_url is not configured".to_string())
            })?
            .trim_end_matches('/')
            .to_string();
        let api_key = config.api_key.clone().unwrap_or_default();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OrchestratorError::UpstreamCall(format!("chat client: {e}")))?;

        Ok(Self {
            base_url,
            api_key,
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            client,
        })
    }

    /// Send one user message and return the model's reply text.
    pub async fn complete(&self, message: &str) -> Result<String, OrchestratorError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "messages": [
                {"role": "user", "content": message}
            ],
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "top_p": self.top_p,
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OrchestratorError::UpstreamCall(format!("chat completion: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::UpstreamCall(format!(
                "chat completion returned {status}: {}",
                body_text.trim()
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OrchestratorError::UpstreamCall(format!("chat completion: {e}")))?;

        extract_reply(&value)
    }
}

fn extract_reply(value: &serde_json::Value) -> Result<String, OrchestratorError> {
    value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            OrchestratorError::UpstreamCall(
                "chat completion: response has no choices[0].message.content".to_string(),
            )
        })
}
