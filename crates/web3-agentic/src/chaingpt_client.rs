//! ChainGPT Client
//!
//! LLM client implementation for the ChainGPT `/chat/stream` endpoint, used
//! in non-streaming mode.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm_client::{AssistantModel, LlmClient};

pub const DEFAULT_BASE_URL: &str = "https://api.chaingpt.org";

const PROVIDER: &str = "ChainGPT";

/// ChainGPT API client
#[derive(Clone)]
pub struct ChainGptClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ChainGptClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::from_reqwest(PROVIDER, e))?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create from environment variables
    pub fn from_env(timeout: Duration) -> Result<Self, LlmError> {
        let api_key = std::env::var("CHAINGPT_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::NotConfigured("CHAINGPT_API_KEY".into()))?;
        let base_url =
            std::env::var("CHAINGPT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url, timeout)
    }
}

#[async_trait]
impl LlmClient for ChainGptClient {
    async fn ask(&self, model: AssistantModel, question: &str) -> Result<String, LlmError> {
        tracing::debug!(model = model.as_str(), chars = question.len(), "chaingpt request");

        let response = self
            .client
            .post(format!("{}/chat/stream", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "question": question,
                "stream": false,
                "model": model.as_str(),
            }))
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: PROVIDER.to_string(),
                status,
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, e))?;
        Ok(extract_answer(&text))
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}

/// The endpoint answers with `{ status, data: { bot } }` or bare text.
fn extract_answer(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(value) => value
            .pointer("/data/bot")
            .and_then(|b| b.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Err(_) => body.to_string(),
    }
}
