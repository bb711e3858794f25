use crate::llm::client::{GroundingDocument, LLMClient};
use crate::types::{AppError, Result};
use crate::utils::toml_config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    preamble: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    documents: Vec<ChatDocument<'a>>,
}

#[derive(Serialize)]
struct ChatDocument<'a> {
    text: &'a str,
    source: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    text: String,
}

/// Cohere chat model client (`/v1/chat`).
///
/// The system instruction goes in `preamble`, retrieved chunks in
/// `documents`.
pub struct CohereChatClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl CohereChatClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl LLMClient for CohereChatClient {
    async fn generate_grounded(
        &self,
        system: &str,
        prompt: &str,
        documents: &[GroundingDocument],
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            message: prompt,
            preamble: system,
            documents: documents
                .iter()
                .map(|d| ChatDocument {
                    text: &d.text,
                    source: &d.source,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Cohere request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "Cohere chat returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Invalid chat response: {}", e)))?;

        Ok(parsed.text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
