//! Hosted embedding client.
//!
//! [`EmbeddingClient`] is the seam the pipeline depends on;
//! [`CohereEmbeddings`] implements it against Cohere's `/v1/embed` endpoint.

use crate::types::{AppError, Result};
use crate::utils::toml_config::EmbeddingConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Turns text into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed texts that will be stored in the index.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a user question for similarity search.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum InputType {
    SearchDocument,
    SearchQuery,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: InputType,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Cohere embedding model client.
pub struct CohereEmbeddings {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
    max_texts_per_request: usize,
}

impl CohereEmbeddings {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_texts_per_request: config.max_texts_per_request.max(1),
        }
    }

    async fn embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.max_texts_per_request) {
            let request = EmbedRequest {
                model: &self.model,
                texts: batch,
                input_type,
            };

            let response = self
                .client
                .post(format!("{}/v1/embed", self.api_base))
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| AppError::Embedding(format!("Cohere request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Embedding(format!(
                    "Cohere embed returned {}: {}",
                    status, body
                )));
            }

            let parsed: EmbedResponse = response
                .json()
                .await
                .map_err(|e| AppError::Embedding(format!("Invalid embed response: {}", e)))?;

            if parsed.embeddings.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    parsed.embeddings.len()
                )));
            }
            if let Some(bad) = parsed
                .embeddings
                .iter()
                .find(|v| v.len() != self.dimensions)
            {
                return Err(AppError::Embedding(format!(
                    "Expected {}-dimensional embeddings, got {}",
                    self.dimensions,
                    bad.len()
                )));
            }

            vectors.extend(parsed.embeddings);
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingClient for CohereEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed(texts, InputType::SearchDocument).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .embed(&[text.to_string()], InputType::SearchQuery)
            .await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned for query".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
