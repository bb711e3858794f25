//! Pinecone vector database integration.
//!
//! Talks to Pinecone's REST API directly:
//! - control plane (`controller_url`): describe and create the index
//! - data plane (the index host returned by describe): upsert, delete, query
//!
//! Everything lives in the default namespace of one index. Chunk text and
//! source metadata are stored as vector metadata, text under `text`.

use crate::types::{AppError, ChunkMetadata, DocumentChunk, Result, SearchResult, SourceMetadata};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;

use super::vectorstore::VectorStore;

const API_VERSION: &str = "2024-07";

/// Connection settings for one Pinecone index.
#[derive(Debug, Clone)]
pub struct PineconeSettings {
    pub api_key: String,
    pub controller_url: String,
    pub index_name: String,
    pub dimensions: usize,
    pub cloud: String,
    pub region: String,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: usize,
}

/// Pinecone-backed [`VectorStore`].
pub struct PineconeStore {
    client: Client,
    settings: PineconeSettings,
    host: OnceCell<String>,
    ready_poll_interval: Duration,
    ready_poll_attempts: u32,
}

impl PineconeStore {
    pub fn new(settings: PineconeSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
            host: OnceCell::new(),
            ready_poll_interval: Duration::from_secs(1),
            ready_poll_attempts: 60,
        }
    }

    /// Override how long `ensure_index` waits for a new index to become ready.
    pub fn with_ready_poll(mut self, interval: Duration, attempts: u32) -> Self {
        self.ready_poll_interval = interval;
        self.ready_poll_attempts = attempts.max(1);
        self
    }

    fn controller(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.settings.controller_url.trim_end_matches('/'),
            path
        )
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.settings.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    /// Describe the index; `None` when it does not exist.
    async fn describe_index(&self) -> Result<Option<IndexDescription>> {
        let url = self.controller(&format!("/indexes/{}", self.settings.index_name));
        let response = self
            .authed(self.client.get(url))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to describe index: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, "describe index").await?;

        let description = response
            .json::<IndexDescription>()
            .await
            .map_err(|e| AppError::Index(format!("Invalid describe response: {}", e)))?;
        Ok(Some(description))
    }

    async fn create_index(&self) -> Result<()> {
        let body = json!({
            "name": self.settings.index_name,
            "dimension": self.settings.dimensions,
            "metric": "cosine",
            "spec": {
                "serverless": {
                    "cloud": self.settings.cloud,
                    "region": self.settings.region,
                }
            }
        });

        let response = self
            .authed(self.client.post(self.controller("/indexes")))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to create index: {}", e)))?;

        // Another process may have created it in the meantime.
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        check_status(response, "create index").await?;
        Ok(())
    }

    /// Data-plane base URL, resolved once from the index description.
    async fn data_url(&self, path: &str) -> Result<String> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let description = self.describe_index().await?.ok_or_else(|| {
                    AppError::Index(format!(
                        "Index '{}' does not exist",
                        self.settings.index_name
                    ))
                })?;
                Ok::<_, AppError>(normalize_host(&description.host))
            })
            .await?;
        Ok(format!("{}{}", host, path))
    }

    fn vector_for(&self, chunk: &DocumentChunk) -> Result<Value> {
        let embedding = chunk.embedding.as_ref().ok_or_else(|| {
            AppError::Index(format!("Chunk '{}' is missing embedding", chunk.id))
        })?;
        if embedding.len() != self.settings.dimensions {
            return Err(AppError::Index(format!(
                "Chunk '{}' has dimension {}, index expects {}",
                chunk.id,
                embedding.len(),
                self.settings.dimensions
            )));
        }

        let mut metadata = match serde_json::to_value(&chunk.metadata) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(AppError::Internal(e.to_string())),
        };
        metadata.insert("text".to_string(), Value::String(chunk.content.clone()));

        Ok(json!({
            "id": chunk.id,
            "values": embedding,
            "metadata": metadata,
        }))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn check_status(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Index(format!(
        "Pinecone {} returned {}: {}",
        action, status, body
    )))
}

fn number_field(metadata: &Map<String, Value>, key: &str) -> Option<u64> {
    // Pinecone hands numbers back as floats
    metadata.get(key).and_then(Value::as_f64).map(|n| n as u64)
}

fn chunk_from_match(m: QueryMatch) -> DocumentChunk {
    let metadata = m.metadata.unwrap_or_default();
    let text = |key: &str| {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    DocumentChunk {
        content: text("text").unwrap_or_default(),
        metadata: ChunkMetadata {
            origin: SourceMetadata {
                source: text("source").unwrap_or_default(),
                page: number_field(&metadata, "page").map(|n| n as u32),
                row: number_field(&metadata, "row").map(|n| n as u32),
                sheet: text("sheet"),
            },
            sequence: number_field(&metadata, "sequence").unwrap_or_default() as usize,
        },
        id: m.id,
        embedding: None,
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn provider_name(&self) -> &'static str {
        "pinecone"
    }

    async fn ensure_index(&self) -> Result<()> {
        if self.host.initialized() {
            return Ok(());
        }

        if self.describe_index().await?.is_none() {
            tracing::info!(
                index = %self.settings.index_name,
                dimension = self.settings.dimensions,
                "Creating Pinecone index"
            );
            self.create_index().await?;
        }

        for attempt in 1..=self.ready_poll_attempts {
            if let Some(description) = self.describe_index().await? {
                if description.status.ready {
                    let _ = self.host.set(normalize_host(&description.host));
                    return Ok(());
                }
            }
            tracing::debug!(attempt, "Waiting for Pinecone index to become ready");
            tokio::time::sleep(self.ready_poll_interval).await;
        }

        Err(AppError::Index(format!(
            "Index '{}' not ready after {} attempts",
            self.settings.index_name, self.ready_poll_attempts
        )))
    }

    async fn clear_all(&self) -> Result<()> {
        let url = self.data_url("/vectors/delete").await?;
        let response = self
            .authed(self.client.post(url))
            .json(&json!({ "deleteAll": true, "namespace": "" }))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to delete vectors: {}", e)))?;

        // An empty index has no namespace to delete from.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response, "delete all").await?;
        Ok(())
    }

    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let vectors = chunks
            .iter()
            .map(|c| self.vector_for(c))
            .collect::<Result<Vec<_>>>()?;

        let url = self.data_url("/vectors/upsert").await?;
        let response = self
            .authed(self.client.post(url))
            .json(&json!({ "vectors": vectors, "namespace": "" }))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to upsert vectors: {}", e)))?;
        let response = check_status(response, "upsert").await?;

        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Invalid upsert response: {}", e)))?;
        Ok(parsed.upserted_count)
    }

    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let url = self.data_url("/query").await?;
        let response = self
            .authed(self.client.post(url))
            .json(&json!({
                "vector": embedding,
                "topK": limit,
                "includeMetadata": true,
                "includeValues": false,
                "namespace": "",
            }))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to query index: {}", e)))?;
        let response = check_status(response, "query").await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Invalid query response: {}", e)))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| {
                let score = m.score;
                SearchResult {
                    chunk: chunk_from_match(m),
                    score,
                }
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let url = self.data_url("/describe_index_stats").await?;
        let response = self
            .authed(self.client.post(url))
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to fetch index stats: {}", e)))?;
        let response = check_status(response, "describe index stats").await?;

        let stats: IndexStats = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Invalid stats response: {}", e)))?;
        Ok(stats.total_vector_count)
    }
}
