//! Vector Store Abstraction Layer
//!
//! The pipeline talks to a single global index through the [`VectorStore`]
//! trait. Two backends exist:
//!
//! ```text
//!              ┌──────────────────────────────────────────────┐
//!              │               VectorStore Trait              │
//!              ├──────────────────────────────────────────────┤
//!              │ ensure_index │ clear_all │ upsert │ search  │
//!              └──────────────────────────────────────────────┘
//!                      ▲                          ▲
//!               ┌──────┴──────┐           ┌───────┴───────┐
//!               │  Pinecone   │           │   InMemory    │
//!               │  (hosted)   │           │ (offline/test)│
//!               └─────────────┘           └───────────────┘
//! ```
//!
//! There is no per-file namespacing: `clear_all` wipes everything.

use crate::types::{AppError, DocumentChunk, Result, SearchResult};
use crate::utils::toml_config::{DocQaConfig, VectorStoreKind};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

// ============================================================================
// Vector Store Provider Configuration
// ============================================================================

/// Resolved vector store settings, secrets included.
#[derive(Debug, Clone)]
pub enum VectorStoreProvider {
    /// Pinecone managed index (serverless).
    Pinecone {
        api_key: String,
        controller_url: String,
        index_name: String,
        dimensions: usize,
        cloud: String,
        region: String,
    },

    /// In-process store; nothing survives a restart.
    InMemory { dimensions: usize },
}

impl VectorStoreProvider {
    /// Build provider settings from configuration, reading the API key from
    /// the environment.
    pub fn from_config(config: &DocQaConfig) -> Result<Self> {
        let dimensions = config.embedding.dimensions;
        match config.vector_store.provider {
            VectorStoreKind::Pinecone => {
                let vs = &config.vector_store;
                let api_key = config
                    .resolve_env(&vs.api_key_env)
                    .map_err(|e| AppError::Configuration(e.to_string()))?;
                Ok(VectorStoreProvider::Pinecone {
                    api_key,
                    controller_url: vs.controller_url.clone(),
                    index_name: vs.index_name.clone(),
                    dimensions,
                    cloud: vs.cloud.clone(),
                    region: vs.region.clone(),
                })
            }
            VectorStoreKind::Memory => Ok(VectorStoreProvider::InMemory { dimensions }),
        }
    }

    /// Create a vector store instance from this provider configuration.
    pub fn create_store(&self) -> Box<dyn VectorStore> {
        match self {
            VectorStoreProvider::Pinecone {
                api_key,
                controller_url,
                index_name,
                dimensions,
                cloud,
                region,
            } => Box::new(super::pinecone::PineconeStore::new(
                super::pinecone::PineconeSettings {
                    api_key: api_key.clone(),
                    controller_url: controller_url.clone(),
                    index_name: index_name.clone(),
                    dimensions: *dimensions,
                    cloud: cloud.clone(),
                    region: region.clone(),
                },
            )),
            VectorStoreProvider::InMemory { dimensions } => {
                Box::new(InMemoryVectorStore::new(*dimensions))
            }
        }
    }
}

// ============================================================================
// Vector Store Trait
// ============================================================================

/// A single global similarity index over document chunks (cosine metric).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Create the index if it does not exist yet. Idempotent.
    async fn ensure_index(&self) -> Result<()>;

    /// Delete every vector in the index. Idempotent.
    async fn clear_all(&self) -> Result<()>;

    /// Upsert chunks; each must carry an embedding of the index dimension.
    ///
    /// Returns the number of vectors written.
    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize>;

    /// Nearest neighbours of `embedding`, best first, at most `limit`.
    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Number of vectors currently stored.
    async fn count(&self) -> Result<usize>;
}

// ============================================================================
// In-Memory Vector Store
// ============================================================================

/// In-memory vector store.
///
/// Data is not persisted and will be lost when the process exits.
/// Uses cosine similarity for vector comparisons.
pub struct InMemoryVectorStore {
    dimensions: usize,
    documents: RwLock<HashMap<String, DocumentChunk>>,
}

impl InMemoryVectorStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Calculate cosine similarity between two vectors.
    pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    /// Snapshot of stored chunk texts, in no particular order.
    pub fn contents(&self) -> Vec<String> {
        self.documents
            .read()
            .values()
            .map(|d| d.content.clone())
            .collect()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn ensure_index(&self) -> Result<()> {
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.documents.write().clear();
        Ok(())
    }

    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        for chunk in chunks {
            match &chunk.embedding {
                None => {
                    return Err(AppError::Index(format!(
                        "Chunk '{}' is missing embedding",
                        chunk.id
                    )))
                }
                Some(e) if e.len() != self.dimensions => {
                    return Err(AppError::Index(format!(
                        "Chunk '{}' has dimension {}, index expects {}",
                        chunk.id,
                        e.len(),
                        self.dimensions
                    )))
                }
                Some(_) => {}
            }
        }

        let mut documents = self.documents.write();
        for chunk in chunks {
            documents.insert(chunk.id.clone(), chunk.clone());
        }

        Ok(chunks.len())
    }

    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let documents = self.documents.read();

        let mut results: Vec<SearchResult> = documents
            .values()
            .filter_map(|doc| {
                let doc_embedding = doc.embedding.as_ref()?;
                Some(SearchResult {
                    chunk: DocumentChunk {
                        embedding: None, // Don't return embeddings in results
                        ..doc.clone()
                    },
                    score: Self::cosine_similarity(embedding, doc_embedding),
                })
            })
            .collect();

        // Sort by score descending, sequence ascending on ties
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.metadata.sequence.cmp(&b.chunk.metadata.sequence))
        });

        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.documents.read().len())
    }
}

// ============================================================================
// Tests
// ============================================================================
