//! Mock implementations for testing.
//!
//! Stand-ins for the hosted embedding model, chat model and vector index,
//! shared by the pipeline and API tests.

#![allow(dead_code)]

use async_trait::async_trait;
use docqa::db::{InMemoryVectorStore, VectorStore};
use docqa::llm::{GroundingDocument, LLMClient};
use docqa::rag::EmbeddingClient;
use docqa::types::{AppError, DocumentChunk, Result, SearchResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Keyword embedder: texts containing the keyword point one way, everything
/// else points another, so retrieval ranking is fully predictable.
pub struct MockEmbedder {
    keyword: String,
    document_batches: Mutex<Vec<usize>>,
    query_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockEmbedder {
    pub const DIMENSIONS: usize = 3;

    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            document_batches: Mutex::new(Vec::new()),
            query_calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if text.contains(&self.keyword) {
            vec![1.0, 0.0, 0.0]
        } else {
            vec![0.0, 1.0, 0.0]
        }
    }

    /// Size of every `embed_documents` call, in order.
    pub fn document_batches(&self) -> Vec<usize> {
        self.document_batches.lock().clone()
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.document_batches.lock().len() + self.query_calls()
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("quota exceeded".to_string()));
        }
        self.document_batches.lock().push(texts.len());
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("quota exceeded".to_string()));
        }
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector_for(text))
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

/// Chat model that answers by quoting its grounding documents.
#[derive(Default)]
pub struct MockLLMClient {
    calls: Mutex<Vec<(String, Vec<GroundingDocument>)>>,
    pub fail: AtomicBool,
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Question and documents of the most recent call.
    pub fn last_call(&self) -> Option<(String, Vec<GroundingDocument>)> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_grounded(
        &self,
        _system: &str,
        prompt: &str,
        documents: &[GroundingDocument],
    ) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Generation("model unavailable".to_string()));
        }
        self.calls
            .lock()
            .push((prompt.to_string(), documents.to_vec()));

        let context: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        Ok(format!("Answer based on: {}", context.join(" | ")))
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

/// In-memory store that records every call made to it.
pub struct CountingStore {
    inner: InMemoryVectorStore,
    events: Mutex<Vec<String>>,
    pub fail_clear: AtomicBool,
    pub fail_count: AtomicBool,
    /// Milliseconds `clear_all` sleeps before wiping, to widen race windows
    pub clear_delay_ms: AtomicU64,
}

impl CountingStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: InMemoryVectorStore::new(dimensions),
            events: Mutex::new(Vec::new()),
            fail_clear: AtomicBool::new(false),
            fail_count: AtomicBool::new(false),
            clear_delay_ms: AtomicU64::new(0),
        }
    }

    /// Calls in order: `ensure`, `clear`, `upsert:<n>`, `search`.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count_of(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix("upsert:"))
            .filter_map(|n| n.parse().ok())
            .collect()
    }

    /// Text of every stored chunk.
    pub fn contents(&self) -> Vec<String> {
        self.inner.contents()
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    fn provider_name(&self) -> &'static str {
        "counting"
    }

    async fn ensure_index(&self) -> Result<()> {
        self.events.lock().push("ensure".to_string());
        self.inner.ensure_index().await
    }

    async fn clear_all(&self) -> Result<()> {
        self.events.lock().push("clear".to_string());
        let delay = self.clear_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(AppError::Index("delete rejected".to_string()));
        }
        self.inner.clear_all().await
    }

    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        self.events.lock().push(format!("upsert:{}", chunks.len()));
        self.inner.upsert(chunks).await
    }

    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.events.lock().push("search".to_string());
        self.inner.search(embedding, limit).await
    }

    async fn count(&self) -> Result<usize> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(AppError::Index("stats unavailable".to_string()));
        }
        self.inner.count().await
    }
}
