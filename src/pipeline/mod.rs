//! Session orchestration.
//!
//! [`Pipeline`] sequences one request: decide whether the uploaded file is new,
//! reset and re-index when it is, then retrieve and answer.
//!
//! ```text
//!   Empty ──upload──▶ Resetting ──▶ Indexing ──▶ Ready
//!                                                 │  ▲
//!                                         question│  │answered
//!                                                 ▼  │
//!                                               Querying
//! ```
//!
//! A failure after the reset leaves the session [`SessionPhase::Empty`].

pub mod session;

pub use session::{FileIdentity, Session, SessionPhase, UploadedFile};

use crate::db::{VectorStore, VectorStoreProvider};
use crate::ingestion::{load_file, select_loader};
use crate::llm::{CohereChatClient, LLMClient};
use crate::rag::{AnswerGenerator, CohereEmbeddings, EmbeddingClient, TextChunker};
use crate::types::{AppError, DocumentChunk, QueryResult, Result};
use crate::utils::toml_config::{DocQaConfig, IngestionConfig, RetrievalConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Answer returned when there is nothing indexed to ask about.
pub const NO_FILE_MESSAGE: &str = "Please upload a file first.";

/// Snippet returned when retrieval finds no neighbours.
pub const NO_MATCHES_MESSAGE: &str = "No relevant documents found.";

/// Ingestion and query sequencing over the hosted services.
pub struct Pipeline {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    generator: AnswerGenerator,
    chunker: TextChunker,
    batch_size: usize,
    batch_delay: Duration,
    top_k: usize,
    context_chunks: usize,
}

impl Pipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LLMClient>,
        ingestion: &IngestionConfig,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            generator: AnswerGenerator::new(llm),
            chunker: TextChunker::new(ingestion.chunk_size, ingestion.chunk_overlap),
            batch_size: ingestion.batch_size.max(1),
            batch_delay: ingestion.batch_delay(),
            top_k: retrieval.top_k,
            context_chunks: retrieval.context_chunks,
        }
    }

    /// Wire up the hosted clients named in `config`, reading API keys from
    /// the environment.
    pub fn from_config(config: &DocQaConfig) -> Result<Self> {
        let embedding_key = config
            .resolve_env(&config.embedding.api_key_env)
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        let llm_key = config
            .resolve_env(&config.llm.api_key_env)
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        let embedder = Arc::new(CohereEmbeddings::new(&config.embedding, embedding_key));
        let llm = Arc::new(CohereChatClient::new(&config.llm, llm_key));
        let store: Arc<dyn VectorStore> =
            Arc::from(VectorStoreProvider::from_config(config)?.create_store());

        Ok(Self::new(
            embedder,
            store,
            llm,
            &config.ingestion,
            &config.retrieval,
        ))
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Run one upload-and-ask request against `session`.
    ///
    /// Without a file the fixed prompt to upload is returned and no hosted
    /// service is called. A file different from the current one is indexed
    /// first; the same file goes straight to the query.
    pub async fn handle(
        &self,
        session: &mut Session,
        upload: Option<UploadedFile>,
        question: &str,
    ) -> Result<QueryResult> {
        let Some(upload) = upload else {
            return Ok(no_file_result());
        };

        if session.is_current(&upload.identity) {
            tracing::info!(file = %upload.identity.name, "File already indexed, skipping ingestion");
        } else {
            self.process_file(session, &upload).await?;
        }

        session.phase = SessionPhase::Querying;
        let result = self.query(session, question).await;
        session.phase = SessionPhase::Ready;
        result
    }

    /// Wipe the index and ingest `upload` in paced batches.
    ///
    /// An unsupported extension is rejected before anything is touched. On
    /// success the session points at the new file. On any later failure the
    /// session is cleared, since the index no longer holds the old file.
    pub async fn process_file(&self, session: &mut Session, upload: &UploadedFile) -> Result<()> {
        let extension = upload
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        select_loader(extension)?;

        tracing::info!(
            file = %upload.identity.name,
            digest = %upload.identity.digest,
            "New file detected, resetting index"
        );

        session.current_file = None;
        session.index_ready = false;
        session.phase = SessionPhase::Resetting;

        match self.reset_and_ingest(session, upload).await {
            Ok(indexed) => {
                session.current_file = Some(upload.identity.clone());
                session.index_ready = indexed > 0;
                session.phase = SessionPhase::Ready;
                tracing::info!(file = %upload.identity.name, chunks = indexed, "File indexed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    file = %upload.identity.name,
                    phase = %session.phase,
                    error = %e,
                    "Failed to process file"
                );
                session.clear();
                Err(e)
            }
        }
    }

    async fn reset_and_ingest(&self, session: &mut Session, upload: &UploadedFile) -> Result<usize> {
        self.store.clear_all().await?;

        session.phase = SessionPhase::Indexing;
        let documents = parse_upload(upload.path.clone()).await?;
        let mut chunks = self.chunker.split_documents(&documents);
        tracing::info!(
            file = %upload.identity.name,
            documents = documents.len(),
            chunks = chunks.len(),
            "Parsed and split file"
        );

        self.index_chunks(&mut chunks).await
    }

    /// Embed and upsert `chunks` in batches, pausing between batches to stay
    /// under hosted rate limits. The first batch makes sure the index exists.
    async fn index_chunks(&self, chunks: &mut [DocumentChunk]) -> Result<usize> {
        let total_batches = chunks.len().div_ceil(self.batch_size);
        let mut indexed = 0;

        for (i, batch) in chunks.chunks_mut(self.batch_size).enumerate() {
            if i == 0 {
                self.store.ensure_index().await?;
            } else {
                tracing::debug!(delay_secs = self.batch_delay.as_secs(), "Pausing between batches");
                tokio::time::sleep(self.batch_delay).await;
            }

            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_documents(&texts).await?;
            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = Some(embedding);
            }

            indexed += self.store.upsert(batch).await?;
            tracing::info!("Processed batch {} of {}", i + 1, total_batches);
        }

        Ok(indexed)
    }

    /// Answer `question` from the currently indexed file.
    pub async fn query(&self, session: &Session, question: &str) -> Result<QueryResult> {
        if !session.index_ready {
            return Ok(no_file_result());
        }

        let embedding = self.embedder.embed_query(question).await?;
        let results = self.store.search(&embedding, self.top_k).await?;
        tracing::debug!(neighbours = results.len(), "Retrieved context");

        let retrieved_text = results
            .first()
            .map(|r| r.chunk.content.clone())
            .unwrap_or_else(|| NO_MATCHES_MESSAGE.to_string());

        let context: Vec<DocumentChunk> = results
            .into_iter()
            .take(self.context_chunks)
            .map(|r| r.chunk)
            .collect();

        let answer = self.generator.answer(question, &context).await?;

        Ok(QueryResult {
            answer,
            retrieved_text,
        })
    }
}

fn no_file_result() -> QueryResult {
    QueryResult {
        answer: NO_FILE_MESSAGE.to_string(),
        retrieved_text: String::new(),
    }
}

async fn parse_upload(path: PathBuf) -> Result<Vec<crate::types::LoadedDocument>> {
    tokio::task::spawn_blocking(move || load_file(&path))
        .await
        .map_err(|e| AppError::Internal(format!("Parser task failed: {}", e)))?
}
