//! # docqa - single-document question answering server
//!
//! Upload one file (PDF, CSV, Excel, plain text, Markdown or JSON), ask a
//! question, and get an answer grounded in that file together with the most
//! relevant passage.
//!
//! ## Overview
//!
//! Each request to `POST /api/ask` runs through the [`pipeline`]:
//!
//! 1. A file that differs from the one already indexed triggers a full reset:
//!    every vector is deleted from the hosted index.
//! 2. The file is parsed by extension ([`ingestion`]), split into overlapping
//!    character windows ([`rag::chunker`]), embedded ([`rag::embeddings`]) and
//!    upserted into the index ([`db`]) in paced batches.
//! 3. The question is embedded, the nearest chunks are retrieved and the chat
//!    model answers from the best match ([`rag::generator`]).
//!
//! Only one file is retrievable at a time and requests are served one after
//! another.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use docqa::{pipeline::{Pipeline, Session}, DocQaConfig};
//!
//! let config = DocQaConfig::load("docqa.toml")?;
//! let pipeline = Pipeline::from_config(&config)?;
//! let mut session = Session::new();
//!
//! let result = pipeline.handle(&mut session, None, "What is this about?").await?;
//! assert_eq!(result.answer, "Please upload a file first.");
//! ```
//!
//! ## Configuration
//!
//! `docqa.toml` holds non-secret settings; API keys are read from the
//! environment variables it names (`COHERE_API_KEY`, `PINECONE_API_KEY` by
//! default). See [`utils::toml_config`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Vector stores (Pinecone, in-memory).
pub mod db;
/// File parsing by extension.
pub mod ingestion;
/// Chat model clients.
pub mod llm;
/// Session state and request orchestration.
pub mod pipeline;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (responses, documents, errors).
pub mod types;
/// Configuration and logging.
pub mod utils;

// Re-export commonly used types
pub use db::{VectorStore, VectorStoreProvider};
pub use llm::LLMClient;
pub use pipeline::{Pipeline, Session};
pub use rag::EmbeddingClient;
pub use types::{AppError, Result};
pub use utils::toml_config::DocQaConfig;

use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<DocQaConfig>,
    /// Hosted clients and ingestion settings
    pub pipeline: Arc<Pipeline>,
    /// The single user session; held for the whole of each ask request
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(config: DocQaConfig, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            session: Arc::new(Mutex::new(Session::new())),
        }
    }
}
