//! Retrieval Augmented Generation (RAG) components
//!
//! # Module Structure
//!
//! - [`rag::chunker`](crate::rag::chunker) - Fixed-size character chunking
//! - [`rag::embeddings`](crate::rag::embeddings) - Hosted embedding client
//! - [`rag::generator`](crate::rag::generator) - Grounded answer generation
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - The uploaded file is parsed, chunked and embedded
//! 2. **Storage** - Embeddings are upserted into the vector index in batches
//! 3. **Retrieval** - The question is embedded and nearest chunks are fetched
//! 4. **Generation** - The chat model answers using the top chunk as context
//!
//! The [`pipeline`](crate::pipeline) module sequences these steps.

pub mod chunker;
pub mod embeddings;
pub mod generator;

pub use chunker::TextChunker;
pub use embeddings::{CohereEmbeddings, EmbeddingClient};
pub use generator::{AnswerGenerator, SYSTEM_PROMPT};
