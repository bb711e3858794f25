//! Vector storage.
//!
//! - [`vectorstore`] - the [`VectorStore`] trait, provider selection and an
//!   in-process store used for local runs and tests
//! - [`pinecone`] - the managed Pinecone index used in production

pub mod pinecone;
pub mod vectorstore;

pub use pinecone::{PineconeSettings, PineconeStore};
pub use vectorstore::{InMemoryVectorStore, VectorStore, VectorStoreProvider};
