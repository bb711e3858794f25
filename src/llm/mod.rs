//! Chat model clients.
//!
//! - [`LLMClient`] - the trait the answer generator calls
//! - [`CohereChatClient`] - hosted Cohere chat implementation

/// Core LLM client trait.
pub mod client;
/// Cohere chat API client.
pub mod cohere;

pub use client::{GroundingDocument, LLMClient};
pub use cohere::CohereChatClient;
