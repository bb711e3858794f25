//! LLM client abstraction
//!
//! The answer generator only needs one capability from a chat model:
//! answer a user message under a system instruction, grounded in a list of
//! document texts.

use crate::types::Result;
use async_trait::async_trait;

/// A grounding document passed alongside the user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingDocument {
    pub text: String,
    pub source: String,
}

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a reply to `prompt` under `system`, using `documents` as
    /// grounding context.
    async fn generate_grounded(
        &self,
        system: &str,
        prompt: &str,
        documents: &[GroundingDocument],
    ) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}
