use crate::llm::{GroundingDocument, LLMClient};
use crate::types::{DocumentChunk, Result};
use std::sync::Arc;

/// System instruction sent with every question.
pub const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in analyzing and answering questions based on the content of various text-based files, including PDFs, CSVs, Excel sheets, and plain text documents. Your task is to provide accurate, concise, and relevant answers to user queries using the information from the retrieved document sections. Follow these guidelines:

1. Base your answers solely on the information provided in the retrieved documents.
2. If the answer is not directly found in the documents, say so clearly.
3. Provide concise answers, but include relevant details when necessary.
4. If asked about topics not covered in the documents, politely explain that you can only answer questions related to the uploaded file.
5. Use a professional and helpful tone in your responses.
6. For data files (CSV, Excel), be prepared to provide basic statistical insights if asked.

Remember, your goal is to assist users in understanding the content of the file they've uploaded.";

/// Sends the question and retrieved context to the chat model.
///
/// The model's reply is returned verbatim.
pub struct AnswerGenerator {
    llm: Arc<dyn LLMClient>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    pub async fn answer(&self, question: &str, context: &[DocumentChunk]) -> Result<String> {
        let documents: Vec<GroundingDocument> = context
            .iter()
            .map(|chunk| GroundingDocument {
                text: chunk.content.clone(),
                source: chunk.metadata.origin.source.clone(),
            })
            .collect();

        tracing::debug!(
            model = self.llm.model_name(),
            documents = documents.len(),
            "Generating answer"
        );

        self.llm
            .generate_grounded(SYSTEM_PROMPT, question, &documents)
            .await
    }
}
