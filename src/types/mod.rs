use serde::{Deserialize, Serialize};

// ============= API Request/Response Types =============

/// Response returned by the ask endpoint.
///
/// Both fields are always present; failures are reported as an answer string
/// with an empty `retrieved_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub retrieved_text: String,
}

impl From<QueryResult> for AskResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            answer: result.answer,
            retrieved_text: result.retrieved_text,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub vector_store: String,
    /// Vectors in the index, or `None` when the store could not be asked
    pub vector_count: Option<usize>,
    pub current_file: Option<String>,
    pub version: String,
}

// ============= Document Types =============

/// A parsed unit of a source file, before chunking.
///
/// Loaders emit one per PDF page, CSV record, worksheet, or whole text file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub content: String,
    pub metadata: SourceMetadata,
}

/// Where a piece of text came from inside the uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name of the upload
    pub source: String,
    /// 1-based PDF page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// 0-based CSV record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    /// Worksheet name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

// ============= RAG Types =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(flatten)]
    pub origin: SourceMetadata,
    /// Position of the chunk in the file's chunk sequence
    pub sequence: usize,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Generated answer plus the text of the best-ranked retrieved chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub answer: String,
    pub retrieved_text: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Failed to parse file '{file}': {message}")]
    Parse { file: String, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn parse(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::UnsupportedFileType(_)
            | AppError::Parse { .. }
            | AppError::Upload(_)
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Embedding(_) | AppError::Index(_) | AppError::Generation(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
