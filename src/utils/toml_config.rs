//! TOML-based configuration for docqa
//!
//! Everything has a default, so the server runs without a `docqa.toml`.
//! API keys never live in the file: each hosted-service section names the
//! environment variable that holds its key.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from docqa.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocQaConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub ingestion: IngestionConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Where uploaded files are written before parsing
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_file() -> String {
    "app.log".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            log_file: default_log_file(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ============= Hosted Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_cohere_base")]
    pub api_base: String,

    /// Environment variable containing the API key
    #[serde(default = "default_cohere_key_env")]
    pub api_key_env: String,

    /// Largest number of texts sent in one embed request
    #[serde(default = "default_max_texts_per_request")]
    pub max_texts_per_request: usize,
}

fn default_embedding_model() -> String {
    "embed-english-v3.0".to_string()
}

fn default_dimensions() -> usize {
    1024
}

fn default_cohere_base() -> String {
    "https://api.cohere.com".to_string()
}

fn default_cohere_key_env() -> String {
    "COHERE_API_KEY".to_string()
}

fn default_max_texts_per_request() -> usize {
    96
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            api_base: default_cohere_base(),
            api_key_env: default_cohere_key_env(),
            max_texts_per_request: default_max_texts_per_request(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_cohere_base")]
    pub api_base: String,

    /// Environment variable containing the API key
    #[serde(default = "default_cohere_key_env")]
    pub api_key_env: String,
}

fn default_chat_model() -> String {
    "command-r".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            api_base: default_cohere_base(),
            api_key_env: default_cohere_key_env(),
        }
    }
}

// ============= Vector Store Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub provider: VectorStoreKind,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_pinecone_controller")]
    pub controller_url: String,

    /// Environment variable containing the Pinecone API key
    #[serde(default = "default_pinecone_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreKind {
    #[default]
    Pinecone,
    Memory,
}

fn default_index_name() -> String {
    "cohere".to_string()
}

fn default_pinecone_controller() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_pinecone_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreKind::default(),
            index_name: default_index_name(),
            controller_url: default_pinecone_controller(),
            api_key_env: default_pinecone_key_env(),
            cloud: default_cloud(),
            region: default_region(),
        }
    }
}

// ============= Ingestion & Retrieval Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause before every upsert batch after the first
    #[serde(default = "default_batch_delay_secs")]
    pub batch_delay_secs: u64,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_delay_secs() -> u64 {
    60
}

impl IngestionConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs(self.batch_delay_secs)
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
            batch_delay_secs: default_batch_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Neighbours fetched from the index per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// How many of those neighbours are handed to the chat model
    #[serde(default = "default_context_chunks")]
    pub context_chunks: usize,
}

fn default_top_k() -> usize {
    4
}

fn default_context_chunks() -> usize {
    1
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            context_chunks: default_context_chunks(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl DocQaConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: DocQaConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Check value ranges. Does not touch the environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ingestion = &self.ingestion;
        if ingestion.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingestion.chunk_size must be greater than 0".into(),
            ));
        }
        if ingestion.chunk_overlap >= ingestion.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "ingestion.chunk_overlap ({}) must be smaller than chunk_size ({})",
                ingestion.chunk_overlap, ingestion.chunk_size
            )));
        }
        if ingestion.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingestion.batch_size must be greater than 0".into(),
            ));
        }

        let retrieval = &self.retrieval;
        if retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }
        if retrieval.context_chunks == 0 || retrieval.context_chunks > retrieval.top_k {
            return Err(ConfigError::ValidationError(format!(
                "retrieval.context_chunks must be between 1 and top_k ({})",
                retrieval.top_k
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be greater than 0".into(),
            ));
        }
        if self.embedding.max_texts_per_request == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.max_texts_per_request must be greater than 0".into(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_upload_bytes must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Check that every API key the configured services need is present.
    pub fn validate_env(&self) -> Result<(), ConfigError> {
        self.validate_env_var(&self.embedding.api_key_env)?;
        self.validate_env_var(&self.llm.api_key_env)?;
        if self.vector_store.provider == VectorStoreKind::Pinecone {
            self.validate_env_var(&self.vector_store.api_key_env)?;
        }
        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_name).map_err(|_| ConfigError::MissingEnvVar(env_name.to_string()))
    }
}
