//! Error types for mmrag.

use thiserror::Error;

/// Main error type for mmrag operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction parameters
    #[error("config error: {0}")]
    Config(String),

    /// Content store or embedding index operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Document extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Chat backend or prompting failed
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    /// Ingestion was rejected
    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure came from an unreachable backend (embedding or chat).
    #[must_use]
    pub fn is_backend_unavailable(&self) -> bool {
        match self {
            Self::Embedding(EmbedError::BackendUnavailable(_))
            | Self::Store(StoreError::Embedding(EmbedError::BackendUnavailable(_)))
            | Self::Llm(LlmError::BackendUnavailable(_)) => true,
            _ => false,
        }
    }
}

/// Document extraction errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Failed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("embedding backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Content store and embedding index errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("insert failed: {0}")]
    Insert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),
}

/// Chat model and prompting errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("chat backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("chat backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("image error: {0}")]
    Image(String),
}

/// Ingestion errors.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("length mismatch: {keys} keys for {values} values")]
    LengthMismatch { keys: usize, values: usize },
}

/// Result type alias for mmrag operations.
pub type Result<T> = std::result::Result<T, Error>;
