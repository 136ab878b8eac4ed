//! Error types for the document chat engine
//!
//! One enum covers the whole pipeline: build-time failures abort document
//! processing, query-time failures abort only the current turn, and
//! per-item evaluation failures are recorded without stopping the batch.

use thiserror::Error;

/// Main error type for the document chat pipeline
#[derive(Error, Debug)]
pub enum ChatError {
    /// Document bytes could not be parsed into page text
    #[error("Document '{name}' could not be read: {reason}")]
    DocumentUnreadable { name: String, reason: String },

    /// Embedding provider call failed
    #[error("Embedding failed: {0}")]
    EmbeddingFailure(String),

    /// Index construction failed (zero chunks, persistence error, ...)
    #[error("Index build failed: {0}")]
    IndexBuildFailure(String),

    /// No index is bound: a turn was submitted before any document was processed
    #[error("No document has been processed yet")]
    IndexEmpty,

    /// Similarity search failed (embedding-model mismatch, query embed error)
    #[error("Retrieval failed: {0}")]
    RetrievalFailure(String),

    /// Generative model call failed
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// Judge response did not match the two-line Score/Justification format
    #[error("Evaluation response unparseable: {0}")]
    EvaluationParseFailure(String),

    /// Unknown session id: a caller precondition violation, not recoverable
    #[error("Unknown session id: {0}")]
    InvalidSessionReference(uuid::Uuid),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A provider call exceeded its deadline after all retries
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

/// Result type alias for chat engine operations
pub type Result<T> = std::result::Result<T, ChatError>;

impl ChatError {
    /// Build-time failures abort document processing entirely;
    /// no session may be created after one of these.
    pub fn is_build_failure(&self) -> bool {
        matches!(
            self,
            ChatError::DocumentUnreadable { .. }
                | ChatError::EmbeddingFailure(_)
                | ChatError::IndexBuildFailure(_)
        )
    }
}
