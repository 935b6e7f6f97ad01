//! Error types for the `docsearch-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting or searching documentation.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while generating text (query rewrite or answer synthesis).
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The collection was queried before anything created or populated it.
    #[error("Collection '{0}' does not exist")]
    CollectionNotFound(String),

    /// The documentation corpus could not be read or parsed.
    #[error("Corpus error: {0}")]
    CorpusError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in search or ingestion orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    /// Returns `true` if the error came from an upstream model capability.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::EmbeddingError { .. } | Self::GenerationError { .. })
    }
}

/// A convenience result type for search operations.
pub type Result<T> = std::result::Result<T, RagError>;
