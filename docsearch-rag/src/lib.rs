//! # docsearch-rag
//!
//! Retrieval over versioned documentation: chunking, version-scoped metadata
//! filters, ingestion and cited answer synthesis.
//!
//! ## Overview
//!
//! - [`TokenWindowChunker`] - splits page text into bounded, space-aligned chunks
//! - [`MetadataFilter`] - restricts a search to one version plus common resources
//! - [`SearchService`] - ingestion, search, enhanced search and introspection
//! - [`GeminiClient`] - Gemini embeddings and generation (feature `gemini`)
//! - [`ChromaVectorStore`] - Chroma over HTTP (feature `chroma`)
//! - [`InMemoryVectorStore`] - in-process store for tests and local runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docsearch_rag::{ChromaVectorStore, GeminiClient, SearchRequest, SearchService, load_corpus};
//!
//! let gemini = Arc::new(GeminiClient::from_env()?);
//! let service = SearchService::builder()
//!     .embedding_provider(gemini.clone())
//!     .generator(gemini)
//!     .vector_store(Arc::new(ChromaVectorStore::from_host("localhost", 8000)?))
//!     .build()?;
//!
//! service.ingest_if_empty(&load_corpus("vitess_docs.yaml").await?).await?;
//! let answer = service.summarize(&SearchRequest::new("what is vtorc")).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod generation;
pub mod inmemory;
pub mod pipeline;
pub mod planner;
pub mod prompt;
pub mod stats;
pub mod vectorstore;
pub mod version;

#[cfg(feature = "chroma")]
pub mod chroma;
#[cfg(feature = "gemini")]
pub mod gemini;

pub use chunking::{Chunker, TokenWindowChunker, normalize_whitespace};
pub use config::{RagConfig, RagConfigBuilder};
pub use corpus::{load_corpus, parse_corpus};
pub use document::{Chunk, ChunkMetadata, Document, QueryResult, StoredMatch, StoredRecord};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use filter::{COMMON_RESOURCE_TITLES, MetadataField, MetadataFilter};
pub use generation::TextGenerator;
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{
    EnhancedSearchResponse, IngestReport, SearchResponse, SearchService, SearchServiceBuilder,
    SummaryResponse, VersionsResponse,
};
pub use planner::{QueryPlan, SearchRequest, similarity};
pub use prompt::{NO_RESULTS_MESSAGE, PromptTemplates, Reference};
pub use stats::{CollectionStats, InspectReport};
pub use vectorstore::VectorStore;
pub use version::{DEFAULT_VERSION, full_version_label};

#[cfg(feature = "chroma")]
pub use chroma::ChromaVectorStore;
#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
