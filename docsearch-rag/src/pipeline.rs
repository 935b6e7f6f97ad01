//! Search service orchestrator.
//!
//! The [`SearchService`] coordinates ingestion (chunk → embed → store) and
//! querying (embed → filtered search → score → optional answer synthesis) by
//! composing an [`EmbeddingProvider`], a [`VectorStore`], a [`Chunker`] and an
//! optional [`TextGenerator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docsearch_rag::{GeminiClient, InMemoryVectorStore, RagConfig, SearchRequest, SearchService};
//!
//! let gemini = Arc::new(GeminiClient::from_env()?);
//! let service = SearchService::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(gemini.clone())
//!     .generator(gemini)
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! service.ingest_if_empty(&documents).await?;
//! let response = service.search(&SearchRequest::new("how do I reshard")).await?;
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::chunking::{Chunker, TokenWindowChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, QueryResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::filter::MetadataFilter;
use crate::generation::TextGenerator;
use crate::planner::{QueryPlan, SearchRequest, score_matches};
use crate::prompt::{NO_RESULTS_MESSAGE, PromptTemplates, Reference, unique_references};
use crate::stats::{CollectionStats, InspectReport};
use crate::vectorstore::VectorStore;
use crate::version::KNOWN_VERSIONS;

/// How many records [`SearchService::inspect`] samples.
const INSPECT_SAMPLE: usize = 3;

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks already in the collection when ingestion was skipped.
    pub existing_chunks: usize,
    /// Chunks embedded and written.
    pub chunks_stored: usize,
    /// Chunks dropped because their embedding failed.
    pub chunks_failed: usize,
    /// Documents skipped because their content was blank.
    pub documents_skipped: usize,
    /// Stored chunk count per parent document id.
    pub chunks_per_document: BTreeMap<u64, usize>,
}

impl IngestReport {
    /// Returns `true` if ingestion did not run because the collection already
    /// held data.
    pub fn skipped(&self) -> bool {
        self.existing_chunks > 0
    }
}

/// Plain search results.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<QueryResult>,
    /// The `where` clause used, or `"None"` when unrestricted.
    pub filter_used: Value,
}

/// Search results with a synthesized answer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryResponse {
    pub summary: String,
    pub references: Vec<Reference>,
    pub results: Vec<QueryResult>,
    pub filter_used: Value,
}

/// Results of a search run on a rewritten query, answered for the original one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnhancedSearchResponse {
    pub enhanced_query: String,
    pub summary: String,
    pub references: Vec<Reference>,
    pub results: Vec<QueryResult>,
    pub filter_used: Value,
}

/// Known version labels next to the labels actually present in the store.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VersionsResponse {
    pub available_versions: Vec<String>,
    /// Labels found in stored metadata, sorted.
    pub database_versions: Vec<String>,
}

/// The documentation search service.
///
/// Holds no mutable state of its own; share it behind an `Arc`. Construct
/// one via [`SearchService::builder()`].
pub struct SearchService {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    generator: Option<Arc<dyn TextGenerator>>,
    templates: PromptTemplates,
}

impl SearchService {
    /// Create a new [`SearchServiceBuilder`].
    pub fn builder() -> SearchServiceBuilder {
        SearchServiceBuilder::default()
    }

    /// Return a reference to the service configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    fn collection(&self) -> &str {
        &self.config.collection
    }

    fn generator(&self) -> Result<&Arc<dyn TextGenerator>> {
        self.generator
            .as_ref()
            .ok_or_else(|| RagError::ConfigError("no text generator configured".to_string()))
    }

    /// Reject vectors whose length differs from the provider's declared
    /// dimensionality, so stored and query vectors stay comparable.
    fn check_dimensions(&self, embedding: Vec<f32>) -> Result<Vec<f32>> {
        let expected = self.embedding_provider.dimensions();
        if embedding.len() == expected {
            return Ok(embedding);
        }
        Err(RagError::EmbeddingError {
            provider: "pipeline".to_string(),
            message: format!("expected {expected} dimensions, got {}", embedding.len()),
        })
    }

    // ── Ingestion ──────────────────────────────────────────────────────

    /// Populate the collection from `documents` unless it already holds data.
    ///
    /// The collection is created when missing. When it is non-empty nothing is
    /// written and the report carries the existing chunk count and a
    /// per-document breakdown of what is stored.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the collection cannot be
    /// created or counted, or if the final write fails.
    pub async fn ingest_if_empty(&self, documents: &[Document]) -> Result<IngestReport> {
        let collection = self.collection();
        self.vector_store.get_or_create_collection(collection).await.map_err(|e| {
            error!(collection, error = %e, "failed to create collection");
            RagError::PipelineError(format!("failed to create collection '{collection}': {e}"))
        })?;

        let existing = self.vector_store.count(collection).await.map_err(|e| {
            error!(collection, error = %e, "failed to count collection");
            RagError::PipelineError(format!("failed to count collection '{collection}': {e}"))
        })?;

        if existing == 0 {
            return self.ingest(documents).await;
        }

        let records = self.vector_store.get(collection, &MetadataFilter::All, None).await?;
        let mut chunks_per_document = BTreeMap::new();
        for record in &records {
            *chunks_per_document.entry(record.metadata.id_parent).or_insert(0) += 1;
            if record.metadata.chunk_index == 0 {
                debug!(
                    id_parent = record.metadata.id_parent,
                    title = %record.metadata.title,
                    total_chunks = record.metadata.total_chunks,
                    "document already stored"
                );
            }
        }
        info!(
            collection,
            existing_chunks = existing,
            documents = chunks_per_document.len(),
            "collection already populated, skipping ingestion"
        );

        Ok(IngestReport { existing_chunks: existing, chunks_per_document, ..Default::default() })
    }

    /// Chunk, embed and store `documents` unconditionally.
    ///
    /// Chunks whose embedding fails, or comes back with the wrong
    /// dimensionality, are logged and dropped; the rest are written in one
    /// batch. Running this twice stores every document twice.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the batched write fails.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestReport> {
        let collection = self.collection();
        let mut report = IngestReport::default();
        let mut ready: Vec<Chunk> = Vec::new();

        for document in documents {
            if document.content.trim().is_empty() {
                debug!(id_parent = document.id_parent, "skipping document with empty content");
                report.documents_skipped += 1;
                continue;
            }

            for mut chunk in self.chunker.chunk(document) {
                let embedded = self
                    .embedding_provider
                    .embed_document(&chunk.text, &document.title)
                    .await
                    .and_then(|embedding| self.check_dimensions(embedding));
                match embedded {
                    Ok(embedding) => {
                        chunk.embedding = embedding;
                        *report.chunks_per_document.entry(document.id_parent).or_insert(0) += 1;
                        ready.push(chunk);
                    }
                    Err(e) => {
                        warn!(
                            id_parent = document.id_parent,
                            chunk_index = chunk.metadata.chunk_index,
                            error = %e,
                            "embedding failed, dropping chunk"
                        );
                        report.chunks_failed += 1;
                    }
                }
            }
        }

        if !ready.is_empty() {
            self.vector_store.upsert(collection, &ready).await.map_err(|e| {
                error!(collection, chunk_count = ready.len(), error = %e, "upsert failed during ingestion");
                RagError::PipelineError(format!("upsert into '{collection}' failed: {e}"))
            })?;
        }

        report.chunks_stored = ready.len();
        info!(
            collection,
            chunks_stored = report.chunks_stored,
            chunks_failed = report.chunks_failed,
            documents = report.chunks_per_document.len(),
            "ingestion finished"
        );

        Ok(report)
    }

    // ── Query ──────────────────────────────────────────────────────────

    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<QueryResult>> {
        let embedding = self
            .embedding_provider
            .embed_query(&plan.query)
            .await
            .and_then(|embedding| self.check_dimensions(embedding))
            .inspect_err(|e| {
                error!(error = %e, "embedding failed during query");
            })?;

        let matches = self
            .vector_store
            .query(self.collection(), &embedding, &plan.filter, plan.n_results)
            .await
            .inspect_err(|e| {
                error!(collection = self.collection(), error = %e, "vector store query failed");
            })?;

        let results = score_matches(matches);
        info!(result_count = results.len(), n_results = plan.n_results, "query completed");
        Ok(results)
    }

    async fn answer(&self, query: &str, results: &[QueryResult]) -> Result<String> {
        if results.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }
        let prompt = self.templates.summary_prompt(query, results);
        self.generator()?.generate(&prompt).await
    }

    /// Run a filtered nearest-neighbour search.
    ///
    /// Zero matches is an empty result list, not an error.
    ///
    /// # Errors
    ///
    /// Propagates embedding and store errors, including
    /// [`RagError::CollectionNotFound`] before any ingestion. A query vector
    /// whose length differs from [`EmbeddingProvider::dimensions`] is an
    /// [`RagError::EmbeddingError`].
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let plan = QueryPlan::from_request(request);
        let results = self.execute(&plan).await?;
        Ok(SearchResponse { results, filter_used: plan.filter.describe() })
    }

    /// Search with the query as given and synthesize a cited answer.
    ///
    /// # Errors
    ///
    /// As [`search`](Self::search), plus [`RagError::ConfigError`] when no
    /// generator is configured and results need summarizing.
    pub async fn summarize(&self, request: &SearchRequest) -> Result<SummaryResponse> {
        let plan = QueryPlan::from_request(request);
        let results = self.execute(&plan).await?;
        let summary = self.answer(&request.query, &results).await?;

        Ok(SummaryResponse {
            summary,
            references: unique_references(&results),
            results,
            filter_used: plan.filter.describe(),
        })
    }

    /// Rewrite the query with the generator, search with the rewrite, and
    /// answer the original question from those results.
    ///
    /// # Errors
    ///
    /// As [`summarize`](Self::summarize); a generator is always required.
    pub async fn enhanced_search(&self, request: &SearchRequest) -> Result<EnhancedSearchResponse> {
        let rewrite = self.generator()?.generate(&self.templates.rewrite_prompt(&request.query)).await?;
        let enhanced_query = rewrite.trim().to_string();
        debug!(original = %request.query, enhanced = %enhanced_query, "query rewritten");

        let plan = QueryPlan::from_request(request).with_query(enhanced_query.clone());
        let results = self.execute(&plan).await?;
        let summary = self.answer(&request.query, &results).await?;

        Ok(EnhancedSearchResponse {
            enhanced_query,
            summary,
            references: unique_references(&results),
            results,
            filter_used: plan.filter.describe(),
        })
    }

    // ── Introspection ──────────────────────────────────────────────────

    /// List known version labels and the labels present in the collection.
    pub async fn versions(&self) -> Result<VersionsResponse> {
        let records = self.vector_store.get(self.collection(), &MetadataFilter::All, None).await?;
        let database_versions: BTreeSet<String> = records
            .into_iter()
            .map(|r| r.metadata.version_or_commonresource)
            .filter(|v| !v.is_empty())
            .collect();

        Ok(VersionsResponse {
            available_versions: KNOWN_VERSIONS.iter().map(|v| v.to_string()).collect(),
            database_versions: database_versions.into_iter().collect(),
        })
    }

    /// Aggregate statistics over the whole collection.
    pub async fn stats(&self) -> Result<CollectionStats> {
        let records = self.vector_store.get(self.collection(), &MetadataFilter::All, None).await?;
        Ok(CollectionStats::from_records(self.collection(), &records))
    }

    /// Sample the collection's contents.
    pub async fn inspect(&self) -> Result<InspectReport> {
        let count = self.vector_store.count(self.collection()).await?;
        let sample = if count == 0 {
            Vec::new()
        } else {
            self.vector_store
                .get(self.collection(), &MetadataFilter::All, Some(INSPECT_SAMPLE))
                .await?
        };
        Ok(InspectReport::from_sample(count, &sample))
    }

    /// Embed `text` as a query. For diagnostics.
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.embedding_provider.embed_query(text).await
    }

    /// Send `prompt` straight to the generator. For diagnostics.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        self.generator()?.generate(prompt).await
    }
}

/// Builder for constructing a [`SearchService`].
///
/// `embedding_provider` and `vector_store` are required. Without a `chunker`
/// a [`TokenWindowChunker`] sized from the config is used; without a
/// `generator` only the plain search and introspection operations work.
///
/// # Example
///
/// ```rust,ignore
/// let service = SearchService::builder()
///     .config(RagConfig::builder().collection("docs").build()?)
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .generator(Arc::new(generator))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct SearchServiceBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    generator: Option<Arc<dyn TextGenerator>>,
    templates: Option<PromptTemplates>,
}

impl SearchServiceBuilder {
    /// Set the service configuration. Defaults to [`RagConfig::default()`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the text generator used for query rewriting and answers.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the prompt templates.
    pub fn templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Build the [`SearchService`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing.
    pub fn build(self) -> Result<SearchService> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(TokenWindowChunker::new(config.max_tokens, config.chars_per_token))
        });

        Ok(SearchService {
            config,
            embedding_provider,
            vector_store,
            chunker,
            generator: self.generator,
            templates: self.templates.unwrap_or_default(),
        })
    }
}
