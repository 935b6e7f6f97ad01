//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Documents and queries are embedded through separate methods because
/// retrieval models use different task semantics for each. Both must come out
/// of the same model with the same dimensionality, otherwise query results
/// silently degrade.
///
/// # Example
///
/// ```rust,ignore
/// use docsearch_rag::EmbeddingProvider;
///
/// let chunk_vec = provider.embed_document("VTGate routes queries...", "VTGate").await?;
/// let query_vec = provider.embed_query("what does vtgate do").await?;
/// assert_eq!(chunk_vec.len(), query_vec.len());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a chunk of a document for storage. `title` is passed to the
    /// model as context.
    async fn embed_document(&self, text: &str, title: &str) -> Result<Vec<f32>>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
