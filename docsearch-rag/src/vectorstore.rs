//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, StoredMatch, StoredRecord};
use crate::error::Result;
use crate::filter::MetadataFilter;

/// A storage backend for chunk embeddings with filtered similarity search.
///
/// Collections use cosine distance. Every method except
/// [`get_or_create_collection`](VectorStore::get_or_create_collection) fails
/// with [`RagError::CollectionNotFound`](crate::RagError::CollectionNotFound)
/// when the collection does not exist yet.
///
/// # Example
///
/// ```rust,ignore
/// use docsearch_rag::{InMemoryVectorStore, MetadataFilter, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.get_or_create_collection("docs").await?;
/// store.upsert("docs", &chunks).await?;
/// let filter = MetadataFilter::for_version("v22.0 (Development)", true);
/// let matches = store.query("docs", &query_embedding, &filter, 10).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection with cosine distance. No-op if it already exists.
    async fn get_or_create_collection(&self, name: &str) -> Result<()>;

    /// Returns `true` if the collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Write chunks into a collection, keyed by chunk id. Chunks must have
    /// embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Return up to `top_k` chunks matching `filter`, nearest first
    /// (ascending distance).
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<StoredMatch>>;

    /// Return stored records matching `filter`, at most `limit` when given.
    async fn get(
        &self,
        collection: &str,
        filter: &MetadataFilter,
        limit: Option<usize>,
    ) -> Result<Vec<StoredRecord>>;

    /// Return the number of chunks in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}
