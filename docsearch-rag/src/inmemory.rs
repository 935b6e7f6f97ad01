//! In-memory vector store using cosine distance.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by an
//! ordered `Vec` per collection plus an id index, protected by a
//! `tokio::sync::RwLock`. It is suitable
//! for development, testing, and running without a Chroma server.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, StoredMatch, StoredRecord};
use crate::error::{RagError, Result};
use crate::filter::MetadataFilter;
use crate::vectorstore::VectorStore;

/// An in-memory vector store using cosine distance for search.
///
/// Chunks keep insertion order so `get` is deterministic; upserting an id
/// that is already present replaces the stored chunk in place.
///
/// # Example
///
/// ```rust,ignore
/// use docsearch_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.get_or_create_collection("docs").await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

/// Chunks in insertion order, with each id's position in `chunks`.
#[derive(Debug, Default)]
struct Collection {
    chunks: Vec<Chunk>,
    positions: HashMap<String, usize>,
}

impl Collection {
    fn upsert(&mut self, chunk: &Chunk) {
        match self.positions.get(&chunk.id) {
            Some(&position) => self.chunks[position] = chunk.clone(),
            None => {
                self.positions.insert(chunk.id.clone(), self.chunks.len());
                self.chunks.push(chunk.clone());
            }
        }
    }
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine distance (`1 - cosine similarity`) between two vectors.
///
/// Returns 1.0 if either vector has zero magnitude.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

fn missing(collection: &str) -> RagError {
    RagError::CollectionNotFound(collection.to_string())
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for chunk in chunks {
            store.upsert(chunk);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<StoredMatch>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        let mut matches: Vec<StoredMatch> = store
            .chunks
            .iter()
            .filter(|chunk| filter.matches(&chunk.metadata))
            .map(|chunk| StoredMatch {
                document: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                distance: cosine_distance(&chunk.embedding, embedding),
            })
            .collect();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn get(
        &self,
        collection: &str,
        filter: &MetadataFilter,
        limit: Option<usize>,
    ) -> Result<Vec<StoredRecord>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        Ok(store
            .chunks
            .iter()
            .filter(|chunk| filter.matches(&chunk.metadata))
            .take(limit.unwrap_or(usize::MAX))
            .map(|chunk| StoredRecord {
                id: chunk.id.clone(),
                document: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.chunks.len()).ok_or_else(|| missing(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ChunkMetadata;

    fn chunk(id: &str, version: &str, title: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("text of {id}"),
            embedding,
            metadata: ChunkMetadata {
                version_or_commonresource: version.to_string(),
                title: title.to_string(),
                total_chunks: 1,
                ..Default::default()
            },
        }
    }

    #[test]
    fn cosine_distance_bounds() {
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 3.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[tokio::test]
    async fn missing_collection_is_reported() {
        let store = InMemoryVectorStore::new();
        let err = store.count("nope").await.unwrap_err();
        assert!(matches!(err, RagError::CollectionNotFound(name) if name == "nope"));
        assert!(!store.collection_exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn query_applies_filter_and_orders_by_distance() {
        let store = InMemoryVectorStore::new();
        store.get_or_create_collection("docs").await.unwrap();
        store
            .upsert(
                "docs",
                &[
                    chunk("far", "v22.0", "VTGate", vec![0.0, 1.0]),
                    chunk("near", "v22.0", "VTTablet", vec![1.0, 0.1]),
                    chunk("other", "v20.0", "VTGate", vec![1.0, 0.0]),
                    chunk("faq", "Common", "FAQ", vec![1.0, 0.5]),
                ],
            )
            .await
            .unwrap();

        let filter = MetadataFilter::for_version("v22.0", true);
        let matches = store.query("docs", &[1.0, 0.0], &filter, 10).await.unwrap();
        let docs: Vec<&str> = matches.iter().map(|m| m.document.as_str()).collect();
        assert_eq!(docs, vec!["text of near", "text of faq", "text of far"]);

        let top = store.query("docs", &[1.0, 0.0], &MetadataFilter::All, 1).await.unwrap();
        assert_eq!(top[0].document, "text of other");
    }

    #[tokio::test]
    async fn upsert_replaces_same_id() {
        let store = InMemoryVectorStore::new();
        store.get_or_create_collection("docs").await.unwrap();
        store.upsert("docs", &[chunk("a", "v1", "A", vec![1.0])]).await.unwrap();
        store.upsert("docs", &[chunk("a", "v2", "A", vec![1.0])]).await.unwrap();
        assert_eq!(store.count("docs").await.unwrap(), 1);

        let records = store.get("docs", &MetadataFilter::All, None).await.unwrap();
        assert_eq!(records[0].metadata.version_or_commonresource, "v2");
    }

    #[tokio::test]
    async fn replacement_keeps_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.get_or_create_collection("docs").await.unwrap();
        let batch: Vec<Chunk> =
            ["a", "b", "c"].iter().map(|id| chunk(id, "v1", "A", vec![1.0])).collect();
        store.upsert("docs", &batch).await.unwrap();
        store
            .upsert("docs", &[chunk("b", "v2", "B", vec![1.0]), chunk("d", "v1", "D", vec![1.0])])
            .await
            .unwrap();

        let records = store.get("docs", &MetadataFilter::All, None).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(records[1].metadata.title, "B");
    }

    #[tokio::test]
    async fn get_respects_limit() {
        let store = InMemoryVectorStore::new();
        store.get_or_create_collection("docs").await.unwrap();
        let chunks: Vec<Chunk> =
            (0..5).map(|i| chunk(&format!("c{i}"), "v1", "A", vec![1.0])).collect();
        store.upsert("docs", &chunks).await.unwrap();

        let records = store.get("docs", &MetadataFilter::All, Some(3)).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2"]);
    }
}
