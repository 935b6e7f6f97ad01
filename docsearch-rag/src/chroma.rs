//! Chroma vector store backend.
//!
//! Provides [`ChromaVectorStore`] which implements [`VectorStore`] against a
//! Chroma server's v2 HTTP API using `reqwest`. Collections live under a
//! tenant and database (`default_tenant` / `default_database` unless set) and
//! are created with the cosine distance space.
//!
//! # Example
//!
//! ```rust,ignore
//! use docsearch_rag::chroma::ChromaVectorStore;
//!
//! let store = ChromaVectorStore::new("http://localhost:8000")?.with_database("docs");
//! store.get_or_create_collection("vitess_docs_v1").await?;
//! let count = store.count("vitess_docs_v1").await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::document::{Chunk, ChunkMetadata, StoredMatch, StoredRecord};
use crate::error::{RagError, Result};
use crate::filter::MetadataFilter;
use crate::vectorstore::VectorStore;

const BACKEND: &str = "chroma";

/// Tenant used by a Chroma server with no multi-tenancy configured.
pub const DEFAULT_TENANT: &str = "default_tenant";

/// Database used by a Chroma server with no extra databases configured.
pub const DEFAULT_DATABASE: &str = "default_database";

/// A [`VectorStore`] backed by a [Chroma](https://www.trychroma.com/) server.
///
/// Collection names are resolved to Chroma collection ids once and cached.
/// Chunk metadata is written as a flat JSON object and read back leniently.
pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: Url,
    tenant: String,
    database: String,
    collection_ids: RwLock<HashMap<String, String>>,
}

impl ChromaVectorStore {
    /// Create a store talking to the Chroma server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            RagError::ConfigError(format!("invalid Chroma URL '{base_url}': {e}"))
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            tenant: DEFAULT_TENANT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection_ids: RwLock::default(),
        })
    }

    /// Create a store for `host:port` over plain HTTP.
    pub fn from_host(host: &str, port: u16) -> Result<Self> {
        Self::new(&format!("http://{host}:{port}"))
    }

    /// Set the tenant that owns the collections.
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    /// Set the database that holds the collections.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Path of the collections resource, followed by `rest`.
    fn collections_path(&self, rest: &str) -> String {
        format!("api/v2/tenants/{}/databases/{}/collections{rest}", self.tenant, self.database)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| RagError::ConfigError(format!("invalid path '{path}': {e}")))
    }

    fn map_err(e: reqwest::Error) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!("server returned {status}: {body}"),
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let response =
            self.client.post(self.url(path)?).json(body).send().await.map_err(Self::map_err)?;
        Self::check(response).await
    }

    /// Look up the Chroma id for a collection name, caching the answer.
    async fn collection_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.collection_ids.read().await.get(name) {
            return Ok(id.clone());
        }

        let response = self
            .client
            .get(self.url(&self.collections_path(&format!("/{name}")))?)
            .send()
            .await
            .map_err(Self::map_err)?;

        // Unknown collections come back as 404, or on some server builds as an
        // error body mentioning "does not exist".
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RagError::CollectionNotFound(name.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("does not exist") {
                return Err(RagError::CollectionNotFound(name.to_string()));
            }
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!("failed to resolve collection '{name}': {status}: {body}"),
            });
        }

        let collection: CollectionInfo = response.json().await.map_err(Self::map_err)?;
        self.collection_ids.write().await.insert(name.to_string(), collection.id.clone());
        Ok(collection.id)
    }
}

// ── Chroma API request/response types ──────────────────────────────

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
    metadatas: Vec<Value>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    where_clause: Option<Value>,
    include: [&'static str; 3],
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<ChunkMetadata>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

#[derive(Serialize)]
struct GetRequest {
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    where_clause: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    include: [&'static str; 2],
}

#[derive(Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<ChunkMetadata>>>,
}

/// Chroma nests query columns one list per query embedding; only one is sent.
fn first_list<T>(lists: Option<Vec<Vec<T>>>) -> Vec<T> {
    lists.and_then(|l| l.into_iter().next()).unwrap_or_default()
}

impl QueryResponse {
    /// Flatten the single-query result lists into matches, nearest first.
    fn into_matches(self) -> Vec<StoredMatch> {
        let documents = first_list(self.documents);
        let mut metadatas = first_list(self.metadatas).into_iter();
        let mut distances = first_list(self.distances).into_iter();

        documents
            .into_iter()
            .map(|document| StoredMatch {
                document: document.unwrap_or_default(),
                metadata: metadatas.next().flatten().unwrap_or_default(),
                distance: distances.next().unwrap_or(1.0),
            })
            .collect()
    }
}

impl GetResponse {
    fn into_records(self) -> Vec<StoredRecord> {
        let mut documents = self.documents.unwrap_or_default().into_iter();
        let mut metadatas = self.metadatas.unwrap_or_default().into_iter();

        self.ids
            .into_iter()
            .map(|id| StoredRecord {
                id,
                document: documents.next().flatten().unwrap_or_default(),
                metadata: metadatas.next().flatten().unwrap_or_default(),
            })
            .collect()
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<()> {
        let body = json!({
            "name": name,
            "metadata": { "hnsw:space": "cosine" },
            "get_or_create": true,
        });
        let collection: CollectionInfo =
            self.post(&self.collections_path(""), &body).await?.json().await.map_err(Self::map_err)?;

        debug!(collection = name, id = %collection.id, "chroma collection ready");
        self.collection_ids.write().await.insert(name.to_string(), collection.id);
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        match self.collection_id(name).await {
            Ok(_) => Ok(true),
            Err(RagError::CollectionNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let id = self.collection_id(collection).await?;

        let metadatas = chunks
            .iter()
            .map(|c| serde_json::to_value(&c.metadata))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!("failed to encode metadata: {e}"),
            })?;

        let body = UpsertRequest {
            ids: chunks.iter().map(|c| c.id.as_str()).collect(),
            embeddings: chunks.iter().map(|c| c.embedding.as_slice()).collect(),
            documents: chunks.iter().map(|c| c.text.as_str()).collect(),
            metadatas,
        };
        self.post(&self.collections_path(&format!("/{id}/upsert")), &body).await?;

        debug!(collection, count = chunks.len(), "upserted chunks to chroma");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<StoredMatch>> {
        let id = self.collection_id(collection).await?;
        let body = QueryRequest {
            query_embeddings: [embedding],
            n_results: top_k,
            where_clause: filter.to_where_clause(),
            include: ["documents", "metadatas", "distances"],
        };

        let response: QueryResponse = self
            .post(&self.collections_path(&format!("/{id}/query")), &body)
            .await?
            .json()
            .await
            .map_err(Self::map_err)?;

        Ok(response.into_matches())
    }

    async fn get(
        &self,
        collection: &str,
        filter: &MetadataFilter,
        limit: Option<usize>,
    ) -> Result<Vec<StoredRecord>> {
        let id = self.collection_id(collection).await?;
        let body = GetRequest {
            where_clause: filter.to_where_clause(),
            limit,
            include: ["documents", "metadatas"],
        };

        let response: GetResponse = self
            .post(&self.collections_path(&format!("/{id}/get")), &body)
            .await?
            .json()
            .await
            .map_err(Self::map_err)?;

        Ok(response.into_records())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let id = self.collection_id(collection).await?;
        let response = self
            .client
            .get(self.url(&self.collections_path(&format!("/{id}/count")))?)
            .send()
            .await
            .map_err(Self::map_err)?;

        Self::check(response).await?.json().await.map_err(Self::map_err)
    }
}
