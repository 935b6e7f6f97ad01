//! Data types for documents, chunks, stored records and query results.

use serde::{Deserialize, Deserializer, Serialize};

/// Title used when a scraped page carries none.
pub const DEFAULT_TITLE: &str = "Vitess Documentation";

/// A scraped documentation page.
///
/// Missing fields fall back to defaults instead of failing the whole corpus:
/// the title becomes [`DEFAULT_TITLE`], everything else empty or zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Identifier assigned by the scraper, stable across re-ingestion.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id_parent: u64,
    /// Page title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Source URL of the page.
    #[serde(default)]
    pub url: String,
    /// Documentation version (e.g. `v22.0 (Development)`) or common-resource category.
    #[serde(default)]
    pub version_or_commonresource: String,
    /// Raw page text.
    #[serde(default)]
    pub content: String,
    /// Character count recorded by the scraper.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub char_count: u64,
    /// Approximate token count recorded by the scraper.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub approx_token_count: u64,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Document {
    /// Metadata shared by every chunk of this document.
    pub fn chunk_metadata(&self, chunk_index: usize, total_chunks: usize) -> ChunkMetadata {
        ChunkMetadata {
            id_parent: self.id_parent,
            title: self.title.clone(),
            url: self.url.clone(),
            version_or_commonresource: self.version_or_commonresource.clone(),
            char_count: self.char_count,
            approx_token_count: self.approx_token_count,
            chunk_index,
            total_chunks,
        }
    }
}

/// Typed metadata stored next to every chunk.
///
/// Numeric fields are written as numbers. On read they also accept numeric
/// strings, which is how older collections stored them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id_parent: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub version_or_commonresource: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub char_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub approx_token_count: u64,
    /// Position of the chunk within its document (0-based).
    #[serde(default, deserialize_with = "lenient_usize")]
    pub chunk_index: usize,
    /// Number of chunks the document was split into.
    #[serde(default = "one", deserialize_with = "lenient_usize")]
    pub total_chunks: usize,
}

fn one() -> usize {
    1
}

/// A segment of a [`Document`] ready to be stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Freshly generated unique identifier. Carries no meaning beyond uniqueness.
    pub id: String,
    /// The normalized text of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until the ingestion
    /// step attaches one.
    pub embedding: Vec<f32>,
    /// Metadata copied from the parent document plus the chunk position.
    pub metadata: ChunkMetadata,
}

/// A raw nearest-neighbour match as returned by a [`VectorStore`](crate::VectorStore).
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMatch {
    /// Stored chunk text.
    pub document: String,
    /// Stored chunk metadata.
    pub metadata: ChunkMetadata,
    /// Cosine distance between the query and the chunk, in `[0, 1]` for
    /// normalized embeddings.
    pub distance: f32,
}

/// A stored record returned by a metadata `get`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub document: String,
    pub metadata: ChunkMetadata,
}

/// A scored search hit handed back to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// The chunk text.
    pub document: String,
    /// The chunk metadata.
    pub metadata: ChunkMetadata,
    /// `1 - distance`; higher is more relevant.
    pub similarity_score: f32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Float(f64),
    Text(String),
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        NumberOrString::Float(f) => {
            Err(serde::de::Error::custom(format!("expected a whole number, got {f}")))
        }
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{s}'"))),
    }
}

fn lenient_usize<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_u64(deserializer).map(|n| n as usize)
}
