//! Document chunking.
//!
//! Page content is normalized to single-spaced text and cut into windows of at
//! most `max_tokens * chars_per_token` characters. Cuts prefer the last space
//! inside the window; the space itself is dropped and becomes the boundary
//! between two chunks.

use tracing::warn;
use uuid::Uuid;

use crate::document::{Chunk, Document};

/// Default token budget per chunk.
pub const DEFAULT_MAX_TOKENS: usize = 2000;

/// Default characters-per-token ratio. An approximation, not a tokenizer.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// A strategy for splitting page content into chunks.
///
/// Implementations only decide where text is cut. [`Chunker::chunk`] attaches
/// ids and metadata; embeddings are attached later by the ingestion step.
pub trait Chunker: Send + Sync {
    /// Split `content` into ordered, non-overlapping text segments.
    fn split(&self, content: &str) -> Vec<String>;

    /// Split a document into chunks carrying its metadata.
    ///
    /// Every chunk gets a fresh UUID, so ingesting the same document twice
    /// stores it twice.
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let pieces = self.split(&document.content);
        let total = pieces.len();

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: Uuid::new_v4().to_string(),
                text,
                embedding: Vec::new(),
                metadata: document.chunk_metadata(i, total),
            })
            .collect()
    }
}

/// Collapse every run of whitespace (newlines and carriage returns included)
/// into a single space and strip the ends.
///
/// Line structure is lost. Applying it twice is the same as applying it once.
pub fn normalize_whitespace(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits normalized text into windows bounded by an approximate token budget.
///
/// Lengths are measured in characters, not bytes, so multi-byte text is never
/// cut inside a code point.
///
/// When a window holds no space at all the cut is made at the window edge and
/// the character right after it is skipped, the same as a space would be.
/// That character is lost; a warning is logged with its position.
///
/// Text that fits the budget, including empty text, comes back as exactly one
/// chunk.
///
/// # Example
///
/// ```rust,ignore
/// use docsearch_rag::{Chunker, TokenWindowChunker};
///
/// let chunker = TokenWindowChunker::new(2000, 4);
/// let pieces = chunker.split(&page.content);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenWindowChunker {
    max_tokens: usize,
    chars_per_token: usize,
}

impl Default for TokenWindowChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS, DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenWindowChunker {
    /// Create a new `TokenWindowChunker`.
    ///
    /// # Arguments
    ///
    /// * `max_tokens` - token budget per chunk
    /// * `chars_per_token` - characters counted per token
    pub fn new(max_tokens: usize, chars_per_token: usize) -> Self {
        Self { max_tokens, chars_per_token }
    }

    /// Maximum number of characters in a chunk.
    pub fn max_chars(&self) -> usize {
        self.max_tokens.saturating_mul(self.chars_per_token)
    }
}

impl Chunker for TokenWindowChunker {
    fn split(&self, content: &str) -> Vec<String> {
        let normalized = normalize_whitespace(content);
        let max_chars = self.max_chars();

        let chars: Vec<char> = normalized.chars().collect();
        let len = chars.len();
        if len <= max_chars {
            return vec![normalized];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + max_chars).min(len);

            if end < len {
                match chars[start..end].iter().rposition(|c| *c == ' ') {
                    Some(offset) => end = start + offset,
                    None => warn!(
                        position = end,
                        max_chars, "no space in chunk window, cutting mid-word and dropping one character"
                    ),
                }
            }

            chunks.push(chars[start..end].iter().collect());
            start = end + 1;
        }

        chunks
    }
}
