//! Configuration for the search service.

use serde::{Deserialize, Serialize};

use crate::chunking::{DEFAULT_CHARS_PER_TOKEN, DEFAULT_MAX_TOKENS};
use crate::error::{RagError, Result};

/// Default name of the collection holding documentation chunks.
pub const DEFAULT_COLLECTION: &str = "vitess_docs_v1";

/// Configuration parameters for the search service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagConfig {
    /// Vector store collection that holds the chunks.
    pub collection: String,
    /// Token budget per chunk.
    pub max_tokens: usize,
    /// Characters counted per token when sizing chunks.
    pub chars_per_token: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the token budget per chunk.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the characters-per-token ratio.
    pub fn chars_per_token(mut self, chars_per_token: usize) -> Self {
        self.config.chars_per_token = chars_per_token;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `collection` is empty or blank
    /// - `max_tokens == 0`
    /// - `chars_per_token == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection must not be empty".to_string()));
        }
        if self.config.max_tokens == 0 {
            return Err(RagError::ConfigError("max_tokens must be greater than zero".to_string()));
        }
        if self.config.chars_per_token == 0 {
            return Err(RagError::ConfigError(
                "chars_per_token must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_collection() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config.collection, "vitess_docs_v1");
        assert_eq!(config.max_tokens * config.chars_per_token, 8000);
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(matches!(
            RagConfig::builder().collection("  ").build(),
            Err(RagError::ConfigError(_))
        ));
        assert!(RagConfig::builder().max_tokens(0).build().is_err());
        assert!(RagConfig::builder().chars_per_token(0).build().is_err());
    }

    #[test]
    fn builder_overrides() {
        let config =
            RagConfig::builder().collection("docs").max_tokens(10).chars_per_token(2).build().unwrap();
        assert_eq!(config, RagConfig { collection: "docs".into(), max_tokens: 10, chars_per_token: 2 });
    }
}
