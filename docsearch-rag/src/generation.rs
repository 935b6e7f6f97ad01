//! Text generation trait used for query rewriting and answer synthesis.

use async_trait::async_trait;

use crate::error::Result;

/// A best-effort natural-language completion backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
