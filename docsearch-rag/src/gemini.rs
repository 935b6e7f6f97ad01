//! Gemini embedding and generation provider using the Gemini REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;

/// The default Gemini API base URL.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// The default generation model.
const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash";

/// The default output dimensionality for stored and query embeddings.
const DEFAULT_DIMENSIONS: usize = 768;

const PROVIDER: &str = "Gemini";

/// An [`EmbeddingProvider`] and [`TextGenerator`] backed by the Gemini API.
///
/// Uses `reqwest` to call `embedContent` and `generateContent` directly.
/// Document and query embeddings share one model and one output
/// dimensionality, so vectors written at ingestion and vectors used for search
/// always line up.
///
/// # Configuration
///
/// - `embedding_model` – defaults to `text-embedding-004`.
/// - `generation_model` – defaults to `gemini-2.0-flash`.
/// - `dimensions` – defaults to 768.
/// - `api_key` – from the constructor or the `GEMINI_API_KEY` environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use docsearch_rag::gemini::GeminiClient;
///
/// let gemini = GeminiClient::from_env()?;
/// let vector = gemini.embed_query("how do I reshard").await?;
/// let answer = gemini.generate("Summarize VReplication").await?;
/// ```
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    embedding_model: String,
    generation_model: String,
    dimensions: usize,
}

impl GeminiClient {
    /// Create a new client with the given API key and default models.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::ConfigError("Gemini API key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
            generation_model: DEFAULT_GENERATION_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a new client using the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            RagError::ConfigError("GEMINI_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key)
    }

    /// Point the client at a different API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the embedding model name.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set the generation model name.
    pub fn with_generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = model.into();
        self
    }

    /// Set the output dimensionality used for every embedding request.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    async fn embed(&self, text: &str, task_type: TaskType, title: Option<&str>) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), ?task_type, "embedding text");

        let body = EmbedContentRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content::user(text),
            task_type,
            title,
            output_dimensionality: self.dimensions,
        };

        let response: EmbedContentResponse = self
            .post(&self.endpoint(&self.embedding_model, "embedContent"), &body)
            .await
            .map_err(|message| RagError::EmbeddingError { provider: PROVIDER.into(), message })?;

        Ok(response.embedding.values)
    }

    /// POST a JSON body and decode the JSON reply, turning transport and API
    /// errors into a readable message.
    async fn post<B, R>(&self, url: &str, body: &B) -> std::result::Result<R, String>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                format!("request failed: {e}")
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(format!("API returned {status}: {detail}"));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            format!("failed to parse response: {e}")
        })
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self { role: Some("user".into()), parts: vec![Part { text: Some(text.to_string()) }] }
    }
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content,
    task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    output_dimensionality: usize,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Trait implementations ──────────────────────────────────────────

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed_document(&self, text: &str, title: &str) -> Result<Vec<f32>> {
        self.embed(text, TaskType::RetrievalDocument, Some(title)).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text, TaskType::RetrievalQuery, None).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.generation_model, prompt_len = prompt.len(), "generating");

        let body = GenerateContentRequest { contents: vec![Content::user(prompt)] };
        let response: GenerateContentResponse = self
            .post(&self.endpoint(&self.generation_model, "generateContent"), &body)
            .await
            .map_err(|message| RagError::GenerationError { provider: PROVIDER.into(), message })?;

        response.text().ok_or_else(|| RagError::GenerationError {
            provider: PROVIDER.into(),
            message: "API returned no candidates".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(GeminiClient::new(""), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn endpoint_includes_model_and_method() {
        let client = GeminiClient::new("key").unwrap().with_base_url("http://localhost:9999/v1/");
        assert_eq!(
            client.endpoint("text-embedding-004", "embedContent"),
            "http://localhost:9999/v1/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn document_request_carries_title_and_dimensions() {
        let body = EmbedContentRequest {
            model: "models/text-embedding-004".into(),
            content: Content::user("chunk"),
            task_type: TaskType::RetrievalDocument,
            title: Some("FAQ"),
            output_dimensionality: 768,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["taskType"], "RETRIEVAL_DOCUMENT");
        assert_eq!(value["title"], "FAQ");
        assert_eq!(value["outputDimensionality"], 768);
        assert_eq!(value["content"]["parts"][0]["text"], "chunk");
    }

    #[test]
    fn query_request_omits_title() {
        let body = EmbedContentRequest {
            model: "models/text-embedding-004".into(),
            content: Content::user("q"),
            task_type: TaskType::RetrievalQuery,
            title: None,
            output_dimensionality: 768,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["taskType"], "RETRIEVAL_QUERY");
        assert!(value.get("title").is_none());
    }

    #[test]
    fn generate_response_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "world" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello world"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.text().is_none());
    }
}
