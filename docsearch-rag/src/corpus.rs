//! Loading the scraped documentation corpus.
//!
//! The scraper writes a YAML file with every page listed under a top-level
//! `vitess` key:
//!
//! ```yaml
//! vitess:
//!   - id_parent: 1
//!     title: Overview
//!     url: https://vitess.io/docs/22.0/overview/
//!     version_or_commonresource: v22.0 (Development)
//!     content: "Vitess is a database clustering system..."
//!     char_count: 41
//!     approx_token_count: 10
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::document::Document;
use crate::error::{RagError, Result};

#[derive(Debug, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    vitess: Vec<Document>,
}

/// Parse a corpus from YAML text.
pub fn parse_corpus(yaml: &str) -> Result<Vec<Document>> {
    let file: CorpusFile = serde_yaml::from_str(yaml)
        .map_err(|e| RagError::CorpusError(format!("invalid corpus YAML: {e}")))?;
    Ok(file.vitess)
}

/// Read and parse the corpus file at `path`.
///
/// # Errors
///
/// Returns [`RagError::CorpusError`] if the file cannot be read or parsed.
pub async fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RagError::CorpusError(format!("failed to read {}: {e}", path.display())))?;
    let documents = parse_corpus(&yaml)?;
    info!(path = %path.display(), document_count = documents.len(), "loaded corpus");
    Ok(documents)
}
