//! Prompt construction for query rewriting and cited answer synthesis.
//!
//! Templates use two placeholders: `{query}` for the user's question and
//! `{snippets}` for the numbered search results. Snippet `n` is the `n`-th
//! result in search order, so `[n]` citations in the answer map straight back
//! to it.

use std::collections::HashSet;
use std::fmt::Write;

use serde::Serialize;

use crate::document::QueryResult;

const DEFAULT_REWRITE_TEMPLATE: &str = r#"You are a search query enhancer for Vitess documentation search system.
Your task is to improve the user's search query to make it more effective for semantic search in a vector database.

Original query: "{query}"

Enhance this query by:
1. Expanding the user query to make it more accurate in vector database search
2. Expanding abbreviations like 'CLI' to 'Command Line Interface'
3. Including synonyms for technical terms
4. Improving specificity while maintaining the original intent

Return ONLY the enhanced query text with no explanations or additional text.
"#;

const DEFAULT_SUMMARY_TEMPLATE: &str = r#"You are a technical documentation assistant for Vitess. Your task is to answer the user's question using the provided documentation snippets.

Follow these guidelines when creating your response:
1. Answer the question clearly and concisely based on the documentation provided
2. Maintain technical accuracy and use Vitess terminology correctly
3. Format your response with proper markdown for readability
4. When referencing specific parts of the documentation, use citations like [1], [2], etc. The number is the document number of the snippet.
5. For code examples or CLI commands, use proper markdown code blocks with appropriate syntax highlighting
6. At the end of your response, include a "References" section with numbered links to the source documentation
7. IMPORTANT: In the References section, ensure each unique URL appears only once. Do not duplicate URLs.
   Example of correct formatting:
   References:
   [1] https://vitess.io/docs/22.0/overview/
   [2] https://vitess.io/docs/22.0/overview/architecture/

User question: {query}

Here are the documentation snippets:
{snippets}
"#;

/// Message returned instead of a synthesized answer when the search found nothing.
pub const NO_RESULTS_MESSAGE: &str = "No results found for your query.";

/// Prompt templates for the two generation steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    /// Template asking the model to rewrite a query. Uses `{query}`.
    pub rewrite: String,
    /// Template asking the model to answer from snippets. Uses `{query}` and `{snippets}`.
    pub summary: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self { rewrite: DEFAULT_REWRITE_TEMPLATE.into(), summary: DEFAULT_SUMMARY_TEMPLATE.into() }
    }
}

impl PromptTemplates {
    /// Prompt asking the model to rewrite `query` for vector search.
    pub fn rewrite_prompt(&self, query: &str) -> String {
        fill(&self.rewrite, &[("{query}", query)])
    }

    /// Prompt asking the model to answer `query` from `results` with citations.
    pub fn summary_prompt(&self, query: &str, results: &[QueryResult]) -> String {
        let snippets = format_snippets(results);
        fill(&self.summary, &[("{query}", query), ("{snippets}", &snippets)])
    }
}

/// Substitute placeholders in one left-to-right pass; inserted values are
/// never scanned again.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render results as numbered snippet blocks, numbered from 1 in result order.
pub fn format_snippets(results: &[QueryResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let meta = &result.metadata;
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "\nDocument {}: {}\nContent: {}\nURL: {}\nVersion: {}\nSimilarity Score: {:.1}%\n",
            i + 1,
            meta.title,
            result.document,
            meta.url,
            meta.version_or_commonresource,
            result.similarity_score * 100.0,
        );
    }
    out
}

/// A source listed under an answer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Reference {
    /// Citation number; the first snippet that carried this URL.
    pub number: usize,
    pub title: String,
    pub url: String,
}

/// The reference list for `results`: one entry per unique URL, in order of
/// first appearance, numbered by the snippet it first appeared in.
pub fn unique_references(results: &[QueryResult]) -> Vec<Reference> {
    let mut seen = HashSet::new();
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.metadata.url.is_empty() && seen.insert(r.metadata.url.as_str()))
        .map(|(i, r)| Reference {
            number: i + 1,
            title: r.metadata.title.clone(),
            url: r.metadata.url.clone(),
        })
        .collect()
}
