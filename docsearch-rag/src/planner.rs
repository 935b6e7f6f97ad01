//! Query planning and result scoring.
//!
//! A [`QueryPlan`] captures everything the store needs for one search: the
//! text to embed, the metadata filter and how many neighbours to fetch.
//! [`score_matches`] turns the store's raw matches into [`QueryResult`]s.

use serde::{Deserialize, Serialize};

use crate::document::{QueryResult, StoredMatch};
use crate::filter::MetadataFilter;
use crate::version::DEFAULT_VERSION;

/// Default number of results per search.
pub const DEFAULT_N_RESULTS: usize = 10;

/// A search as requested by a caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Version label to restrict results to. Empty means every version.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
    /// Also return common-resource pages regardless of version.
    #[serde(default = "default_true")]
    pub include_resources: bool,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_n_results() -> usize {
    DEFAULT_N_RESULTS
}

fn default_true() -> bool {
    true
}

impl SearchRequest {
    /// A request for `query` with every other field at its default.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            version: default_version(),
            n_results: DEFAULT_N_RESULTS,
            include_resources: true,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results;
        self
    }

    pub fn with_include_resources(mut self, include: bool) -> Self {
        self.include_resources = include;
        self
    }
}

/// The store-facing form of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Text that will be embedded for the nearest-neighbour search.
    pub query: String,
    pub filter: MetadataFilter,
    pub n_results: usize,
}

impl QueryPlan {
    /// Plan a search for `request`.
    pub fn from_request(request: &SearchRequest) -> Self {
        Self {
            query: request.query.clone(),
            filter: MetadataFilter::for_version(&request.version, request.include_resources),
            n_results: request.n_results,
        }
    }

    /// The same plan with a different text to embed. Used when the query has
    /// been rewritten before searching.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }
}

/// Convert a cosine distance into a similarity score.
pub fn similarity(distance: f32) -> f32 {
    1.0 - distance
}

/// Score raw store matches.
///
/// Order is kept exactly as the store returned it (nearest first); nothing is
/// re-ranked or dropped.
pub fn score_matches(matches: Vec<StoredMatch>) -> Vec<QueryResult> {
    matches
        .into_iter()
        .map(|m| QueryResult {
            document: m.document,
            metadata: m.metadata,
            similarity_score: similarity(m.distance),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ChunkMetadata;
    use crate::filter::MetadataField;

    fn stored(document: &str, distance: f32) -> StoredMatch {
        StoredMatch { document: document.into(), metadata: ChunkMetadata::default(), distance }
    }

    #[test]
    fn similarity_is_one_minus_distance() {
        assert!((similarity(0.1) - 0.9).abs() < 1e-6);
        assert_eq!(similarity(1.0), 0.0);
        assert_eq!(similarity(0.0), 1.0);
    }

    #[test]
    fn scoring_preserves_store_order() {
        let results = score_matches(vec![stored("a", 0.05), stored("b", 0.2), stored("c", 0.2)]);
        let docs: Vec<&str> = results.iter().map(|r| r.document.as_str()).collect();
        assert_eq!(docs, vec!["a", "b", "c"]);
        assert!((results[0].similarity_score - 0.95).abs() < 1e-6);
    }

    #[test]
    fn no_matches_scores_to_nothing() {
        assert!(score_matches(Vec::new()).is_empty());
    }

    #[test]
    fn request_defaults_follow_the_api() {
        let request: SearchRequest =
            serde_json::from_value(serde_json::json!({ "query": "vtctl" })).unwrap();
        assert_eq!(request, SearchRequest::new("vtctl"));
        assert_eq!(request.version, "v22.0 (Development)");
        assert_eq!(request.n_results, 10);
        assert!(request.include_resources);
    }

    #[test]
    fn plan_builds_filter_from_request() {
        let request = SearchRequest::new("backups")
            .with_version("v20.0 (Stable)")
            .with_include_resources(false)
            .with_n_results(3);
        let plan = QueryPlan::from_request(&request);
        assert_eq!(plan.n_results, 3);
        assert_eq!(
            plan.filter,
            MetadataFilter::Eq(MetadataField::VersionOrCommonResource, "v20.0 (Stable)".into())
        );

        let rewritten = plan.with_query("database backups and restores");
        assert_eq!(rewritten.query, "database backups and restores");
    }

    #[test]
    fn empty_version_plans_unrestricted_search() {
        let plan = QueryPlan::from_request(&SearchRequest::new("x").with_version(""));
        assert!(plan.filter.is_empty());
    }
}
