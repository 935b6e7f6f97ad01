//! Metadata filters for version-scoped retrieval.
//!
//! A [`MetadataFilter`] is built from the requested version label and whether
//! common resources (pages that apply to every version) should be included.
//! Stores either evaluate it in process ([`MetadataFilter::matches`]) or
//! translate it to their own dialect ([`MetadataFilter::to_where_clause`]).

use serde_json::{Value, json};

use crate::document::ChunkMetadata;

/// Titles of pages that apply to every documentation version.
pub const COMMON_RESOURCE_TITLES: [&str; 7] = [
    "Learning Resources",
    "Contribute",
    "Troubleshoot",
    "FAQ",
    "Releases",
    "Roadmap",
    "Design Docs",
];

/// A metadata field a filter can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    VersionOrCommonResource,
    Title,
}

impl MetadataField {
    /// The field's key in stored metadata.
    pub fn key(self) -> &'static str {
        match self {
            Self::VersionOrCommonResource => "version_or_commonresource",
            Self::Title => "title",
        }
    }

    fn value_of(self, metadata: &ChunkMetadata) -> &str {
        match self {
            Self::VersionOrCommonResource => &metadata.version_or_commonresource,
            Self::Title => &metadata.title,
        }
    }
}

/// A predicate over chunk metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MetadataFilter {
    /// No restriction.
    #[default]
    All,
    /// The field equals the value exactly.
    Eq(MetadataField, String),
    /// The field equals one of the values.
    In(MetadataField, Vec<String>),
    /// At least one branch matches.
    Or(Vec<MetadataFilter>),
}

impl MetadataFilter {
    /// Build the filter for a version-scoped query.
    ///
    /// An empty version label means no restriction, whatever
    /// `include_common_resources` says. Otherwise chunks must carry that exact
    /// label, or, when `include_common_resources` is set, have one of the
    /// [`COMMON_RESOURCE_TITLES`] as their title.
    pub fn for_version(version: &str, include_common_resources: bool) -> Self {
        if version.is_empty() {
            return Self::All;
        }

        let version_eq = Self::Eq(MetadataField::VersionOrCommonResource, version.to_string());
        if !include_common_resources {
            return version_eq;
        }

        Self::Or(vec![
            version_eq,
            Self::In(
                MetadataField::Title,
                COMMON_RESOURCE_TITLES.iter().map(|t| t.to_string()).collect(),
            ),
        ])
    }

    /// Returns `true` if the filter places no restriction.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Evaluate the filter against a chunk's metadata.
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        match self {
            Self::All => true,
            Self::Eq(field, value) => field.value_of(metadata) == value,
            Self::In(field, values) => {
                let actual = field.value_of(metadata);
                values.iter().any(|v| v == actual)
            }
            Self::Or(branches) => branches.iter().any(|b| b.matches(metadata)),
        }
    }

    /// Render as a Chroma-style `where` clause.
    ///
    /// Returns `None` for an unrestricted filter since Chroma rejects an empty
    /// `where` object.
    pub fn to_where_clause(&self) -> Option<Value> {
        match self {
            Self::All => None,
            Self::Eq(field, value) => Some(json!({ field.key(): value })),
            Self::In(field, values) => Some(json!({ field.key(): { "$in": values } })),
            Self::Or(branches) => {
                let clauses: Vec<Value> =
                    branches.iter().filter_map(MetadataFilter::to_where_clause).collect();
                Some(json!({ "$or": clauses }))
            }
        }
    }

    /// The filter as reported back to API callers: the `where` clause, or the
    /// string `"None"` when unrestricted.
    pub fn describe(&self) -> Value {
        self.to_where_clause().unwrap_or_else(|| Value::String("None".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn meta(version: &str, title: &str) -> ChunkMetadata {
        ChunkMetadata {
            version_or_commonresource: version.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_version_is_unrestricted() {
        assert_eq!(MetadataFilter::for_version("", true), MetadataFilter::All);
        assert_eq!(MetadataFilter::for_version("", false), MetadataFilter::All);
        assert!(MetadataFilter::for_version("", true).to_where_clause().is_none());
        assert_eq!(MetadataFilter::for_version("", false).describe(), json!("None"));
    }

    #[test]
    fn version_only_is_exact_match() {
        let filter = MetadataFilter::for_version("v21.0 (Stable)", false);
        assert_eq!(
            filter,
            MetadataFilter::Eq(MetadataField::VersionOrCommonResource, "v21.0 (Stable)".into())
        );
        assert!(filter.matches(&meta("v21.0 (Stable)", "Overview")));
        assert!(!filter.matches(&meta("v21.0", "Overview")));
        assert!(!filter.matches(&meta("FAQ", "FAQ")));
        assert_eq!(
            filter.to_where_clause(),
            Some(json!({ "version_or_commonresource": "v21.0 (Stable)" }))
        );
    }

    #[test]
    fn including_common_resources_adds_title_branch() {
        let filter = MetadataFilter::for_version("v22.0", true);
        let MetadataFilter::Or(branches) = &filter else {
            panic!("expected a disjunction, got {filter:?}");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(
            branches[0],
            MetadataFilter::Eq(MetadataField::VersionOrCommonResource, "v22.0".into())
        );
        let MetadataFilter::In(MetadataField::Title, titles) = &branches[1] else {
            panic!("expected title membership, got {:?}", branches[1]);
        };
        let titles: HashSet<&str> = titles.iter().map(String::as_str).collect();
        let expected: HashSet<&str> = COMMON_RESOURCE_TITLES.into_iter().collect();
        assert_eq!(titles, expected);
    }

    #[test]
    fn disjunction_matches_either_branch() {
        let filter = MetadataFilter::for_version("v22.0", true);
        assert!(filter.matches(&meta("v22.0", "VTGate")));
        assert!(filter.matches(&meta("Common Resources", "Roadmap")));
        assert!(!filter.matches(&meta("v20.0 (Stable)", "VTGate")));
        assert!(!filter.matches(&meta("v20.0 (Stable)", "roadmap")));
    }

    #[test]
    fn disjunction_renders_chroma_or_clause() {
        let clause = MetadataFilter::for_version("v22.0", true).to_where_clause().unwrap();
        assert_eq!(clause["$or"][0], json!({ "version_or_commonresource": "v22.0" }));
        assert_eq!(clause["$or"][1]["title"]["$in"].as_array().unwrap().len(), 7);
    }
}
