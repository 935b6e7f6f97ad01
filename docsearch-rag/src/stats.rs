//! Read-only projections over stored chunks: collection statistics and
//! inspection samples.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use url::Url;

use crate::document::{ChunkMetadata, StoredRecord};
use crate::filter::COMMON_RESOURCE_TITLES;
use crate::version::newest_first;

/// How many titles [`CollectionStats::document_titles`] lists.
const TOP_TITLES: usize = 10;

/// How many records an [`InspectReport`] previews.
const SAMPLE_RECORDS: usize = 3;

/// Characters of chunk text shown in a preview.
const PREVIEW_CHARS: usize = 100;

/// A label with the number of chunks carrying it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub total_records: usize,
    pub unique_documents: usize,
    pub multi_chunk_documents: usize,
    pub max_chunks_per_document: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VersionStatistics {
    pub unique_versions: usize,
    /// Chunk counts per version label, newest first.
    pub version_counts: Vec<LabelCount>,
    pub latest_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContentStatistics {
    pub total_chunks: usize,
    /// Mean chunk length in characters; `None` for an empty collection.
    pub avg_chunk_size: Option<f64>,
    pub max_chunk_size: usize,
    pub multi_chunk_docs: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommonResources {
    pub found_resources: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentTitles {
    pub unique_titles: usize,
    /// Most frequent titles, most frequent first.
    pub top_titles: Vec<LabelCount>,
}

/// Aggregate statistics over every chunk in a collection.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionStats {
    pub collection_info: CollectionInfo,
    pub version_statistics: VersionStatistics,
    pub content_statistics: ContentStatistics,
    pub common_resources: CommonResources,
    pub document_titles: DocumentTitles,
    pub url_domains: BTreeMap<String, usize>,
}

impl CollectionStats {
    /// Compute statistics for `records` stored in collection `name`.
    pub fn from_records(name: &str, records: &[StoredRecord]) -> Self {
        let mut versions: HashMap<&str, usize> = HashMap::new();
        let mut titles: HashMap<&str, usize> = HashMap::new();
        let mut url_domains: BTreeMap<String, usize> = BTreeMap::new();
        let mut chunks_per_document: HashMap<u64, usize> = HashMap::new();
        let mut common_resources: Vec<String> = Vec::new();
        let mut total_chars = 0usize;
        let mut max_chunk_size = 0usize;

        for record in records {
            let meta = &record.metadata;
            *versions.entry(version_label(meta)).or_default() += 1;
            *titles.entry(title_label(meta)).or_default() += 1;

            if looks_like_common_resource(&meta.title) && !common_resources.contains(&meta.title) {
                common_resources.push(meta.title.clone());
            }

            if let Some(domain) = url_domain(&meta.url) {
                *url_domains.entry(domain).or_default() += 1;
            }

            chunks_per_document.entry(meta.id_parent).or_insert(meta.total_chunks);

            let size = record.document.chars().count();
            total_chars += size;
            max_chunk_size = max_chunk_size.max(size);
        }

        let multi_chunk_documents = chunks_per_document.values().filter(|&&n| n > 1).count();

        let mut version_counts = into_label_counts(versions);
        version_counts.sort_by(|a, b| newest_first(&a.label, &b.label));

        let mut top_titles = into_label_counts(titles);
        let unique_titles = top_titles.len();
        top_titles.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        top_titles.truncate(TOP_TITLES);

        Self {
            collection_info: CollectionInfo {
                name: name.to_string(),
                total_records: records.len(),
                unique_documents: chunks_per_document.len(),
                multi_chunk_documents,
                max_chunks_per_document: chunks_per_document.values().copied().max().unwrap_or(0),
            },
            version_statistics: VersionStatistics {
                unique_versions: version_counts.len(),
                latest_version: version_counts.first().map(|v| v.label.clone()),
                version_counts,
            },
            content_statistics: ContentStatistics {
                total_chunks: records.len(),
                avg_chunk_size: (!records.is_empty())
                    .then(|| total_chars as f64 / records.len() as f64),
                max_chunk_size,
                multi_chunk_docs: multi_chunk_documents,
            },
            common_resources: CommonResources {
                count: common_resources.len(),
                found_resources: common_resources,
            },
            document_titles: DocumentTitles { unique_titles, top_titles },
            url_domains,
        }
    }
}

fn version_label(meta: &ChunkMetadata) -> &str {
    if meta.version_or_commonresource.is_empty() { "unknown" } else { &meta.version_or_commonresource }
}

fn title_label(meta: &ChunkMetadata) -> &str {
    if meta.title.is_empty() { "untitled" } else { &meta.title }
}

fn into_label_counts(counts: HashMap<&str, usize>) -> Vec<LabelCount> {
    counts.into_iter().map(|(label, count)| LabelCount { label: label.to_string(), count }).collect()
}

/// Case-insensitive containment, so "FAQ - Vitess" still counts as the FAQ.
fn looks_like_common_resource(title: &str) -> bool {
    let title = title.to_lowercase();
    COMMON_RESOURCE_TITLES.iter().any(|t| title.contains(&t.to_lowercase()))
}

/// Host part of a URL. Scheme-less values such as `vitess.io/docs` fall back
/// to the text before the first `/`.
fn url_domain(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .or_else(|| {
            let rest = url.split_once("//").map_or(url, |(_, rest)| rest);
            rest.split('/').next().filter(|host| !host.is_empty()).map(str::to_string)
        })
}

/// A preview of one stored record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SampleRecord {
    pub id: String,
    pub metadata: ChunkMetadata,
    pub document_preview: String,
}

/// A quick look at what a collection holds.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InspectReport {
    Empty {
        message: String,
    },
    Populated {
        document_count: usize,
        metadata_fields: Vec<String>,
        has_version_field: bool,
        version_values: Vec<String>,
        sample_documents: Vec<SampleRecord>,
    },
}

impl InspectReport {
    /// Build a report from the collection size and a handful of sample records.
    pub fn from_sample(document_count: usize, sample: &[StoredRecord]) -> Self {
        if document_count == 0 {
            return Self::Empty { message: "No documents in database".to_string() };
        }

        let metadata_fields: BTreeSet<String> = sample
            .iter()
            .filter_map(|r| serde_json::to_value(&r.metadata).ok())
            .filter_map(|v| v.as_object().map(|o| o.keys().cloned().collect::<Vec<_>>()))
            .flatten()
            .collect();

        let version_values: BTreeSet<String> = sample
            .iter()
            .map(|r| r.metadata.version_or_commonresource.clone())
            .filter(|v| !v.is_empty())
            .collect();

        Self::Populated {
            document_count,
            metadata_fields: metadata_fields.into_iter().collect(),
            has_version_field: !version_values.is_empty(),
            version_values: version_values.into_iter().collect(),
            sample_documents: sample
                .iter()
                .take(SAMPLE_RECORDS)
                .map(|r| SampleRecord {
                    id: r.id.clone(),
                    metadata: r.metadata.clone(),
                    document_preview: preview(&r.document),
                })
                .collect(),
        }
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id_parent: u64, version: &str, title: &str, url: &str, text: &str, total: usize) -> StoredRecord {
        StoredRecord {
            id: format!("{id_parent}-{title}-{}", text.len()),
            document: text.to_string(),
            metadata: ChunkMetadata {
                id_parent,
                title: title.to_string(),
                url: url.to_string(),
                version_or_commonresource: version.to_string(),
                total_chunks: total,
                ..Default::default()
            },
        }
    }

    fn sample() -> Vec<StoredRecord> {
        vec![
            record(1, "v21.0 (Stable)", "VTGate", "https://vitess.io/docs/21.0/vtgate/", "abcd", 2),
            record(1, "v21.0 (Stable)", "VTGate", "https://vitess.io/docs/21.0/vtgate/", "ef", 2),
            record(2, "v22.0 (Development)", "VTGate", "https://vitess.io/docs/22.0/vtgate/", "abcdef", 1),
            record(3, "Common Resources", "FAQ", "https://vitess.io/docs/faq/", "q", 1),
            record(4, "", "Roadmap", "github.com/vitessio/vitess/roadmap", "r", 1),
        ]
    }

    #[test]
    fn collection_statistics() {
        let stats = CollectionStats::from_records("vitess_docs_v1", &sample());

        let info = &stats.collection_info;
        assert_eq!(info.total_records, 5);
        assert_eq!(info.unique_documents, 4);
        assert_eq!(info.multi_chunk_documents, 1);
        assert_eq!(info.max_chunks_per_document, 2);

        let versions = &stats.version_statistics;
        assert_eq!(versions.unique_versions, 4);
        assert_eq!(versions.latest_version.as_deref(), Some("v22.0 (Development)"));
        assert_eq!(versions.version_counts[1], LabelCount { label: "v21.0 (Stable)".into(), count: 2 });

        assert_eq!(stats.content_statistics.max_chunk_size, 6);
        assert_eq!(stats.content_statistics.avg_chunk_size, Some(14.0 / 5.0));

        assert_eq!(stats.common_resources.found_resources, vec!["FAQ", "Roadmap"]);
        assert_eq!(stats.document_titles.unique_titles, 3);
        assert_eq!(stats.document_titles.top_titles[0], LabelCount { label: "VTGate".into(), count: 3 });

        assert_eq!(stats.url_domains.get("vitess.io"), Some(&4));
        assert_eq!(stats.url_domains.get("github.com"), Some(&1));
    }

    #[test]
    fn url_domains_with_and_without_scheme() {
        assert_eq!(url_domain("https://Vitess.io:443/docs/22.0/").as_deref(), Some("vitess.io"));
        assert_eq!(url_domain("http://user@github.com/vitessio").as_deref(), Some("github.com"));
        assert_eq!(url_domain("vitess.io/docs/faq").as_deref(), Some("vitess.io"));
        assert_eq!(url_domain(""), None);
    }

    #[test]
    fn empty_collection_statistics() {
        let stats = CollectionStats::from_records("empty", &[]);
        assert_eq!(stats.collection_info.max_chunks_per_document, 0);
        assert_eq!(stats.content_statistics.avg_chunk_size, None);
        assert_eq!(stats.version_statistics.latest_version, None);
    }

    #[test]
    fn inspect_reports_empty_collection() {
        let report = InspectReport::from_sample(0, &[]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "empty");
        assert_eq!(value["message"], "No documents in database");
    }

    #[test]
    fn inspect_samples_and_previews() {
        let mut records = sample();
        records[0].document = "x".repeat(150);
        let report = InspectReport::from_sample(42, &records);

        let InspectReport::Populated {
            document_count,
            metadata_fields,
            has_version_field,
            version_values,
            sample_documents,
        } = report
        else {
            panic!("expected a populated report");
        };
        assert_eq!(document_count, 42);
        assert!(metadata_fields.contains(&"chunk_index".to_string()));
        assert!(has_version_field);
        assert_eq!(version_values.len(), 3);
        assert_eq!(sample_documents.len(), 3);
        assert_eq!(sample_documents[0].document_preview.chars().count(), 103);
    }
}
