//! Documentation version labels.

use std::cmp::Ordering;

/// Version searched when a caller does not name one.
pub const DEFAULT_VERSION: &str = "v22.0 (Development)";

/// Every published documentation version, newest first.
pub const KNOWN_VERSIONS: [&str; 12] = [
    "v22.0 (Development)",
    "v21.0 (Stable)",
    "v20.0 (Stable)",
    "v19.0 (Archived)",
    "v18.0 (Archived)",
    "v17.0 (Archived)",
    "v16.0 (Archived)",
    "v15.0 (Archived)",
    "v14.0 (Archived)",
    "v13.0 (Archived)",
    "v12.0 (Archived)",
    "v11.0 (Archived)",
];

/// Expand a short label such as `v21.0` to its stored form `v21.0 (Stable)`.
///
/// Labels that already carry a parenthesized status, and labels that match no
/// known version, are returned unchanged.
pub fn full_version_label(version: &str) -> String {
    if version.contains('(') && version.contains(')') {
        return version.to_string();
    }
    KNOWN_VERSIONS
        .iter()
        .find(|known| known.split_once(' ').is_some_and(|(short, _)| short == version))
        .map_or_else(|| version.to_string(), |known| known.to_string())
}

// Text sorts below numbers so category labels land after every version.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment<'a> {
    Text(&'a str),
    Number(u64),
}

fn segments(label: &str) -> Vec<Segment<'_>> {
    label
        .split('.')
        .map(|part| {
            part.trim_start_matches('v').parse().map_or(Segment::Text(part), Segment::Number)
        })
        .collect()
}

/// Order labels newest first by comparing dot-separated segments, numeric
/// segments (with an optional `v` prefix) numerically.
pub fn newest_first(a: &str, b: &str) -> Ordering {
    segments(b).cmp(&segments(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_short_labels() {
        assert_eq!(full_version_label("v21.0"), "v21.0 (Stable)");
        assert_eq!(full_version_label("v22.0"), "v22.0 (Development)");
        assert_eq!(full_version_label("v11.0"), "v11.0 (Archived)");
    }

    #[test]
    fn keeps_full_and_unknown_labels() {
        assert_eq!(full_version_label("v19.0 (Archived)"), "v19.0 (Archived)");
        assert_eq!(full_version_label("v9.0"), "v9.0");
        assert_eq!(full_version_label("Common Resources"), "Common Resources");
        assert_eq!(full_version_label(""), "");
    }

    #[test]
    fn sorts_newest_first() {
        let mut labels =
            vec!["v9.0 (Archived)", "Common Resources", "v22.0 (Development)", "v21.0 (Stable)"];
        labels.sort_by(|a, b| newest_first(a, b));
        assert_eq!(
            labels,
            vec!["v22.0 (Development)", "v21.0 (Stable)", "v9.0 (Archived)", "Common Resources"]
        );

        let mut numeric = vec!["1.9", "1.10", "2.0"];
        numeric.sort_by(|a, b| newest_first(a, b));
        assert_eq!(numeric, vec!["2.0", "1.10", "1.9"]);
    }
}
