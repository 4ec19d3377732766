//! Deduplicating merge for the findings channel.
//!
//! Two findings are the same issue when they share a finding type, a file
//! path, and a concept signature. The signature comes from a keyword-based
//! [`ConceptMatcher`]; when no known concept appears in the title or
//! description, a stopword-stripped normalized title stands in. Conflicts
//! resolve by severity, with an asymmetric rule keeping whichever side has
//! ready-to-apply replacement text.

use rustc_hash::FxHashMap;

use crate::model::{Finding, FindingType};

/// Extracts canonical concept names from free text.
///
/// Implementations must be deterministic and order-stable: the same text
/// always yields the same sorted concept list.
pub trait ConceptMatcher: Send + Sync {
    fn concepts(&self, text: &str) -> Vec<&'static str>;
}

/// Synonym-table matcher covering the concepts findings tend to cluster on.
#[derive(Debug, Default)]
pub struct KeywordConceptMatcher;

/// Canonical concept to the substrings that signal it.
const CONCEPT_SYNONYMS: &[(&str, &[&str])] = &[
    ("api", &["api", "endpoint", "route", "interface"]),
    ("config", &["config", "configuration", "parameter", "setting", "variable"]),
    ("contract", &["contract", "contractor", "temporary"]),
    ("diagram", &["diagram", "architecture", "flowchart", "visual", "mermaid"]),
    ("feature", &["feature", "functionality", "capability"]),
    ("readme", &["readme", "overview", "introduction"]),
];

impl ConceptMatcher for KeywordConceptMatcher {
    fn concepts(&self, text: &str) -> Vec<&'static str> {
        let lower = text.to_lowercase();
        CONCEPT_SYNONYMS
            .iter()
            .filter(|(_, synonyms)| synonyms.iter().any(|s| lower.contains(s)))
            .map(|(canonical, _)| *canonical)
            .collect()
    }
}

/// Words stripped from titles before they are compared.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "for", "to", "in", "of", "and", "or", "with", "this", "that",
    "new", "add", "update", "missing", "outdated", "needed", "needs", "document", "documentation",
    "section",
];

/// Lowercases, strips punctuation and stopwords, then sorts the remaining
/// words so word order does not defeat deduplication.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    let mut words: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w))
        .collect();
    words.sort_unstable();
    words.join(" ")
}

/// Identity of a finding for deduplication purposes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub finding_type: FindingType,
    pub file_path: String,
    pub signature: String,
}

/// Computes the dedup key for a finding under the given matcher.
#[must_use]
pub fn dedup_key(matcher: &dyn ConceptMatcher, finding: &Finding) -> DedupKey {
    let text = format!("{} {}", finding.title, finding.description);
    let concepts = matcher.concepts(&text);
    let signature = if concepts.is_empty() {
        normalize_title(&finding.title)
    } else {
        concepts.join("|")
    };
    DedupKey {
        finding_type: finding.finding_type,
        file_path: finding.file_path.clone().unwrap_or_default(),
        signature,
    }
}

/// Merges `incoming` into `existing`, deduplicating by [`DedupKey`].
///
/// Rules, per key collision:
/// - the strictly more severe finding wins, keeping its position in the list;
///   if the loser carried replacement text and the winner does not, the text
///   is carried over
/// - at equal or lower severity the incumbent stays, but gains the incoming
///   finding's replacement text if it had none
///
/// First-seen order is stable: survivors keep their slot, new keys append.
/// Returns `true` when the list changed.
pub fn merge_findings(
    matcher: &dyn ConceptMatcher,
    existing: &mut Vec<Finding>,
    incoming: Vec<Finding>,
) -> bool {
    let mut index: FxHashMap<DedupKey, usize> = FxHashMap::default();
    for (i, finding) in existing.iter().enumerate() {
        index.entry(dedup_key(matcher, finding)).or_insert(i);
    }

    let mut changed = false;
    for mut candidate in incoming {
        let key = dedup_key(matcher, &candidate);
        match index.get(&key) {
            None => {
                index.insert(key, existing.len());
                existing.push(candidate);
                changed = true;
            }
            Some(&slot) => {
                let incumbent = &mut existing[slot];
                if candidate.severity.outranks(incumbent.severity) {
                    if candidate.recommended_update.is_none() {
                        candidate.recommended_update = incumbent.recommended_update.take();
                    }
                    *incumbent = candidate;
                    changed = true;
                } else if incumbent.recommended_update.is_none()
                    && candidate.recommended_update.is_some()
                {
                    incumbent.recommended_update = candidate.recommended_update;
                    changed = true;
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn finding(title: &str, severity: Severity) -> Finding {
        Finding::new(
            FindingType::MissingDoc,
            severity,
            title,
            "Placeholder description long enough to validate.",
        )
    }

    #[test]
    fn concepts_are_sorted_and_deduplicated() {
        let matcher = KeywordConceptMatcher;
        let found = matcher.concepts("The new API endpoint lacks configuration docs");
        assert_eq!(found, vec!["api", "config"]);
    }

    #[test]
    fn normalized_title_ignores_word_order_and_stopwords() {
        assert_eq!(
            normalize_title("Missing documentation for the retry logic"),
            normalize_title("Retry logic documentation is missing!"),
        );
    }

    #[test]
    fn same_concept_same_file_collides() {
        let matcher = KeywordConceptMatcher;
        let a = finding("API reference lacks the export endpoint", Severity::Medium)
            .with_file_path("docs/api.md");
        let b = finding("Export endpoint absent from API docs", Severity::Medium)
            .with_file_path("docs/api.md");
        assert_eq!(dedup_key(&matcher, &a), dedup_key(&matcher, &b));
    }

    #[test]
    fn different_file_path_does_not_collide() {
        let matcher = KeywordConceptMatcher;
        let a = finding("API reference incomplete here", Severity::Medium)
            .with_file_path("docs/api.md");
        let b = finding("API reference incomplete here", Severity::Medium)
            .with_file_path("README.md");
        assert_ne!(dedup_key(&matcher, &a), dedup_key(&matcher, &b));
    }

    #[test]
    fn higher_severity_replaces_in_place() {
        let matcher = KeywordConceptMatcher;
        let mut existing = vec![
            finding("Quickstart walkthrough absent", Severity::Low),
            finding("API endpoint undescribed", Severity::Medium).with_file_path("docs/api.md"),
        ];
        let incoming =
            vec![finding("API endpoint completely undescribed", Severity::Critical)
                .with_file_path("docs/api.md")];
        assert!(merge_findings(&matcher, &mut existing, incoming));
        assert_eq!(existing.len(), 2);
        // slot preserved
        assert_eq!(existing[1].severity, Severity::Critical);
        assert_eq!(existing[1].title, "API endpoint completely undescribed");
    }

    #[test]
    fn winner_inherits_replacement_text_it_lacks() {
        let matcher = KeywordConceptMatcher;
        let mut existing = vec![
            finding("Configuration values undescribed", Severity::Medium)
                .with_recommended_update("## Configuration\n..."),
        ];
        let incoming = vec![finding("Configuration entirely absent", Severity::High)];
        assert!(merge_findings(&matcher, &mut existing, incoming));
        assert_eq!(existing[0].severity, Severity::High);
        assert_eq!(
            existing[0].recommended_update.as_deref(),
            Some("## Configuration\n...")
        );
    }

    #[test]
    fn incumbent_gains_replacement_text_without_demotion() {
        let matcher = KeywordConceptMatcher;
        let mut existing = vec![finding("Configuration values undescribed", Severity::High)];
        let incoming = vec![
            finding("Configuration absent", Severity::Low)
                .with_recommended_update("## Configuration\n..."),
        ];
        assert!(merge_findings(&matcher, &mut existing, incoming));
        assert_eq!(existing[0].severity, Severity::High);
        assert_eq!(existing[0].title, "Configuration values undescribed");
        assert!(existing[0].recommended_update.is_some());
    }

    #[test]
    fn equal_severity_keeps_first_seen() {
        let matcher = KeywordConceptMatcher;
        let mut existing = vec![finding("Feature coverage gap in guide", Severity::Medium)];
        let incoming = vec![finding("Feature gap in the guide", Severity::Medium)];
        assert!(!merge_findings(&matcher, &mut existing, incoming));
        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].title, "Feature coverage gap in guide");
    }

    #[test]
    fn new_keys_append_in_arrival_order() {
        let matcher = KeywordConceptMatcher;
        let mut existing = Vec::new();
        let incoming = vec![
            finding("Readme overview too thin", Severity::Low),
            finding("Diagram of the pipeline absent", Severity::Medium),
            finding("API surface unlisted", Severity::High),
        ];
        merge_findings(&matcher, &mut existing, incoming);
        let titles: Vec<_> = existing.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Readme overview too thin",
                "Diagram of the pipeline absent",
                "API surface unlisted"
            ]
        );
    }
}
