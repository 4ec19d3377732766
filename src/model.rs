//! Domain records flowing through the workflow channels.
//!
//! Everything here is plain data: change metadata fetched from the host,
//! repository inventory snapshots, and the findings the analysis steps
//! accumulate. Merge behavior lives in [`crate::reducers`]; these types only
//! define shape and local invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A reference to a change submission on the host.
///
/// Accepts either a full URL (`https://host/owner/repo/pull/123`) or the
/// compact `owner/repo#123` shorthand.
///
/// # Examples
///
/// ```rust
/// use docsmith::model::ChangeRef;
///
/// let a = ChangeRef::parse("https://github.com/acme/widgets/pull/42")?;
/// let b = ChangeRef::parse("acme/widgets#42")?;
/// assert_eq!(a, b);
/// assert_eq!(a.number, 42);
/// # Ok::<(), docsmith::model::ChangeRefError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

/// Raised when a change reference cannot be parsed.
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
#[error("unrecognized change reference: {input}")]
#[diagnostic(
    code(docsmith::model::change_ref),
    help("expected https://<host>/<owner>/<repo>/pull/<n> or <owner>/<repo>#<n>")
)]
pub struct ChangeRefError {
    pub input: String,
}

impl ChangeRef {
    /// Parses a change reference from either supported form.
    pub fn parse(input: &str) -> Result<Self, ChangeRefError> {
        let trimmed = input.trim();
        let err = || ChangeRefError {
            input: input.to_string(),
        };

        if let Some(rest) = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
        {
            // host/owner/repo/pull/<n>, trailing segments ignored
            let mut parts = rest.trim_end_matches('/').split('/');
            let _host = parts.next().ok_or_else(err)?;
            let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(err)?;
            let repo = parts.next().filter(|s| !s.is_empty()).ok_or_else(err)?;
            let kind = parts.next().ok_or_else(err)?;
            if kind != "pull" && kind != "pulls" && kind != "merge_requests" {
                return Err(err());
            }
            let number = parts
                .next()
                .and_then(|n| n.parse::<u64>().ok())
                .ok_or_else(err)?;
            return Ok(ChangeRef {
                owner: owner.to_string(),
                repo: repo.to_string(),
                number,
            });
        }

        let (path, number) = trimmed.split_once('#').ok_or_else(err)?;
        let (owner, repo) = path.split_once('/').ok_or_else(err)?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(err());
        }
        let number = number.parse::<u64>().map_err(|_| err())?;
        Ok(ChangeRef {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
        })
    }
}

impl fmt::Display for ChangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Metadata describing the change submission, as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMetadata {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub base_branch: String,
    pub head_branch: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub commits_count: u32,
    pub comments_count: u32,
}

/// How a file was touched by the change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Added,
    Modified,
    Removed,
    Renamed,
}

/// A single file entry from the change list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: ChangeStatus,
    pub additions: u32,
    pub deletions: u32,
    pub patch: Option<String>,
    pub previous_path: Option<String>,
}

/// Category of a discovered documentation file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Readme,
    Api,
    Guide,
    Changelog,
    Config,
    Other,
}

impl DocType {
    /// Whether content of this type counts as documentation prose when
    /// summarizing coverage. Config files document behavior but are not
    /// prose.
    #[must_use]
    pub fn is_prose(&self) -> bool {
        matches!(
            self,
            DocType::Readme | DocType::Guide | DocType::Api | DocType::Changelog
        )
    }
}

/// A documentation file found in the repository.
///
/// `content` is `None` when the file was too large to retain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocFile {
    pub path: String,
    pub doc_type: DocType,
    pub content: Option<String>,
    pub size: u64,
}

/// A source file retained for analysis when documentation is absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub size: u64,
}

/// Overall documentation coverage of the repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocCoverage {
    Missing,
    Minimal,
    Present,
}

/// README content below this length counts as empty.
const MIN_README_CONTENT_LEN: usize = 100;
/// Total prose below this length keeps coverage at `Minimal`.
const MIN_PROSE_FOR_PRESENT: usize = 1000;

/// Summary of repository documentation, derived from the discovered files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationStatus {
    pub coverage: DocCoverage,
    pub has_readme: bool,
    pub readme_is_empty: bool,
    pub doc_file_count: usize,
}

impl DocumentationStatus {
    /// Summarizes a set of discovered documentation files.
    ///
    /// A repository without a README (or with one under 100 bytes of trimmed
    /// content) counts as `Missing`; with a README but under 1000 bytes of
    /// total prose it is `Minimal`; otherwise `Present`.
    #[must_use]
    pub fn summarize(files: &[DocFile]) -> Self {
        let mut has_readme = false;
        let mut readme_is_empty = true;
        let mut total_prose = 0usize;

        for file in files {
            let content_len = file
                .content
                .as_deref()
                .map(|c| c.trim().len())
                .unwrap_or(0);

            let file_name = file.path.rsplit('/').next().unwrap_or(&file.path);
            if file_name.to_lowercase().contains("readme") {
                has_readme = true;
                if content_len >= MIN_README_CONTENT_LEN {
                    readme_is_empty = false;
                }
            }

            if file.doc_type.is_prose() {
                total_prose += content_len;
            }
        }

        let coverage = if !has_readme || readme_is_empty {
            DocCoverage::Missing
        } else if total_prose < MIN_PROSE_FOR_PRESENT {
            DocCoverage::Minimal
        } else {
            DocCoverage::Present
        };

        DocumentationStatus {
            coverage,
            has_readme,
            readme_is_empty,
            doc_file_count: files.len(),
        }
    }
}

/// Builds a short textual summary of the repository layout from a full file
/// listing. Top-level directories with file counts, then a total.
#[must_use]
pub fn summarize_repo_structure(all_files: &[String]) -> String {
    use std::collections::BTreeMap;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for path in all_files {
        let top = path.split('/').next().unwrap_or(path);
        *counts.entry(top).or_insert(0) += 1;
    }

    let mut out = String::from("Repository structure:\n");
    for (dir, count) in &counts {
        out.push_str(&format!("  {dir}/ ({count} files)\n"));
    }
    out.push_str(&format!("\nTotal: {} files", all_files.len()));
    out
}

/// Category of a documentation finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    Discrepancy,
    MissingDoc,
    Outdated,
    DiagramNeeded,
    Improvement,
}

impl FindingType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingType::Discrepancy => "discrepancy",
            FindingType::MissingDoc => "missing_doc",
            FindingType::Outdated => "outdated",
            FindingType::DiagramNeeded => "diagram_needed",
            FindingType::Improvement => "improvement",
        }
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a finding. Total order: `Critical` outranks everything, `Info`
/// ranks last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Numeric rank; lower is more severe.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }

    /// Whether `self` is strictly more severe than `other`.
    #[must_use]
    pub fn outranks(&self, other: Severity) -> bool {
        self.rank() < other.rank()
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds enforced on collaborator-produced findings before they are admitted
/// into state.
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
pub enum FindingValidationError {
    #[error("finding title must be 5..=200 characters, got {0}")]
    #[diagnostic(code(docsmith::model::finding_title))]
    TitleLength(usize),
    #[error("finding description must be 10..=300 characters, got {0}")]
    #[diagnostic(code(docsmith::model::finding_description))]
    DescriptionLength(usize),
}

/// A single documentation finding produced by the analysis steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: Uuid,
    pub finding_type: FindingType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub file_path: Option<String>,
    pub line_number: Option<u32>,
    /// Heading in the documentation file where the update belongs.
    pub target_section: Option<String>,
    /// Copy-paste ready replacement text, when the producing step drafted one.
    pub recommended_update: Option<String>,
    /// Mermaid diagram source, for diagram findings.
    pub diagram: Option<String>,
}

impl Finding {
    /// Creates a finding with a fresh id and no optional fields set.
    #[must_use]
    pub fn new(
        finding_type: FindingType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Finding {
            id: Uuid::new_v4(),
            finding_type,
            severity,
            title: title.into(),
            description: description.into(),
            file_path: None,
            line_number: None,
            target_section: None,
            recommended_update: None,
            diagram: None,
        }
    }

    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_target_section(mut self, section: impl Into<String>) -> Self {
        self.target_section = Some(section.into());
        self
    }

    #[must_use]
    pub fn with_recommended_update(mut self, text: impl Into<String>) -> Self {
        self.recommended_update = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_diagram(mut self, source: impl Into<String>) -> Self {
        self.diagram = Some(source.into());
        self
    }

    /// Checks the title and description length bounds.
    pub fn validate(&self) -> Result<(), FindingValidationError> {
        let title_len = self.title.chars().count();
        if !(5..=200).contains(&title_len) {
            return Err(FindingValidationError::TitleLength(title_len));
        }
        let desc_len = self.description.chars().count();
        if !(10..=300).contains(&desc_len) {
            return Err(FindingValidationError::DescriptionLength(desc_len));
        }
        Ok(())
    }
}

/// The specialized sub-task agents, in routing priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentName {
    TechnicalWriter,
    DiagramArchitect,
    Correction,
}

impl AgentName {
    /// Dispatch priority when multiple agents are requested.
    pub const PRIORITY: [AgentName; 3] = [
        AgentName::TechnicalWriter,
        AgentName::DiagramArchitect,
        AgentName::Correction,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::TechnicalWriter => "technical_writer",
            AgentName::DiagramArchitect => "diagram_architect",
            AgentName::Correction => "correction",
        }
    }

    /// The step implementing this agent.
    #[must_use]
    pub fn step(&self) -> crate::types::StepId {
        match self {
            AgentName::TechnicalWriter => crate::types::StepId::TechnicalWriter,
            AgentName::DiagramArchitect => crate::types::StepId::DiagramArchitect,
            AgentName::Correction => crate::types::StepId::Correction,
        }
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a sub-task agent's output, appended once per agent per run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub agent: AgentName,
    pub summary: String,
    /// Suggested documentation content, when the agent drafted prose.
    pub suggested_content: Option<String>,
    /// Sanitized diagram source, when the agent drafted one.
    pub diagram: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_url_form() {
        let r = ChangeRef::parse("https://github.com/acme/widgets/pull/42").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.repo, "widgets");
        assert_eq!(r.number, 42);
    }

    #[test]
    fn parses_shorthand_form() {
        let r = ChangeRef::parse("acme/widgets#7").unwrap();
        assert_eq!(r.to_string(), "acme/widgets#7");
    }

    #[test]
    fn rejects_malformed_refs() {
        for bad in [
            "",
            "acme/widgets",
            "acme#7",
            "https://github.com/acme/widgets/issues/42",
            "acme/widgets#notanumber",
            "a/b/c#3",
        ] {
            assert!(ChangeRef::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    fn doc(path: &str, doc_type: DocType, content: &str) -> DocFile {
        DocFile {
            path: path.to_string(),
            doc_type,
            content: Some(content.to_string()),
            size: content.len() as u64,
        }
    }

    #[test]
    fn status_missing_without_readme() {
        let files = vec![doc("docs/guide.md", DocType::Guide, &"x".repeat(2000))];
        let status = DocumentationStatus::summarize(&files);
        assert_eq!(status.coverage, DocCoverage::Missing);
        assert!(!status.has_readme);
    }

    #[test]
    fn status_missing_with_empty_readme() {
        let files = vec![doc("README.md", DocType::Readme, "stub")];
        let status = DocumentationStatus::summarize(&files);
        assert_eq!(status.coverage, DocCoverage::Missing);
        assert!(status.has_readme);
        assert!(status.readme_is_empty);
    }

    #[test]
    fn status_minimal_then_present_by_prose_volume() {
        let readme = doc("README.md", DocType::Readme, &"r".repeat(150));
        let minimal = DocumentationStatus::summarize(std::slice::from_ref(&readme));
        assert_eq!(minimal.coverage, DocCoverage::Minimal);

        let files = vec![readme, doc("docs/api.md", DocType::Api, &"a".repeat(900))];
        let present = DocumentationStatus::summarize(&files);
        assert_eq!(present.coverage, DocCoverage::Present);
        assert_eq!(present.doc_file_count, 2);
    }

    #[test]
    fn config_files_do_not_count_as_prose() {
        let files = vec![
            doc("README.md", DocType::Readme, &"r".repeat(150)),
            doc("config.yaml", DocType::Config, &"c".repeat(5000)),
        ];
        let status = DocumentationStatus::summarize(&files);
        assert_eq!(status.coverage, DocCoverage::Minimal);
    }

    #[test]
    fn repo_structure_counts_top_level() {
        let files = vec![
            "src/lib.rs".to_string(),
            "src/main.rs".to_string(),
            "README.md".to_string(),
        ];
        let summary = summarize_repo_structure(&files);
        assert!(summary.contains("src/ (2 files)"));
        assert!(summary.contains("Total: 3 files"));
    }

    #[test]
    fn finding_bounds_enforced() {
        let ok = Finding::new(
            FindingType::MissingDoc,
            Severity::High,
            "Configuration options undocumented",
            "The new retry settings are not described anywhere.",
        );
        assert!(ok.validate().is_ok());

        let short_title = Finding::new(FindingType::Outdated, Severity::Low, "Doc", "x".repeat(20));
        assert!(matches!(
            short_title.validate(),
            Err(FindingValidationError::TitleLength(3))
        ));

        let long_desc = Finding::new(
            FindingType::Outdated,
            Severity::Low,
            "A reasonable title",
            "d".repeat(301),
        );
        assert!(matches!(
            long_desc.validate(),
            Err(FindingValidationError::DescriptionLength(301))
        ));
    }

    #[test]
    fn severity_total_order() {
        assert!(Severity::Critical.outranks(Severity::High));
        assert!(Severity::High.outranks(Severity::Medium));
        assert!(Severity::Medium.outranks(Severity::Low));
        assert!(Severity::Low.outranks(Severity::Info));
        assert!(!Severity::Info.outranks(Severity::Info));
    }
}
