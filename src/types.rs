//! Core identifiers for the docsmith workflow graph.
//!
//! This module defines the fundamental types used throughout the engine for
//! identifying steps and channels. These are the domain concepts that define
//! what the analysis pipeline *is*: a fixed set of steps connected by edges,
//! mutating a fixed set of state channels.
//!
//! # Key Types
//!
//! - [`StepId`]: Identifies every step in the analysis graph
//! - [`ChannelId`]: Identifies every state channel in the [`WorkflowState`](crate::state::WorkflowState)
//!
//! Unlike a general-purpose workflow engine, the step set is closed: every run
//! walks the same graph, and routers choose among declared candidates only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a step within the analysis graph.
///
/// `Start` and `End` are virtual endpoints: they carry no implementation and
/// exist only so edges can express where execution begins and terminates. All
/// other variants name an executable step registered with the
/// [`GraphBuilder`](crate::graphs::GraphBuilder).
///
/// # Examples
///
/// ```rust
/// use docsmith::types::StepId;
///
/// assert_eq!(StepId::Analysis.as_str(), "analysis");
/// assert!(StepId::Start.is_virtual());
/// assert!(!StepId::Validation.is_virtual());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Virtual entry point; never executed.
    Start,
    /// Virtual terminal; never executed.
    End,
    /// Fetches change metadata and the file-change list from the host.
    ChangeFetch,
    /// Inspects change metadata for documentation hints; routing only.
    DocDiscovery,
    /// Scans the repository for documentation and source context.
    RepoScan,
    /// Audits the change against existing documentation, producing findings.
    Analysis,
    /// Sub-task: drafts missing documentation.
    TechnicalWriter,
    /// Sub-task: drafts architecture diagrams.
    DiagramArchitect,
    /// Sub-task: corrects outdated documentation.
    Correction,
    /// Reviews the accumulated findings for accuracy.
    Validation,
    /// Renders the markdown report from the final findings.
    ReportRender,
    /// Publishes (or skips publishing) the report on the host.
    CommentPublish,
}

impl StepId {
    /// Stable lower-case name, used in logs and error-list entries.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Start => "start",
            StepId::End => "end",
            StepId::ChangeFetch => "change_fetch",
            StepId::DocDiscovery => "doc_discovery",
            StepId::RepoScan => "repo_scan",
            StepId::Analysis => "analysis",
            StepId::TechnicalWriter => "technical_writer",
            StepId::DiagramArchitect => "diagram_architect",
            StepId::Correction => "correction",
            StepId::Validation => "validation",
            StepId::ReportRender => "report_render",
            StepId::CommentPublish => "comment_publish",
        }
    }

    /// Returns `true` for the virtual `Start`/`End` endpoints.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        matches!(self, StepId::Start | StepId::End)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a state channel and, implicitly, its merge semantics.
///
/// Every channel has exactly one reducer kind registered in the
/// [`ReducerRegistry`](crate::reducers::ReducerRegistry): last-write-wins
/// scalars, append-only lists, or the deduplicating findings merge. Steps may
/// only write channels declared for them; anything else is a contract
/// violation surfaced as a [`ReducerError`](crate::reducers::ReducerError).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelId {
    ChangeMetadata,
    ChangeList,
    DocumentationFiles,
    DocumentationStatus,
    SourceFiles,
    RepoStructure,
    Findings,
    AgentsNeeded,
    AgentOutputs,
    ValidationPassed,
    ValidationFeedback,
    RetryCount,
    Report,
    PublishedLocation,
    Errors,
}

impl ChannelId {
    /// All channels, in declaration order.
    pub const ALL: [ChannelId; 15] = [
        ChannelId::ChangeMetadata,
        ChannelId::ChangeList,
        ChannelId::DocumentationFiles,
        ChannelId::DocumentationStatus,
        ChannelId::SourceFiles,
        ChannelId::RepoStructure,
        ChannelId::Findings,
        ChannelId::AgentsNeeded,
        ChannelId::AgentOutputs,
        ChannelId::ValidationPassed,
        ChannelId::ValidationFeedback,
        ChannelId::RetryCount,
        ChannelId::Report,
        ChannelId::PublishedLocation,
        ChannelId::Errors,
    ];

    /// Stable lower-case name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::ChangeMetadata => "change_metadata",
            ChannelId::ChangeList => "change_list",
            ChannelId::DocumentationFiles => "documentation_files",
            ChannelId::DocumentationStatus => "documentation_status",
            ChannelId::SourceFiles => "source_files",
            ChannelId::RepoStructure => "repo_structure",
            ChannelId::Findings => "findings",
            ChannelId::AgentsNeeded => "agents_needed",
            ChannelId::AgentOutputs => "agent_outputs",
            ChannelId::ValidationPassed => "validation_passed",
            ChannelId::ValidationFeedback => "validation_feedback",
            ChannelId::RetryCount => "retry_count",
            ChannelId::Report => "report",
            ChannelId::PublishedLocation => "published_location",
            ChannelId::Errors => "errors",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_are_unique() {
        let names = [
            StepId::ChangeFetch,
            StepId::DocDiscovery,
            StepId::RepoScan,
            StepId::Analysis,
            StepId::TechnicalWriter,
            StepId::DiagramArchitect,
            StepId::Correction,
            StepId::Validation,
            StepId::ReportRender,
            StepId::CommentPublish,
        ]
        .map(|s| s.as_str());
        let mut deduped = names.to_vec();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }

    #[test]
    fn channel_all_matches_names() {
        let mut names: Vec<_> = ChannelId::ALL.iter().map(|c| c.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ChannelId::ALL.len());
    }
}
