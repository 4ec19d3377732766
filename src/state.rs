//! The typed channel store backing a workflow run.
//!
//! [`WorkflowState`] owns one field per [`ChannelId`](crate::types::ChannelId)
//! plus the immutable [`RunInput`]. Steps never touch it directly: they read
//! an immutable [`StateSnapshot`] and return a
//! [`StepPartial`](crate::step::StepPartial), which the
//! [`ReducerRegistry`](crate::reducers::ReducerRegistry) merges in. Each
//! channel carries a version counter bumped only when a merge actually
//! changes it, which keeps the run logs honest about what moved.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::channels::RunError;
use crate::model::{
    AgentName, AgentOutput, ChangeMetadata, DocFile, DocumentationStatus, FileChange, Finding,
    SourceFile,
};
use crate::types::ChannelId;

/// Immutable per-run input, fixed before the first step executes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    /// Raw change reference as supplied by the caller; parsed by the fetch
    /// step.
    pub change_ref: String,
    /// When set, the publish step renders everything but posts nothing.
    pub skip_side_effects: bool,
    /// Gates the diagram-architect sub-task.
    pub enable_diagrams: bool,
}

impl RunInput {
    #[must_use]
    pub fn new(change_ref: impl Into<String>) -> Self {
        RunInput {
            change_ref: change_ref.into(),
            skip_side_effects: false,
            enable_diagrams: true,
        }
    }

    #[must_use]
    pub fn skip_side_effects(mut self, skip: bool) -> Self {
        self.skip_side_effects = skip;
        self
    }

    #[must_use]
    pub fn enable_diagrams(mut self, enable: bool) -> Self {
        self.enable_diagrams = enable;
        self
    }
}

/// The full channel store for one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowState {
    pub input: RunInput,

    pub change_metadata: Option<ChangeMetadata>,
    pub change_list: Vec<FileChange>,

    pub documentation_files: Vec<DocFile>,
    pub documentation_status: Option<DocumentationStatus>,
    pub source_files: Vec<SourceFile>,
    pub repo_structure: Option<String>,

    pub findings: Vec<Finding>,
    pub agents_needed: Vec<AgentName>,
    pub agent_outputs: Vec<AgentOutput>,

    pub validation_passed: bool,
    pub validation_feedback: Option<String>,
    pub retry_count: u32,

    pub report: Option<String>,
    pub published_location: Option<String>,

    pub errors: Vec<RunError>,

    #[serde(skip)]
    versions: FxHashMap<ChannelId, u32>,
}

impl WorkflowState {
    /// Fresh state with every channel at its empty value.
    #[must_use]
    pub fn new(input: RunInput) -> Self {
        WorkflowState {
            input,
            change_metadata: None,
            change_list: Vec::new(),
            documentation_files: Vec::new(),
            documentation_status: None,
            source_files: Vec::new(),
            repo_structure: None,
            findings: Vec::new(),
            agents_needed: Vec::new(),
            agent_outputs: Vec::new(),
            validation_passed: false,
            validation_feedback: None,
            retry_count: 0,
            report: None,
            published_location: None,
            errors: Vec::new(),
            versions: FxHashMap::default(),
        }
    }

    /// Version of a channel; 0 until its first effective write.
    #[must_use]
    pub fn version_of(&self, channel: ChannelId) -> u32 {
        self.versions.get(&channel).copied().unwrap_or(0)
    }

    pub(crate) fn bump_version(&mut self, channel: ChannelId) {
        *self.versions.entry(channel).or_insert(0) += 1;
    }

    /// Immutable view handed to steps and routers.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            input: self.input.clone(),
            change_metadata: self.change_metadata.clone(),
            change_list: self.change_list.clone(),
            documentation_files: self.documentation_files.clone(),
            documentation_status: self.documentation_status,
            source_files: self.source_files.clone(),
            repo_structure: self.repo_structure.clone(),
            findings: self.findings.clone(),
            agents_needed: self.agents_needed.clone(),
            agent_outputs: self.agent_outputs.clone(),
            validation_passed: self.validation_passed,
            validation_feedback: self.validation_feedback.clone(),
            retry_count: self.retry_count,
            report: self.report.clone(),
            published_location: self.published_location.clone(),
            errors: self.errors.clone(),
        }
    }
}

/// Point-in-time copy of the channel store.
///
/// Routers and steps only ever see one of these; state mutation is the
/// reducer registry's job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub input: RunInput,
    pub change_metadata: Option<ChangeMetadata>,
    pub change_list: Vec<FileChange>,
    pub documentation_files: Vec<DocFile>,
    pub documentation_status: Option<DocumentationStatus>,
    pub source_files: Vec<SourceFile>,
    pub repo_structure: Option<String>,
    pub findings: Vec<Finding>,
    pub agents_needed: Vec<AgentName>,
    pub agent_outputs: Vec<AgentOutput>,
    pub validation_passed: bool,
    pub validation_feedback: Option<String>,
    pub retry_count: u32,
    pub report: Option<String>,
    pub published_location: Option<String>,
    pub errors: Vec<RunError>,
}

impl StateSnapshot {
    /// Whether the named agent has already produced output this run.
    #[must_use]
    pub fn agent_has_run(&self, agent: AgentName) -> bool {
        self.agent_outputs.iter().any(|o| o.agent == agent)
    }
}
