//! The step abstraction: async units of work that read a snapshot and emit a
//! partial state update.
//!
//! Steps never mutate [`WorkflowState`](crate::state::WorkflowState). They
//! receive a [`StateSnapshot`](crate::state::StateSnapshot) plus a
//! [`StepContext`], and return a [`StepPartial`] describing the channels they
//! want written. The reducer registry checks the partial against the step's
//! declared write set and merges it.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

use crate::channels::RunError;
use crate::model::{
    AgentName, AgentOutput, ChangeMetadata, DocFile, DocumentationStatus, FileChange, Finding,
    SourceFile,
};
use crate::providers::ProviderError;
use crate::state::StateSnapshot;
use crate::types::{ChannelId, StepId};

/// Per-invocation context handed to a step.
#[derive(Clone, Debug)]
pub struct StepContext {
    /// Identifies the run across all steps, for log correlation.
    pub run_id: Uuid,
    /// The step being executed.
    pub step: StepId,
}

impl StepContext {
    #[must_use]
    pub fn new(run_id: Uuid, step: StepId) -> Self {
        StepContext { run_id, step }
    }
}

/// Failure surfaced by a step.
///
/// These are recoverable: the driver converts them to error-list appends and
/// the run continues degraded. Contract violations are a different animal and
/// live in [`DriverError`](crate::runtime::DriverError).
#[derive(Debug, Error, Diagnostic)]
pub enum StepError {
    #[error("provider failure: {0}")]
    #[diagnostic(code(docsmith::step::provider))]
    Provider(#[from] ProviderError),

    #[error("invalid input: {message}")]
    #[diagnostic(
        code(docsmith::step::invalid_input),
        help("check the change reference passed to the run")
    )]
    InvalidInput { message: String },

    #[error("{message}")]
    #[diagnostic(code(docsmith::step::other))]
    Other { message: String },
}

impl StepError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        StepError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn other<M: Into<String>>(message: M) -> Self {
        StepError::Other {
            message: message.into(),
        }
    }
}

/// A partial state update: `Some` means "write this channel", `None` means
/// "leave it alone".
///
/// How a `Some` value lands depends on the channel's reducer: scalars are
/// replaced, list channels are appended, findings go through the dedup merge.
#[derive(Clone, Debug, Default)]
pub struct StepPartial {
    pub change_metadata: Option<ChangeMetadata>,
    pub change_list: Option<Vec<FileChange>>,
    pub documentation_files: Option<Vec<DocFile>>,
    pub documentation_status: Option<DocumentationStatus>,
    pub source_files: Option<Vec<SourceFile>>,
    pub repo_structure: Option<String>,
    pub findings: Option<Vec<Finding>>,
    pub agents_needed: Option<Vec<AgentName>>,
    pub agent_outputs: Option<Vec<AgentOutput>>,
    pub validation_passed: Option<bool>,
    pub validation_feedback: Option<String>,
    pub retry_count: Option<u32>,
    pub report: Option<String>,
    pub published_location: Option<String>,
    pub errors: Option<Vec<RunError>>,
}

impl StepPartial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = Some(findings);
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<RunError>) -> Self {
        self.errors = Some(errors);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: RunError) -> Self {
        self.errors.get_or_insert_with(Vec::new).push(error);
        self
    }

    /// Channels this partial would write, in declaration order.
    #[must_use]
    pub fn touched_channels(&self) -> Vec<ChannelId> {
        let mut touched = Vec::new();
        if self.change_metadata.is_some() {
            touched.push(ChannelId::ChangeMetadata);
        }
        if self.change_list.is_some() {
            touched.push(ChannelId::ChangeList);
        }
        if self.documentation_files.is_some() {
            touched.push(ChannelId::DocumentationFiles);
        }
        if self.documentation_status.is_some() {
            touched.push(ChannelId::DocumentationStatus);
        }
        if self.source_files.is_some() {
            touched.push(ChannelId::SourceFiles);
        }
        if self.repo_structure.is_some() {
            touched.push(ChannelId::RepoStructure);
        }
        if self.findings.is_some() {
            touched.push(ChannelId::Findings);
        }
        if self.agents_needed.is_some() {
            touched.push(ChannelId::AgentsNeeded);
        }
        if self.agent_outputs.is_some() {
            touched.push(ChannelId::AgentOutputs);
        }
        if self.validation_passed.is_some() {
            touched.push(ChannelId::ValidationPassed);
        }
        if self.validation_feedback.is_some() {
            touched.push(ChannelId::ValidationFeedback);
        }
        if self.retry_count.is_some() {
            touched.push(ChannelId::RetryCount);
        }
        if self.report.is_some() {
            touched.push(ChannelId::Report);
        }
        if self.published_location.is_some() {
            touched.push(ChannelId::PublishedLocation);
        }
        if self.errors.is_some() {
            touched.push(ChannelId::Errors);
        }
        touched
    }

    /// True when no channel would be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.touched_channels().is_empty()
    }
}

/// An executable step in the workflow graph.
///
/// Implementations hold their own collaborators (host client, model client)
/// and must be pure with respect to state: all reads go through the snapshot,
/// all writes through the returned partial.
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: StepContext,
    ) -> Result<StepPartial, StepError>;
}
