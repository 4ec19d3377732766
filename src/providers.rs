//! Injected collaborator traits for the external services a run talks to.
//!
//! Nothing in this crate constructs a concrete host or model client; steps
//! hold `Arc<dyn ...>` handles supplied by the embedding application. Tests
//! inject stubs. All trait methods are async and fallible with
//! [`ProviderError`].

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    AgentName, ChangeMetadata, ChangeRef, DocFile, DocumentationStatus, FileChange, Finding,
    SourceFile,
};

/// Failure from an external collaborator.
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    #[error("host error: {message}")]
    #[diagnostic(code(docsmith::provider::host))]
    Host { message: String },

    #[error("model error: {message}")]
    #[diagnostic(code(docsmith::provider::model))]
    Model { message: String },
}

impl ProviderError {
    pub fn host<M: Into<String>>(message: M) -> Self {
        ProviderError::Host {
            message: message.into(),
        }
    }

    pub fn model<M: Into<String>>(message: M) -> Self {
        ProviderError::Model {
            message: message.into(),
        }
    }
}

/// The change host: serves change metadata and publishes the report comment.
#[async_trait]
pub trait ChangeHost: Send + Sync {
    async fn fetch_metadata(&self, change: &ChangeRef) -> Result<ChangeMetadata, ProviderError>;

    async fn fetch_change_list(&self, change: &ChangeRef)
    -> Result<Vec<FileChange>, ProviderError>;

    /// Publishes `body` as a comment on the change, updating an existing
    /// comment carrying `marker` instead of stacking a new one. Returns the
    /// comment location.
    async fn update_or_create_comment(
        &self,
        change: &ChangeRef,
        marker: &str,
        body: &str,
    ) -> Result<String, ProviderError>;
}

/// Read access to the repository contents at a given branch.
#[async_trait]
pub trait RepoInventory: Send + Sync {
    /// Full file listing of the repository tree.
    async fn list_files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Documentation files with content, pre-filtered and classified.
    async fn fetch_documentation(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<DocFile>, ProviderError>;

    /// Source files retained for analysis when documentation is absent.
    async fn fetch_sources(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<SourceFile>, ProviderError>;
}

/// Context handed to the model for the audit pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRequest {
    pub metadata: ChangeMetadata,
    pub changes: Vec<FileChange>,
    pub documentation: Vec<DocFile>,
    pub status: Option<DocumentationStatus>,
    pub source_files: Vec<SourceFile>,
    pub repo_structure: Option<String>,
    /// Reviewer feedback from the previous loop iteration, when retrying.
    pub prior_feedback: Option<String>,
}

/// Structured audit result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditOutcome {
    pub summary: String,
    pub findings: Vec<Finding>,
    pub agents_needed: Vec<AgentName>,
}

/// Context for the technical-writer sub-task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WriterRequest {
    pub metadata: ChangeMetadata,
    pub changes: Vec<FileChange>,
    pub documentation: Vec<DocFile>,
    pub findings: Vec<Finding>,
    pub repo_structure: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WriterOutcome {
    pub new_documentation: String,
    pub findings: Vec<Finding>,
    pub style_notes: Option<String>,
}

/// Context for the diagram-architect sub-task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiagramRequest {
    pub metadata: ChangeMetadata,
    pub changes: Vec<FileChange>,
    pub source_files: Vec<SourceFile>,
    pub findings: Vec<Finding>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiagramOutcome {
    pub diagram_code: String,
    pub description: String,
    pub finding: Finding,
}

/// Context for the correction sub-task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub metadata: ChangeMetadata,
    pub changes: Vec<FileChange>,
    pub documentation: Vec<DocFile>,
    pub findings: Vec<Finding>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    pub corrections: Vec<Finding>,
    pub suggested_updates: String,
}

/// Context for the validation review.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub metadata: ChangeMetadata,
    pub changes: Vec<FileChange>,
    pub documentation: Vec<DocFile>,
    pub findings: Vec<Finding>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub passed: bool,
    pub feedback: String,
    pub issues_found: Vec<String>,
}

/// The language model behind the analysis and sub-task steps.
#[async_trait]
pub trait DocModel: Send + Sync {
    async fn audit(&self, request: AuditRequest) -> Result<AuditOutcome, ProviderError>;

    async fn write_documentation(
        &self,
        request: WriterRequest,
    ) -> Result<WriterOutcome, ProviderError>;

    async fn draft_diagram(&self, request: DiagramRequest)
    -> Result<DiagramOutcome, ProviderError>;

    async fn correct_documentation(
        &self,
        request: CorrectionRequest,
    ) -> Result<CorrectionOutcome, ProviderError>;

    async fn review(&self, request: ReviewRequest) -> Result<ReviewOutcome, ProviderError>;
}
