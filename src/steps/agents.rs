//! The specialized sub-task steps: technical writer, diagram architect,
//! correction.
//!
//! Each runs at most once per run; the chain router reads the agent-outputs
//! channel to know who already ran. For that reason every path through these
//! steps, including provider failure, appends an [`AgentOutput`] record.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::channels::RunError;
use crate::mermaid;
use crate::model::{AgentName, AgentOutput, ChangeMetadata};
use crate::providers::{CorrectionRequest, DiagramRequest, DocModel, WriterRequest};
use crate::state::StateSnapshot;
use crate::step::{Step, StepContext, StepError, StepPartial};

use super::analysis::admit_findings;

fn failure_output(agent: AgentName, error: &crate::providers::ProviderError) -> AgentOutput {
    AgentOutput {
        agent,
        summary: format!("{agent} failed: {error}"),
        suggested_content: None,
        diagram: None,
    }
}

fn failure_partial(
    agent: AgentName,
    error: crate::providers::ProviderError,
) -> StepPartial {
    warn!(agent = %agent, error = %error, "sub-task failed");
    let mut partial = StepPartial::new()
        .with_error(RunError::step(agent.step(), format!("{agent} failed: {error}")));
    partial.agent_outputs = Some(vec![failure_output(agent, &error)]);
    partial
}

fn require_metadata(snapshot: &StateSnapshot, agent: AgentName) -> Result<ChangeMetadata, StepPartial> {
    match snapshot.change_metadata.clone() {
        Some(metadata) => Ok(metadata),
        None => {
            warn!(agent = %agent, "no change metadata, skipping sub-task");
            let mut partial = StepPartial::new().with_error(RunError::step(
                agent.step(),
                format!("no change metadata available for {agent}"),
            ));
            partial.agent_outputs = Some(vec![AgentOutput {
                agent,
                summary: format!("{agent} skipped: no change metadata"),
                suggested_content: None,
                diagram: None,
            }]);
            Err(partial)
        }
    }
}

/// Drafts documentation for findings the audit marked as missing.
pub struct TechnicalWriterStep {
    model: Arc<dyn DocModel>,
}

impl TechnicalWriterStep {
    #[must_use]
    pub fn new(model: Arc<dyn DocModel>) -> Self {
        TechnicalWriterStep { model }
    }
}

#[async_trait]
impl Step for TechnicalWriterStep {
    #[instrument(skip_all)]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        let agent = AgentName::TechnicalWriter;
        let metadata = match require_metadata(&snapshot, agent) {
            Ok(metadata) => metadata,
            Err(partial) => return Ok(partial),
        };

        let request = WriterRequest {
            metadata,
            changes: snapshot.change_list.clone(),
            documentation: snapshot.documentation_files.clone(),
            findings: snapshot.findings.clone(),
            repo_structure: snapshot.repo_structure.clone(),
        };

        match self.model.write_documentation(request).await {
            Ok(outcome) => {
                info!(findings = outcome.findings.len(), "technical writer complete");
                let mut errors = Vec::new();
                let findings = admit_findings(agent.step(), outcome.findings, &mut errors);
                let mut partial = StepPartial::new().with_findings(findings);
                partial.agent_outputs = Some(vec![AgentOutput {
                    agent,
                    summary: outcome
                        .style_notes
                        .unwrap_or_else(|| "drafted documentation".to_string()),
                    suggested_content: Some(outcome.new_documentation),
                    diagram: None,
                }]);
                if !errors.is_empty() {
                    partial.errors = Some(errors);
                }
                Ok(partial)
            }
            Err(provider_error) => Ok(failure_partial(agent, provider_error)),
        }
    }
}

/// Drafts an architecture diagram, sanitizing the model's output before it
/// is admitted into state.
pub struct DiagramArchitectStep {
    model: Arc<dyn DocModel>,
}

impl DiagramArchitectStep {
    #[must_use]
    pub fn new(model: Arc<dyn DocModel>) -> Self {
        DiagramArchitectStep { model }
    }
}

#[async_trait]
impl Step for DiagramArchitectStep {
    #[instrument(skip_all)]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        let agent = AgentName::DiagramArchitect;
        let metadata = match require_metadata(&snapshot, agent) {
            Ok(metadata) => metadata,
            Err(partial) => return Ok(partial),
        };

        let request = DiagramRequest {
            metadata,
            changes: snapshot.change_list.clone(),
            source_files: snapshot.source_files.clone(),
            findings: snapshot.findings.clone(),
        };

        match self.model.draft_diagram(request).await {
            Ok(outcome) => {
                let raw = mermaid::extract_diagram_code(&outcome.diagram_code)
                    .unwrap_or(outcome.diagram_code);
                let sanitized = mermaid::validate_and_sanitize(&raw);

                let mut partial = StepPartial::new();
                let mut errors = Vec::new();
                let mut output = AgentOutput {
                    agent,
                    summary: outcome.description,
                    suggested_content: None,
                    diagram: None,
                };

                if sanitized.is_valid() {
                    info!("diagram drafted and sanitized");
                    let finding = outcome.finding.with_diagram(sanitized.code.clone());
                    let findings = admit_findings(agent.step(), vec![finding], &mut errors);
                    output.diagram = Some(sanitized.code);
                    partial.findings = Some(findings);
                } else {
                    let issue = sanitized
                        .issue
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| "unknown issue".to_string());
                    warn!(%issue, "diagram unusable after sanitizing");
                    errors.push(RunError::step(
                        agent.step(),
                        format!("discarded invalid diagram: {issue}"),
                    ));
                }

                partial.agent_outputs = Some(vec![output]);
                if !errors.is_empty() {
                    partial.errors = Some(errors);
                }
                Ok(partial)
            }
            Err(provider_error) => Ok(failure_partial(agent, provider_error)),
        }
    }
}

/// Drafts corrections for documentation the audit flagged as outdated.
pub struct CorrectionStep {
    model: Arc<dyn DocModel>,
}

impl CorrectionStep {
    #[must_use]
    pub fn new(model: Arc<dyn DocModel>) -> Self {
        CorrectionStep { model }
    }
}

#[async_trait]
impl Step for CorrectionStep {
    #[instrument(skip_all)]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        let agent = AgentName::Correction;
        let metadata = match require_metadata(&snapshot, agent) {
            Ok(metadata) => metadata,
            Err(partial) => return Ok(partial),
        };

        let request = CorrectionRequest {
            metadata,
            changes: snapshot.change_list.clone(),
            documentation: snapshot.documentation_files.clone(),
            findings: snapshot.findings.clone(),
        };

        match self.model.correct_documentation(request).await {
            Ok(outcome) => {
                info!(corrections = outcome.corrections.len(), "correction complete");
                let mut errors = Vec::new();
                let findings = admit_findings(agent.step(), outcome.corrections, &mut errors);
                let mut partial = StepPartial::new().with_findings(findings);
                partial.agent_outputs = Some(vec![AgentOutput {
                    agent,
                    summary: "drafted corrections for outdated documentation".to_string(),
                    suggested_content: Some(outcome.suggested_updates),
                    diagram: None,
                }]);
                if !errors.is_empty() {
                    partial.errors = Some(errors);
                }
                Ok(partial)
            }
            Err(provider_error) => Ok(failure_partial(agent, provider_error)),
        }
    }
}
