//! The audit pass: compares the change against existing documentation and
//! decides which sub-task agents are needed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::channels::RunError;
use crate::model::{AgentName, DocCoverage, Finding};
use crate::providers::{AuditRequest, DocModel};
use crate::state::StateSnapshot;
use crate::step::{Step, StepContext, StepError, StepPartial};
use crate::types::StepId;

pub struct AnalysisStep {
    model: Arc<dyn DocModel>,
}

impl AnalysisStep {
    #[must_use]
    pub fn new(model: Arc<dyn DocModel>) -> Self {
        AnalysisStep { model }
    }
}

/// Drops findings violating the length bounds, recording one error each.
pub(crate) fn admit_findings(
    step: StepId,
    candidates: Vec<Finding>,
    errors: &mut Vec<RunError>,
) -> Vec<Finding> {
    candidates
        .into_iter()
        .filter(|finding| match finding.validate() {
            Ok(()) => true,
            Err(violation) => {
                warn!(title = %finding.title, error = %violation, "dropping invalid finding");
                errors.push(RunError::step(
                    step,
                    format!("dropped invalid finding `{}`: {violation}", finding.title),
                ));
                false
            }
        })
        .collect()
}

/// Normalizes the requested agent list: priority order, duplicates removed.
fn normalize_agents(requested: &[AgentName]) -> Vec<AgentName> {
    AgentName::PRIORITY
        .into_iter()
        .filter(|agent| requested.contains(agent))
        .collect()
}

#[async_trait]
impl Step for AnalysisStep {
    #[instrument(skip_all, fields(attempt = snapshot.retry_count + 1))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        let Some(metadata) = snapshot.change_metadata.clone() else {
            warn!("no change metadata available for analysis");
            return Ok(StepPartial::new().with_error(RunError::step(
                StepId::Analysis,
                "no change metadata available for analysis",
            )));
        };

        let docs_missing = matches!(
            snapshot.documentation_status,
            None | Some(crate::model::DocumentationStatus {
                coverage: DocCoverage::Missing,
                ..
            })
        );
        if let Some(feedback) = &snapshot.validation_feedback {
            info!(attempt = snapshot.retry_count + 1, feedback = %feedback, "retrying with reviewer feedback");
        }

        let request = AuditRequest {
            metadata,
            changes: snapshot.change_list.clone(),
            documentation: snapshot.documentation_files.clone(),
            status: snapshot.documentation_status,
            source_files: snapshot.source_files.clone(),
            repo_structure: snapshot.repo_structure.clone(),
            prior_feedback: snapshot.validation_feedback.clone(),
        };

        let mut partial = StepPartial::new();
        // every entry counts as an attempt, success or not, so the retry
        // loop stays bounded
        partial.retry_count = Some(snapshot.retry_count + 1);

        match self.model.audit(request).await {
            Ok(outcome) => {
                info!(
                    findings = outcome.findings.len(),
                    agents = ?outcome.agents_needed,
                    summary = %outcome.summary,
                    "audit complete"
                );
                let mut errors = Vec::new();
                let findings = admit_findings(StepId::Analysis, outcome.findings, &mut errors);
                // a repository without documentation always gets the writer
                // and, when enabled, the diagram architect
                let agents = if docs_missing {
                    vec![AgentName::TechnicalWriter, AgentName::DiagramArchitect]
                } else {
                    normalize_agents(&outcome.agents_needed)
                };
                partial.findings = Some(findings);
                partial.agents_needed = Some(agents);
                if !errors.is_empty() {
                    partial.errors = Some(errors);
                }
            }
            Err(provider_error) => {
                warn!(error = %provider_error, "audit failed");
                partial = partial.with_error(RunError::step(
                    StepId::Analysis,
                    format!("analysis failed: {provider_error}"),
                ));
            }
        }
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FindingType, Severity};

    #[test]
    fn agents_are_normalized_to_priority_order() {
        let agents = normalize_agents(&[
            AgentName::Correction,
            AgentName::TechnicalWriter,
            AgentName::TechnicalWriter,
        ]);
        assert_eq!(agents, vec![AgentName::TechnicalWriter, AgentName::Correction]);
    }

    #[test]
    fn invalid_findings_are_dropped_with_errors() {
        let mut errors = Vec::new();
        let admitted = admit_findings(
            StepId::Analysis,
            vec![
                Finding::new(
                    FindingType::MissingDoc,
                    Severity::High,
                    "Valid finding title",
                    "A description comfortably within bounds.",
                ),
                Finding::new(FindingType::MissingDoc, Severity::High, "bad", "short"),
            ],
            &mut errors,
        );
        assert_eq!(admitted.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("dropped invalid finding"));
    }
}
