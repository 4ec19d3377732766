//! Reviews the accumulated findings for accuracy.
//!
//! A run with no findings passes trivially. A review provider failure also
//! passes, with the error on record: blocking the whole run on a reviewer
//! outage would be worse than publishing unreviewed findings. Reaching the
//! retry ceiling does NOT flip the verdict; the retry controller finalizes
//! the loop and the report discloses the failed validation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::channels::RunError;
use crate::providers::{DocModel, ReviewRequest};
use crate::state::StateSnapshot;
use crate::step::{Step, StepContext, StepError, StepPartial};
use crate::types::StepId;

pub struct ValidationStep {
    model: Arc<dyn DocModel>,
}

impl ValidationStep {
    #[must_use]
    pub fn new(model: Arc<dyn DocModel>) -> Self {
        ValidationStep { model }
    }
}

fn verdict(passed: bool, feedback: impl Into<String>) -> StepPartial {
    let mut partial = StepPartial::new();
    partial.validation_passed = Some(passed);
    partial.validation_feedback = Some(feedback.into());
    partial
}

#[async_trait]
impl Step for ValidationStep {
    #[instrument(skip_all, fields(findings = snapshot.findings.len()))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        if snapshot.findings.is_empty() {
            info!("no findings to validate, passing");
            return Ok(verdict(true, "no findings generated"));
        }
        let Some(metadata) = snapshot.change_metadata.clone() else {
            warn!("no change metadata, accepting findings unreviewed");
            return Ok(verdict(true, "no change metadata available for review"));
        };

        let request = ReviewRequest {
            metadata,
            changes: snapshot.change_list.clone(),
            documentation: snapshot.documentation_files.clone(),
            findings: snapshot.findings.clone(),
        };

        match self.model.review(request).await {
            Ok(outcome) => {
                info!(passed = outcome.passed, "validation complete");
                if !outcome.issues_found.is_empty() {
                    info!(issues = ?outcome.issues_found, "reviewer issues");
                }
                Ok(verdict(outcome.passed, outcome.feedback))
            }
            Err(provider_error) => {
                warn!(error = %provider_error, "review failed, accepting analysis");
                Ok(
                    verdict(true, format!("review unavailable, accepting: {provider_error}"))
                        .with_error(RunError::step(
                            StepId::Validation,
                            format!("review failed: {provider_error}"),
                        )),
                )
            }
        }
    }
}
