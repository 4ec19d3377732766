//! Renders the markdown report from the final findings.

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::report;
use crate::state::StateSnapshot;
use crate::step::{Step, StepContext, StepError, StepPartial};

#[derive(Default)]
pub struct ReportRenderStep;

impl ReportRenderStep {
    #[must_use]
    pub fn new() -> Self {
        ReportRenderStep
    }
}

#[async_trait]
impl Step for ReportRenderStep {
    #[instrument(skip_all, fields(findings = snapshot.findings.len()))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        let rendered = report::render(&snapshot);
        info!(bytes = rendered.len(), "report rendered");
        let mut partial = StepPartial::new();
        partial.report = Some(rendered);
        Ok(partial)
    }
}
