//! Publishes the rendered report as a comment on the change.
//!
//! The comment carries a hidden marker so re-runs update the previous
//! comment instead of stacking new ones. With `skip_side_effects` set the
//! step renders nothing to the host and the run ends with the report in
//! state only.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::channels::RunError;
use crate::model::ChangeRef;
use crate::providers::ChangeHost;
use crate::report::COMMENT_MARKER;
use crate::state::StateSnapshot;
use crate::step::{Step, StepContext, StepError, StepPartial};
use crate::types::StepId;

pub struct CommentPublishStep {
    host: Arc<dyn ChangeHost>,
}

impl CommentPublishStep {
    #[must_use]
    pub fn new(host: Arc<dyn ChangeHost>) -> Self {
        CommentPublishStep { host }
    }
}

#[async_trait]
impl Step for CommentPublishStep {
    #[instrument(skip_all, fields(skip = snapshot.input.skip_side_effects))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        if snapshot.input.skip_side_effects {
            info!("side effects disabled, not publishing");
            return Ok(StepPartial::new());
        }

        let Some(report) = &snapshot.report else {
            warn!("no report to publish");
            return Ok(StepPartial::new().with_error(RunError::step(
                StepId::CommentPublish,
                "no report available to publish",
            )));
        };
        let Some(metadata) = &snapshot.change_metadata else {
            warn!("no change metadata, cannot publish");
            return Ok(StepPartial::new().with_error(RunError::step(
                StepId::CommentPublish,
                "no change metadata available to publish against",
            )));
        };

        let change = ChangeRef {
            owner: metadata.owner.clone(),
            repo: metadata.repo.clone(),
            number: metadata.number,
        };
        match self
            .host
            .update_or_create_comment(&change, COMMENT_MARKER, report)
            .await
        {
            Ok(location) => {
                info!(%location, "report published");
                let mut partial = StepPartial::new();
                partial.published_location = Some(location);
                Ok(partial)
            }
            Err(provider_error) => {
                warn!(error = %provider_error, "publish failed");
                Ok(StepPartial::new().with_error(RunError::step(
                    StepId::CommentPublish,
                    format!("failed to publish report: {provider_error}"),
                )))
            }
        }
    }
}
