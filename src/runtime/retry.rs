//! The bounded analysis/validation retry loop.

use tracing::{debug, warn};

use crate::graphs::Router;
use crate::state::StateSnapshot;
use crate::types::StepId;

/// Decides, after each validation pass, whether to loop back into analysis
/// or finalize into report rendering.
///
/// The analysis step bumps `retry_count` on every entry, so the counter
/// reads as "analysis attempts so far". The loop finalizes once validation
/// passes or once the attempts beyond the first reach the configured
/// ceiling: with `max_retries = 2`, analysis runs exactly three times before
/// the run proceeds with `validation_passed` still false.
#[derive(Clone, Copy, Debug)]
pub struct RetryController {
    max_retries: u32,
}

impl RetryController {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        RetryController { max_retries }
    }

    /// Whether the loop is done with this snapshot.
    #[must_use]
    pub fn should_finalize(&self, snapshot: &StateSnapshot) -> bool {
        if snapshot.validation_passed {
            return true;
        }
        snapshot.retry_count.saturating_sub(1) >= self.max_retries
    }

    /// The conditional edge out of the validation step.
    #[must_use]
    pub fn router(&self) -> Router {
        let controller = *self;
        Router::new(vec![StepId::Analysis, StepId::ReportRender], move |snapshot| {
            if snapshot.validation_passed {
                debug!("validation passed, finalizing");
                return StepId::ReportRender;
            }
            if controller.should_finalize(snapshot) {
                warn!(
                    attempts = snapshot.retry_count,
                    max_retries = controller.max_retries,
                    "retry ceiling reached, finalizing without passing validation"
                );
                return StepId::ReportRender;
            }
            debug!(
                attempts = snapshot.retry_count,
                max_retries = controller.max_retries,
                "validation failed, retrying analysis"
            );
            StepId::Analysis
        })
    }
}
