//! Conditional edges: pure routing decisions over a state snapshot.
//!
//! A [`Router`] pairs a decision closure with its declared candidate set. The
//! compiled workflow checks every decision against the candidates; a router
//! that strays outside them is a bug and aborts the run.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::model::AgentName;
use crate::state::StateSnapshot;
use crate::types::StepId;

/// Decision function for a conditional edge.
pub type RouterFn = Arc<dyn Fn(&StateSnapshot) -> StepId + Send + Sync>;

/// A conditional edge: a decision closure plus the set of steps it may pick.
#[derive(Clone)]
pub struct Router {
    candidates: Vec<StepId>,
    decide: RouterFn,
}

impl Router {
    /// Builds a router from its candidate set and decision closure.
    pub fn new<F>(candidates: Vec<StepId>, decide: F) -> Self
    where
        F: Fn(&StateSnapshot) -> StepId + Send + Sync + 'static,
    {
        Router {
            candidates,
            decide: Arc::new(decide),
        }
    }

    #[must_use]
    pub fn candidates(&self) -> &[StepId] {
        &self.candidates
    }

    /// Runs the decision closure. Candidate enforcement happens in the
    /// compiled workflow, not here.
    #[must_use]
    pub fn route(&self, snapshot: &StateSnapshot) -> StepId {
        (self.decide)(snapshot)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("candidates", &self.candidates)
            .finish_non_exhaustive()
    }
}

/// After discovery: proceed to the repository scan, unless earlier errors
/// already degraded the run, in which case skip straight to analysis.
#[must_use]
pub fn post_discovery() -> Router {
    Router::new(vec![StepId::RepoScan, StepId::Analysis], |snapshot| {
        if snapshot.errors.is_empty() {
            debug!("routing to repo scan");
            StepId::RepoScan
        } else {
            debug!("errors present, routing straight to analysis");
            StepId::Analysis
        }
    })
}

/// The sub-task chain: dispatches the highest-priority requested agent that
/// has not yet produced output, or validation when none remain.
///
/// Priority is technical writer, then diagram architect, then correction.
/// The diagram architect is additionally gated on the run's diagrams flag.
/// "Has not yet run" is read off the agent-outputs channel, so the same
/// router serves both the analysis step and every agent step.
#[must_use]
pub fn sub_task_chain() -> Router {
    Router::new(
        vec![
            StepId::TechnicalWriter,
            StepId::DiagramArchitect,
            StepId::Correction,
            StepId::Validation,
        ],
        |snapshot| {
            for agent in AgentName::PRIORITY {
                if !snapshot.agents_needed.contains(&agent) {
                    continue;
                }
                if agent == AgentName::DiagramArchitect && !snapshot.input.enable_diagrams {
                    continue;
                }
                if snapshot.agent_has_run(agent) {
                    continue;
                }
                debug!(agent = %agent, "dispatching sub-task");
                return agent.step();
            }
            debug!("no sub-tasks remain, routing to validation");
            StepId::Validation
        },
    )
}
