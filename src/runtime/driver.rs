//! The single-threaded graph walker.

use miette::Diagnostic;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::channels::RunError;
use crate::graphs::{RoutingError, Workflow};
use crate::reducers::{ReducerError, ReducerRegistry};
use crate::state::{RunInput, WorkflowState};
use crate::step::{StepContext, StepPartial};
use crate::types::StepId;

/// Hard cap on executed steps; the retry ceiling bounds the only loop in the
/// standard graph well below this.
const DEFAULT_STEP_BUDGET: u32 = 100;

/// Failures that abort a run. Everything here is a contract violation or a
/// wiring bug, never a recoverable step failure.
#[derive(Debug, Error, Diagnostic)]
pub enum DriverError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Reducer(#[from] ReducerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Routing(#[from] RoutingError),

    #[error("no implementation registered for step `{step}`")]
    #[diagnostic(code(docsmith::runtime::unregistered_step))]
    UnregisteredStep { step: StepId },

    #[error("step budget of {budget} exhausted, aborting run")]
    #[diagnostic(
        code(docsmith::runtime::step_budget),
        help("a router is likely cycling; check the retry ceiling")
    )]
    StepBudgetExhausted { budget: u32 },
}

/// Walks a compiled workflow to completion.
///
/// One step at a time: execute, merge the partial, route on the merged
/// snapshot. Step failures degrade the run (an error-list append) rather
/// than aborting it; contract violations abort.
pub struct Driver {
    workflow: Workflow,
    registry: ReducerRegistry,
    step_budget: u32,
}

impl Driver {
    #[must_use]
    pub fn new(workflow: Workflow, registry: ReducerRegistry) -> Self {
        Driver {
            workflow,
            registry,
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }

    #[must_use]
    pub fn with_step_budget(mut self, budget: u32) -> Self {
        self.step_budget = budget;
        self
    }

    /// Runs the workflow from its entry step until `End`, returning the
    /// final state.
    #[instrument(skip(self, input), fields(run_id, change_ref = %input.change_ref))]
    pub async fn run(&self, input: RunInput) -> Result<WorkflowState, DriverError> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        info!("starting run");

        let mut state = WorkflowState::new(input);
        let mut current = self.workflow.entry();
        let mut executed = 0u32;

        while current != StepId::End {
            if executed >= self.step_budget {
                error!(budget = self.step_budget, "step budget exhausted");
                return Err(DriverError::StepBudgetExhausted {
                    budget: self.step_budget,
                });
            }
            executed += 1;

            let step = self
                .workflow
                .step(current)
                .ok_or(DriverError::UnregisteredStep { step: current })?;

            let ctx = StepContext::new(run_id, current);
            let partial = match step.run(state.snapshot(), ctx).await {
                Ok(partial) => partial,
                Err(step_error) => {
                    warn!(step = %current, error = %step_error, "step failed, continuing degraded");
                    StepPartial::new().with_error(RunError::step(current, step_error.to_string()))
                }
            };

            let written = self.registry.apply_step(&mut state, current, partial)?;
            info!(step = %current, written = written.len(), "step complete");

            current = self.workflow.next_after(current, &state.snapshot())?;
        }

        info!(
            findings = state.findings.len(),
            errors = state.errors.len(),
            validation_passed = state.validation_passed,
            "run complete"
        );
        Ok(state)
    }
}
