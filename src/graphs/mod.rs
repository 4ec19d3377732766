//! Graph assembly: steps wired by unconditional and conditional edges.
//!
//! [`GraphBuilder`] collects steps and edges, then [`GraphBuilder::compile`]
//! validates the wiring into an immutable [`Workflow`] the driver walks.
//! Validation is strict: every registered step needs exactly one outgoing
//! edge or router, and every referenced step must exist.

pub mod edges;

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::instrument;

use crate::state::StateSnapshot;
use crate::step::Step;
use crate::types::StepId;

pub use edges::{Router, RouterFn};

/// Wiring mistakes caught at compile time.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphBuildError {
    #[error("no entry edge from start")]
    #[diagnostic(code(docsmith::graphs::missing_entry))]
    MissingEntry,

    #[error("step `{step}` referenced but never registered")]
    #[diagnostic(code(docsmith::graphs::unknown_step))]
    UnknownStep { step: StepId },

    #[error("virtual step `{step}` cannot carry an implementation")]
    #[diagnostic(code(docsmith::graphs::virtual_step))]
    VirtualStep { step: StepId },

    #[error("step `{step}` has no outgoing edge or router")]
    #[diagnostic(
        code(docsmith::graphs::dangling_step),
        help("every step must lead somewhere, if only to the end")
    )]
    DanglingStep { step: StepId },

    #[error("step `{step}` has both an unconditional edge and a router")]
    #[diagnostic(code(docsmith::graphs::conflicting_edges))]
    ConflictingEdges { step: StepId },
}

/// Routing failures at run time. Both variants are contract violations and
/// abort the run.
#[derive(Debug, Error, Diagnostic)]
pub enum RoutingError {
    #[error("router on `{from}` chose `{chose}`, outside its candidate set")]
    #[diagnostic(code(docsmith::graphs::router_escaped))]
    RouterEscaped { from: StepId, chose: StepId },

    #[error("no edge out of `{from}`")]
    #[diagnostic(code(docsmith::graphs::missing_edge))]
    MissingEdge { from: StepId },
}

/// Mutable graph under construction.
#[derive(Default)]
pub struct GraphBuilder {
    steps: FxHashMap<StepId, Arc<dyn Step>>,
    edges: FxHashMap<StepId, StepId>,
    routers: FxHashMap<StepId, Router>,
    entry: Option<StepId>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a step implementation. Re-registering replaces the previous
    /// one.
    #[must_use]
    pub fn add_step(mut self, id: StepId, step: Arc<dyn Step>) -> Self {
        self.steps.insert(id, step);
        self
    }

    /// Adds an unconditional edge. An edge from `Start` sets the entry point.
    #[must_use]
    pub fn add_edge(mut self, from: StepId, to: StepId) -> Self {
        if from == StepId::Start {
            self.entry = Some(to);
        } else {
            self.edges.insert(from, to);
        }
        self
    }

    /// Adds a conditional edge out of `from`.
    #[must_use]
    pub fn add_router(mut self, from: StepId, router: Router) -> Self {
        self.routers.insert(from, router);
        self
    }

    /// Validates the wiring and produces an immutable workflow.
    #[instrument(skip(self))]
    pub fn compile(self) -> Result<Workflow, GraphBuildError> {
        let entry = self.entry.ok_or(GraphBuildError::MissingEntry)?;

        for id in self.steps.keys() {
            if id.is_virtual() {
                return Err(GraphBuildError::VirtualStep { step: *id });
            }
        }

        let ensure_known = |step: StepId| -> Result<(), GraphBuildError> {
            if step == StepId::End || self.steps.contains_key(&step) {
                Ok(())
            } else {
                Err(GraphBuildError::UnknownStep { step })
            }
        };

        ensure_known(entry)?;
        for (from, to) in &self.edges {
            ensure_known(*from)?;
            ensure_known(*to)?;
        }
        for (from, router) in &self.routers {
            ensure_known(*from)?;
            for candidate in router.candidates() {
                ensure_known(*candidate)?;
            }
        }

        for id in self.steps.keys() {
            let has_edge = self.edges.contains_key(id);
            let has_router = self.routers.contains_key(id);
            if has_edge && has_router {
                return Err(GraphBuildError::ConflictingEdges { step: *id });
            }
            if !has_edge && !has_router {
                return Err(GraphBuildError::DanglingStep { step: *id });
            }
        }

        Ok(Workflow {
            steps: self.steps,
            edges: self.edges,
            routers: self.routers,
            entry,
        })
    }
}

/// A compiled, immutable workflow graph.
pub struct Workflow {
    steps: FxHashMap<StepId, Arc<dyn Step>>,
    edges: FxHashMap<StepId, StepId>,
    routers: FxHashMap<StepId, Router>,
    entry: StepId,
}

impl Workflow {
    /// First executable step of the run.
    #[must_use]
    pub fn entry(&self) -> StepId {
        self.entry
    }

    /// Implementation registered for a step.
    #[must_use]
    pub fn step(&self, id: StepId) -> Option<Arc<dyn Step>> {
        self.steps.get(&id).cloned()
    }

    /// Resolves the successor of `from` against the snapshot.
    ///
    /// Router decisions are checked against their declared candidate set; a
    /// decision outside it is a [`RoutingError::RouterEscaped`] contract
    /// violation.
    pub fn next_after(
        &self,
        from: StepId,
        snapshot: &StateSnapshot,
    ) -> Result<StepId, RoutingError> {
        if let Some(router) = self.routers.get(&from) {
            let chose = router.route(snapshot);
            if !router.candidates().contains(&chose) {
                return Err(RoutingError::RouterEscaped { from, chose });
            }
            return Ok(chose);
        }
        self.edges
            .get(&from)
            .copied()
            .ok_or(RoutingError::MissingEdge { from })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{RunInput, WorkflowState};
    use crate::step::{StepContext, StepError, StepPartial};
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Step for Noop {
        async fn run(
            &self,
            _snapshot: StateSnapshot,
            _ctx: StepContext,
        ) -> Result<StepPartial, StepError> {
            Ok(StepPartial::new())
        }
    }

    fn snapshot() -> StateSnapshot {
        WorkflowState::new(RunInput::new("acme/widgets#1")).snapshot()
    }

    #[test]
    fn compile_rejects_missing_entry() {
        let result = GraphBuilder::new()
            .add_step(StepId::Analysis, Arc::new(Noop))
            .add_edge(StepId::Analysis, StepId::End)
            .compile();
        assert!(matches!(result, Err(GraphBuildError::MissingEntry)));
    }

    #[test]
    fn compile_rejects_dangling_step() {
        let result = GraphBuilder::new()
            .add_step(StepId::Analysis, Arc::new(Noop))
            .add_edge(StepId::Start, StepId::Analysis)
            .compile();
        assert!(matches!(
            result,
            Err(GraphBuildError::DanglingStep {
                step: StepId::Analysis
            })
        ));
    }

    #[test]
    fn compile_rejects_unknown_target() {
        let result = GraphBuilder::new()
            .add_step(StepId::Analysis, Arc::new(Noop))
            .add_edge(StepId::Start, StepId::Analysis)
            .add_edge(StepId::Analysis, StepId::Validation)
            .compile();
        assert!(matches!(
            result,
            Err(GraphBuildError::UnknownStep {
                step: StepId::Validation
            })
        ));
    }

    #[test]
    fn router_escape_is_detected() {
        let workflow = GraphBuilder::new()
            .add_step(StepId::Analysis, Arc::new(Noop))
            .add_edge(StepId::Start, StepId::Analysis)
            .add_router(
                StepId::Analysis,
                Router::new(vec![StepId::End], |_| StepId::Validation),
            )
            .compile();
        // candidate list only names End, so compile cannot catch the stray
        // decision; next_after must.
        let workflow = match workflow {
            Ok(w) => w,
            Err(e) => panic!("unexpected build error: {e}"),
        };
        let result = workflow.next_after(StepId::Analysis, &snapshot());
        assert!(matches!(
            result,
            Err(RoutingError::RouterEscaped {
                from: StepId::Analysis,
                chose: StepId::Validation
            })
        ));
    }

    #[test]
    fn unconditional_edges_resolve() {
        let workflow = GraphBuilder::new()
            .add_step(StepId::Analysis, Arc::new(Noop))
            .add_edge(StepId::Start, StepId::Analysis)
            .add_edge(StepId::Analysis, StepId::End)
            .compile()
            .unwrap();
        assert_eq!(workflow.entry(), StepId::Analysis);
        assert_eq!(
            workflow.next_after(StepId::Analysis, &snapshot()).unwrap(),
            StepId::End
        );
    }
}
