//! Channel reducers and the registry that applies step output to state.
//!
//! Every channel has exactly one [`ReducerKind`]; every step has a declared
//! write set. [`ReducerRegistry::apply_step`] enforces both: a partial that
//! touches a channel outside its step's write set is a programming error and
//! fails the run loudly rather than being silently dropped.

pub mod findings;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::state::WorkflowState;
use crate::step::StepPartial;
use crate::types::{ChannelId, StepId};

pub use findings::{ConceptMatcher, DedupKey, KeywordConceptMatcher, dedup_key, merge_findings};

/// Merge discipline of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReducerKind {
    /// Replace the stored value wholesale.
    LastWriteWins,
    /// Extend the stored list with the incoming elements.
    Append,
    /// Findings-specific deduplicating merge.
    DedupMerge,
}

/// Contract violations detected while applying a partial.
#[derive(Debug, Error, Diagnostic)]
pub enum ReducerError {
    #[error("step `{step}` wrote undeclared channel `{channel}`")]
    #[diagnostic(
        code(docsmith::reducers::undeclared_channel),
        help("add the channel to the step's write set if the write is intentional")
    )]
    UndeclaredChannel { step: StepId, channel: ChannelId },

    #[error("step `{step}` has no registered write set")]
    #[diagnostic(code(docsmith::reducers::unknown_step))]
    UnknownStep { step: StepId },
}

/// Per-channel reducer kinds plus per-step write sets.
pub struct ReducerRegistry {
    matcher: Box<dyn ConceptMatcher>,
    write_sets: FxHashMap<StepId, Vec<ChannelId>>,
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self::new(Box::new(KeywordConceptMatcher))
    }
}

impl ReducerRegistry {
    /// Registry with the standard write sets and a caller-chosen concept
    /// matcher for the findings merge.
    #[must_use]
    pub fn new(matcher: Box<dyn ConceptMatcher>) -> Self {
        let mut write_sets: FxHashMap<StepId, Vec<ChannelId>> = FxHashMap::default();
        write_sets.insert(
            StepId::ChangeFetch,
            vec![ChannelId::ChangeMetadata, ChannelId::ChangeList, ChannelId::Errors],
        );
        write_sets.insert(StepId::DocDiscovery, vec![ChannelId::Errors]);
        write_sets.insert(
            StepId::RepoScan,
            vec![
                ChannelId::DocumentationFiles,
                ChannelId::DocumentationStatus,
                ChannelId::SourceFiles,
                ChannelId::RepoStructure,
                ChannelId::Errors,
            ],
        );
        write_sets.insert(
            StepId::Analysis,
            vec![
                ChannelId::Findings,
                ChannelId::AgentsNeeded,
                ChannelId::RetryCount,
                ChannelId::Errors,
            ],
        );
        for agent in [StepId::TechnicalWriter, StepId::DiagramArchitect, StepId::Correction] {
            write_sets.insert(
                agent,
                vec![ChannelId::Findings, ChannelId::AgentOutputs, ChannelId::Errors],
            );
        }
        write_sets.insert(
            StepId::Validation,
            vec![
                ChannelId::ValidationPassed,
                ChannelId::ValidationFeedback,
                ChannelId::Errors,
            ],
        );
        write_sets.insert(StepId::ReportRender, vec![ChannelId::Report, ChannelId::Errors]);
        write_sets.insert(
            StepId::CommentPublish,
            vec![ChannelId::PublishedLocation, ChannelId::Errors],
        );
        ReducerRegistry { matcher, write_sets }
    }

    /// Overrides the write set for one step. Intended for tests and embedders
    /// extending the graph.
    #[must_use]
    pub fn with_write_set(mut self, step: StepId, channels: Vec<ChannelId>) -> Self {
        self.write_sets.insert(step, channels);
        self
    }

    /// The merge discipline of a channel.
    #[must_use]
    pub fn kind_of(channel: ChannelId) -> ReducerKind {
        match channel {
            ChannelId::ChangeMetadata
            | ChannelId::DocumentationStatus
            | ChannelId::RepoStructure
            | ChannelId::AgentsNeeded
            | ChannelId::ValidationPassed
            | ChannelId::ValidationFeedback
            | ChannelId::RetryCount
            | ChannelId::Report
            | ChannelId::PublishedLocation => ReducerKind::LastWriteWins,
            ChannelId::ChangeList
            | ChannelId::DocumentationFiles
            | ChannelId::SourceFiles
            | ChannelId::AgentOutputs
            | ChannelId::Errors => ReducerKind::Append,
            ChannelId::Findings => ReducerKind::DedupMerge,
        }
    }

    /// Declared write set for a step, if registered.
    #[must_use]
    pub fn write_set(&self, step: StepId) -> Option<&[ChannelId]> {
        self.write_sets.get(&step).map(Vec::as_slice)
    }

    /// Merges a step's partial into the state.
    ///
    /// Returns the channels that actually changed. An empty partial is a
    /// no-op, never an error.
    #[instrument(skip(self, state, partial), fields(step = %step))]
    pub fn apply_step(
        &self,
        state: &mut WorkflowState,
        step: StepId,
        partial: StepPartial,
    ) -> Result<Vec<ChannelId>, ReducerError> {
        let touched = partial.touched_channels();
        if touched.is_empty() {
            return Ok(Vec::new());
        }

        let declared = self
            .write_sets
            .get(&step)
            .ok_or(ReducerError::UnknownStep { step })?;
        for channel in &touched {
            if !declared.contains(channel) {
                return Err(ReducerError::UndeclaredChannel {
                    step,
                    channel: *channel,
                });
            }
        }

        let mut written = Vec::new();
        let mut mark = |channel: ChannelId, changed: bool, state: &mut WorkflowState| {
            if changed {
                state.bump_version(channel);
                written.push(channel);
            }
        };

        if let Some(value) = partial.change_metadata {
            let changed = state.change_metadata.as_ref() != Some(&value);
            state.change_metadata = Some(value);
            mark(ChannelId::ChangeMetadata, changed, state);
        }
        if let Some(items) = partial.change_list {
            let changed = !items.is_empty();
            state.change_list.extend(items);
            mark(ChannelId::ChangeList, changed, state);
        }
        if let Some(items) = partial.documentation_files {
            let changed = !items.is_empty();
            state.documentation_files.extend(items);
            mark(ChannelId::DocumentationFiles, changed, state);
        }
        if let Some(value) = partial.documentation_status {
            let changed = state.documentation_status != Some(value);
            state.documentation_status = Some(value);
            mark(ChannelId::DocumentationStatus, changed, state);
        }
        if let Some(items) = partial.source_files {
            let changed = !items.is_empty();
            state.source_files.extend(items);
            mark(ChannelId::SourceFiles, changed, state);
        }
        if let Some(value) = partial.repo_structure {
            let changed = state.repo_structure.as_deref() != Some(value.as_str());
            state.repo_structure = Some(value);
            mark(ChannelId::RepoStructure, changed, state);
        }
        if let Some(items) = partial.findings {
            let changed = merge_findings(self.matcher.as_ref(), &mut state.findings, items);
            mark(ChannelId::Findings, changed, state);
        }
        if let Some(value) = partial.agents_needed {
            let changed = state.agents_needed != value;
            state.agents_needed = value;
            mark(ChannelId::AgentsNeeded, changed, state);
        }
        if let Some(items) = partial.agent_outputs {
            let changed = !items.is_empty();
            state.agent_outputs.extend(items);
            mark(ChannelId::AgentOutputs, changed, state);
        }
        if let Some(value) = partial.validation_passed {
            let changed = state.validation_passed != value;
            state.validation_passed = value;
            mark(ChannelId::ValidationPassed, changed, state);
        }
        if let Some(value) = partial.validation_feedback {
            let changed = state.validation_feedback.as_deref() != Some(value.as_str());
            state.validation_feedback = Some(value);
            mark(ChannelId::ValidationFeedback, changed, state);
        }
        if let Some(value) = partial.retry_count {
            let changed = state.retry_count != value;
            state.retry_count = value;
            mark(ChannelId::RetryCount, changed, state);
        }
        if let Some(value) = partial.report {
            let changed = state.report.as_deref() != Some(value.as_str());
            state.report = Some(value);
            mark(ChannelId::Report, changed, state);
        }
        if let Some(value) = partial.published_location {
            let changed = state.published_location.as_deref() != Some(value.as_str());
            state.published_location = Some(value);
            mark(ChannelId::PublishedLocation, changed, state);
        }
        if let Some(items) = partial.errors {
            let changed = !items.is_empty();
            state.errors.extend(items);
            mark(ChannelId::Errors, changed, state);
        }

        debug!(written = ?written, "applied step partial");
        Ok(written)
    }
}
