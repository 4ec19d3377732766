//! docsmith: a typed, graph-driven orchestration engine for multi-step
//! documentation analysis of code-change submissions.
//!
//! A run walks a fixed graph of steps: fetch the change, discover and scan
//! repository documentation, audit the change against it, dispatch
//! specialized sub-tasks (technical writer, diagram architect, correction),
//! review the accumulated findings with a bounded retry loop, then render
//! and publish a markdown report.
//!
//! # Architecture
//!
//! - [`state`]: the typed channel store ([`state::WorkflowState`]) and the
//!   immutable snapshots steps read
//! - [`step`]: the async [`step::Step`] trait and the partial updates steps
//!   emit
//! - [`reducers`]: per-channel merge semantics, including the deduplicating
//!   findings merge, and the write-set contract between steps and channels
//! - [`graphs`]: graph assembly and conditional-edge routing
//! - [`runtime`]: the driver, the retry controller, settings, and the
//!   standard graph wiring ([`runtime::standard_workflow`])
//! - [`providers`]: injected collaborator traits for the change host,
//!   repository inventory, and language model
//! - [`steps`]: the concrete step implementations
//! - [`mermaid`], [`report`]: diagram sanitizing and report rendering
//!
//! # Design tenets
//!
//! Steps are pure with respect to state: they read snapshots and return
//! partials; only the reducer registry mutates the store. Step failures
//! degrade a run (an append to the error list); contract violations such as
//! undeclared channel writes or a router leaving its candidate set abort it.

pub mod channels;
pub mod graphs;
pub mod mermaid;
pub mod model;
pub mod providers;
pub mod reducers;
pub mod report;
pub mod runtime;
pub mod state;
pub mod step;
pub mod steps;
pub mod telemetry;
pub mod types;
