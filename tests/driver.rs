//! End-to-end runs through the standard workflow with stub providers.

mod common;

use docsmith::model::{AgentName, Severity};
use docsmith::reducers::ReducerRegistry;
use docsmith::report::COMMENT_MARKER;
use docsmith::runtime::{Driver, DriverError, Settings, standard_workflow};
use docsmith::state::RunInput;

use common::{StubHost, StubInventory, StubModel};

fn driver(
    host: std::sync::Arc<StubHost>,
    inventory: std::sync::Arc<StubInventory>,
    model: std::sync::Arc<StubModel>,
    settings: &Settings,
) -> Driver {
    let workflow = standard_workflow(host, inventory, model, settings)
        .expect("standard workflow compiles");
    Driver::new(workflow, ReducerRegistry::default())
}

#[tokio::test]
async fn happy_path_publishes_a_marked_report() {
    let host = StubHost::new();
    let model = StubModel::passing(
        vec![common::finding("Export endpoint undocumented", Severity::High)],
        vec![AgentName::TechnicalWriter],
    );
    let driver = driver(
        host.clone(),
        StubInventory::documented(),
        model.clone(),
        &Settings::default(),
    );

    let state = driver.run(RunInput::new("acme/widgets#42")).await.unwrap();

    assert!(state.validation_passed);
    assert_eq!(model.audits(), 1);
    assert_eq!(state.findings.len(), 1);
    assert_eq!(state.agent_outputs.len(), 1);
    assert!(state.errors.is_empty());

    let report = state.report.as_deref().unwrap();
    assert!(report.contains("Export endpoint undocumented"));

    let published = host.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1, COMMENT_MARKER);
    assert_eq!(published[0].2, report);
    assert!(state.published_location.as_deref().unwrap().contains("comment-1"));
}

#[tokio::test]
async fn agents_run_in_priority_order() {
    let model = StubModel::passing(
        vec![common::finding("Pipeline needs explaining", Severity::Medium)],
        vec![AgentName::DiagramArchitect, AgentName::TechnicalWriter],
    );
    let driver = driver(
        StubHost::new(),
        StubInventory::documented(),
        model,
        &Settings::default(),
    );

    let state = driver.run(RunInput::new("acme/widgets#42")).await.unwrap();

    let order: Vec<AgentName> = state.agent_outputs.iter().map(|o| o.agent).collect();
    assert_eq!(order, vec![AgentName::TechnicalWriter, AgentName::DiagramArchitect]);
    assert!(state.agent_outputs[1].diagram.is_some());
}

#[tokio::test]
async fn disabled_diagrams_skip_the_architect() {
    let model = StubModel::passing(
        vec![common::finding("Pipeline needs explaining", Severity::Medium)],
        vec![AgentName::TechnicalWriter, AgentName::DiagramArchitect],
    );
    let driver = driver(
        StubHost::new(),
        StubInventory::documented(),
        model,
        &Settings::default(),
    );

    let input = RunInput::new("acme/widgets#42").enable_diagrams(false);
    let state = driver.run(input).await.unwrap();

    let order: Vec<AgentName> = state.agent_outputs.iter().map(|o| o.agent).collect();
    assert_eq!(order, vec![AgentName::TechnicalWriter]);
}

#[tokio::test]
async fn rejected_validation_retries_to_the_ceiling() {
    let model = StubModel::rejecting(vec![common::finding(
        "Config keys undescribed",
        Severity::Medium,
    )]);
    let settings = Settings::default().with_max_retries(2);
    let driver = driver(StubHost::new(), StubInventory::documented(), model.clone(), &settings);

    let state = driver.run(RunInput::new("acme/widgets#42")).await.unwrap();

    // ceiling of 2 retries allows 3 analysis passes in total
    assert_eq!(model.audits(), 3);
    assert_eq!(model.reviews(), 3);
    assert_eq!(state.retry_count, 3);
    assert!(!state.validation_passed);

    // the run still finishes and the report owns up to it
    let report = state.report.as_deref().unwrap();
    assert!(report.contains("Validation did not pass after 3"));
}

#[tokio::test]
async fn unparseable_change_ref_degrades_but_completes() {
    let host = StubHost::new();
    let model = StubModel::passing(Vec::new(), Vec::new());
    let driver = driver(
        host.clone(),
        StubInventory::documented(),
        model.clone(),
        &Settings::default(),
    );

    let state = driver.run(RunInput::new("definitely not a change ref")).await.unwrap();

    assert!(state.change_metadata.is_none());
    // the scan is skipped on degraded runs, and analysis has nothing to audit
    assert!(state.documentation_status.is_none());
    assert_eq!(model.audits(), 0);
    assert!(state.report.is_some());
    // the input error plus the publish failure for want of metadata
    assert!(state.errors.len() >= 2);
    assert_eq!(host.publish_count(), 0);
    assert!(state.published_location.is_none());
}

#[tokio::test]
async fn host_failure_degrades_but_completes() {
    let host = StubHost::failing();
    let driver = driver(
        host.clone(),
        StubInventory::documented(),
        StubModel::passing(Vec::new(), Vec::new()),
        &Settings::default(),
    );

    let state = driver.run(RunInput::new("acme/widgets#42")).await.unwrap();

    assert!(state.change_metadata.is_none());
    assert!(!state.errors.is_empty());
    assert_eq!(host.publish_count(), 0);
}

#[tokio::test]
async fn skip_side_effects_renders_without_publishing() {
    let host = StubHost::new();
    let driver = driver(
        host.clone(),
        StubInventory::documented(),
        StubModel::passing(
            vec![common::finding("Readme misses the new flag", Severity::Low)],
            Vec::new(),
        ),
        &Settings::default(),
    );

    let input = RunInput::new("acme/widgets#42").skip_side_effects(true);
    let state = driver.run(input).await.unwrap();

    assert!(state.report.is_some());
    assert_eq!(host.publish_count(), 0);
    assert!(state.published_location.is_none());
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn exhausted_step_budget_aborts() {
    let workflow = standard_workflow(
        StubHost::new(),
        StubInventory::documented(),
        StubModel::passing(Vec::new(), Vec::new()),
        &Settings::default(),
    )
    .unwrap();
    let driver = Driver::new(workflow, ReducerRegistry::default()).with_step_budget(2);

    let result = driver.run(RunInput::new("acme/widgets#42")).await;
    assert!(matches!(result, Err(DriverError::StepBudgetExhausted { budget: 2 })));
}
