//! Run orchestration: configuration, the retry loop, the driver, and the
//! standard graph wiring.

pub mod driver;
pub mod retry;
pub mod settings;

use std::sync::Arc;

use crate::graphs::{GraphBuilder, GraphBuildError, Workflow, edges};
use crate::providers::{ChangeHost, DocModel, RepoInventory};
use crate::steps::{
    AnalysisStep, ChangeFetchStep, CommentPublishStep, CorrectionStep, DiagramArchitectStep,
    DocDiscoveryStep, RepoScanStep, ReportRenderStep, TechnicalWriterStep, ValidationStep,
};
use crate::types::StepId;

pub use driver::{Driver, DriverError};
pub use retry::RetryController;
pub use settings::{Settings, SettingsError};

/// Wires the standard analysis graph:
///
/// ```text
/// start -> change_fetch -> doc_discovery
///            doc_discovery -> repo_scan | analysis     (degraded runs skip the scan)
///            repo_scan -> analysis
///            analysis -> [sub-task chain] -> validation
///            validation -> analysis | report_render    (bounded retry)
///            report_render -> comment_publish -> end
/// ```
pub fn standard_workflow(
    host: Arc<dyn ChangeHost>,
    inventory: Arc<dyn RepoInventory>,
    model: Arc<dyn DocModel>,
    settings: &Settings,
) -> Result<Workflow, GraphBuildError> {
    let retry = RetryController::new(settings.max_retries);

    GraphBuilder::new()
        .add_step(StepId::ChangeFetch, Arc::new(ChangeFetchStep::new(host.clone())))
        .add_step(StepId::DocDiscovery, Arc::new(DocDiscoveryStep::new()))
        .add_step(StepId::RepoScan, Arc::new(RepoScanStep::new(inventory)))
        .add_step(StepId::Analysis, Arc::new(AnalysisStep::new(model.clone())))
        .add_step(
            StepId::TechnicalWriter,
            Arc::new(TechnicalWriterStep::new(model.clone())),
        )
        .add_step(
            StepId::DiagramArchitect,
            Arc::new(DiagramArchitectStep::new(model.clone())),
        )
        .add_step(StepId::Correction, Arc::new(CorrectionStep::new(model.clone())))
        .add_step(StepId::Validation, Arc::new(ValidationStep::new(model)))
        .add_step(StepId::ReportRender, Arc::new(ReportRenderStep::new()))
        .add_step(StepId::CommentPublish, Arc::new(CommentPublishStep::new(host)))
        .add_edge(StepId::Start, StepId::ChangeFetch)
        .add_edge(StepId::ChangeFetch, StepId::DocDiscovery)
        .add_router(StepId::DocDiscovery, edges::post_discovery())
        .add_edge(StepId::RepoScan, StepId::Analysis)
        .add_router(StepId::Analysis, edges::sub_task_chain())
        .add_router(StepId::TechnicalWriter, edges::sub_task_chain())
        .add_router(StepId::DiagramArchitect, edges::sub_task_chain())
        .add_router(StepId::Correction, edges::sub_task_chain())
        .add_router(StepId::Validation, retry.router())
        .add_edge(StepId::ReportRender, StepId::CommentPublish)
        .add_edge(StepId::CommentPublish, StepId::End)
        .compile()
}
