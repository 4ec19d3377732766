//! The executable steps of the analysis pipeline.
//!
//! Each step holds its own collaborator handles and turns a snapshot into a
//! [`StepPartial`](crate::step::StepPartial). Provider failures are handled
//! inside the steps that can continue degraded; the ones that cannot return
//! a [`StepError`](crate::step::StepError) and let the driver record it.

pub mod agents;
pub mod analysis;
pub mod change_fetch;
pub mod comment_publish;
pub mod discovery;
pub mod report_render;
pub mod repo_scan;
pub mod validation;

pub use agents::{CorrectionStep, DiagramArchitectStep, TechnicalWriterStep};
pub use analysis::AnalysisStep;
pub use change_fetch::ChangeFetchStep;
pub use comment_publish::CommentPublishStep;
pub use discovery::DocDiscoveryStep;
pub use report_render::ReportRenderStep;
pub use repo_scan::RepoScanStep;
pub use validation::ValidationStep;
