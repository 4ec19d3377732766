//! Scans the repository for documentation and, when there is none, for
//! source context to analyze instead.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::channels::RunError;
use crate::model::{DocCoverage, DocumentationStatus, summarize_repo_structure};
use crate::providers::RepoInventory;
use crate::state::StateSnapshot;
use crate::step::{Step, StepContext, StepError, StepPartial};
use crate::types::StepId;

pub struct RepoScanStep {
    inventory: Arc<dyn RepoInventory>,
}

impl RepoScanStep {
    #[must_use]
    pub fn new(inventory: Arc<dyn RepoInventory>) -> Self {
        RepoScanStep { inventory }
    }
}

#[async_trait]
impl Step for RepoScanStep {
    #[instrument(skip_all)]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        let Some(metadata) = &snapshot.change_metadata else {
            warn!("no change metadata available for repo scan");
            return Ok(StepPartial::new().with_error(RunError::step(
                StepId::RepoScan,
                "no change metadata available for repo scan",
            )));
        };
        let (owner, repo, branch) = (&metadata.owner, &metadata.repo, &metadata.base_branch);
        info!(%owner, %repo, %branch, "scanning repository");

        let documentation = match self.inventory.fetch_documentation(owner, repo, branch).await {
            Ok(files) => files,
            Err(provider_error) => {
                warn!(error = %provider_error, "repository scan failed");
                return Ok(StepPartial::new().with_error(RunError::step(
                    StepId::RepoScan,
                    format!("failed to scan repository: {provider_error}"),
                )));
            }
        };
        info!(count = documentation.len(), "documentation files found");

        let status = DocumentationStatus::summarize(&documentation);
        info!(coverage = ?status.coverage, "documentation status");

        let mut partial = StepPartial::new();

        match self.inventory.list_files(owner, repo, branch).await {
            Ok(all_files) => {
                partial.repo_structure = Some(summarize_repo_structure(&all_files));
            }
            Err(provider_error) => {
                warn!(error = %provider_error, "file listing failed");
                partial = partial.with_error(RunError::step(
                    StepId::RepoScan,
                    format!("failed to list repository files: {provider_error}"),
                ));
            }
        }

        // without documentation to audit, source files carry the analysis
        if status.coverage == DocCoverage::Missing {
            info!("documentation missing, fetching source files for analysis");
            match self.inventory.fetch_sources(owner, repo, branch).await {
                Ok(sources) => {
                    info!(count = sources.len(), "source files fetched");
                    partial.source_files = Some(sources);
                }
                Err(provider_error) => {
                    warn!(error = %provider_error, "source fetch failed");
                    partial = partial.with_error(RunError::step(
                        StepId::RepoScan,
                        format!("failed to fetch source files: {provider_error}"),
                    ));
                }
            }
        }

        partial.documentation_files = Some(documentation);
        partial.documentation_status = Some(status);
        Ok(partial)
    }
}
