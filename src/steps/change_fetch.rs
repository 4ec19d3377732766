//! Fetches change metadata and the file-change list from the host.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::channels::RunError;
use crate::model::ChangeRef;
use crate::providers::ChangeHost;
use crate::state::StateSnapshot;
use crate::step::{Step, StepContext, StepError, StepPartial};
use crate::types::StepId;

pub struct ChangeFetchStep {
    host: Arc<dyn ChangeHost>,
}

impl ChangeFetchStep {
    #[must_use]
    pub fn new(host: Arc<dyn ChangeHost>) -> Self {
        ChangeFetchStep { host }
    }
}

#[async_trait]
impl Step for ChangeFetchStep {
    #[instrument(skip_all, fields(change_ref = %snapshot.input.change_ref))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        let change = match ChangeRef::parse(&snapshot.input.change_ref) {
            Ok(change) => change,
            Err(parse_error) => {
                // the run continues degraded; discovery routes around the scan
                warn!(error = %parse_error, "could not parse change reference");
                return Ok(StepPartial::new().with_error(RunError::input(parse_error.to_string())));
            }
        };
        info!(change = %change, "fetching change details");

        let metadata = match self.host.fetch_metadata(&change).await {
            Ok(metadata) => metadata,
            Err(provider_error) => {
                warn!(error = %provider_error, "metadata fetch failed");
                return Ok(StepPartial::new().with_error(RunError::step(
                    StepId::ChangeFetch,
                    format!("failed to fetch change metadata: {provider_error}"),
                )));
            }
        };

        let mut partial = StepPartial::new();
        match self.host.fetch_change_list(&change).await {
            Ok(changes) => {
                info!(title = %metadata.title, files = changes.len(), "change fetched");
                partial.change_list = Some(changes);
            }
            Err(provider_error) => {
                warn!(error = %provider_error, "change list fetch failed");
                partial = partial.with_error(RunError::step(
                    StepId::ChangeFetch,
                    format!("failed to fetch change list: {provider_error}"),
                ));
            }
        }
        partial.change_metadata = Some(metadata);
        Ok(partial)
    }
}
