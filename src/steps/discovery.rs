//! Inspects change metadata for documentation hints.
//!
//! Writes nothing; its value is in the logs and in positioning the
//! post-discovery router. External documentation sources (doc sites, mkdocs
//! configs) would hook in here.

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::state::StateSnapshot;
use crate::step::{Step, StepContext, StepError, StepPartial};

const DOC_KEYWORDS: &[&str] = &[
    "documentation",
    "docs",
    "readme",
    "changelog",
    "api reference",
    "getting started",
    "installation",
    "configuration",
];

const DOC_FILE_HINTS: &[&str] = &[
    "readme",
    "changelog",
    "contributing",
    "license",
    "authors",
    "history",
    "api",
    "docs/",
    "documentation/",
    ".md",
    ".rst",
    ".txt",
];

fn is_doc_related(path: &str) -> bool {
    let lower = path.to_lowercase();
    DOC_FILE_HINTS.iter().any(|hint| lower.contains(hint))
}

#[derive(Default)]
pub struct DocDiscoveryStep;

impl DocDiscoveryStep {
    #[must_use]
    pub fn new() -> Self {
        DocDiscoveryStep
    }
}

#[async_trait]
impl Step for DocDiscoveryStep {
    #[instrument(skip_all)]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: StepContext,
    ) -> Result<StepPartial, StepError> {
        let Some(metadata) = &snapshot.change_metadata else {
            warn!("no change metadata available for discovery");
            return Ok(StepPartial::new());
        };
        info!(title = %metadata.title, "discovering documentation context");

        let body = metadata.body.as_deref().unwrap_or_default().to_lowercase();
        let found: Vec<&str> = DOC_KEYWORDS
            .iter()
            .copied()
            .filter(|kw| body.contains(kw))
            .collect();
        if !found.is_empty() {
            info!(keywords = ?found, "documentation keywords in change description");
        }

        let doc_files: Vec<&str> = snapshot
            .change_list
            .iter()
            .map(|fc| fc.path.as_str())
            .filter(|path| is_doc_related(path))
            .collect();
        if !doc_files.is_empty() {
            info!(files = ?doc_files, "documentation files touched by the change");
        }

        Ok(StepPartial::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_related_paths() {
        assert!(is_doc_related("README.md"));
        assert!(is_doc_related("docs/guide.rst"));
        assert!(is_doc_related("CHANGELOG"));
        assert!(!is_doc_related("src/main.rs"));
    }
}
