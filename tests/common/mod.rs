//! Shared stubs and fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use docsmith::model::{
    AgentName, ChangeMetadata, ChangeRef, ChangeStatus, DocFile, DocType, FileChange, Finding,
    FindingType, Severity, SourceFile,
};
use docsmith::providers::{
    AuditOutcome, AuditRequest, ChangeHost, CorrectionOutcome, CorrectionRequest, DiagramOutcome,
    DiagramRequest, DocModel, ProviderError, RepoInventory, ReviewOutcome, ReviewRequest,
    WriterOutcome, WriterRequest,
};

pub fn metadata() -> ChangeMetadata {
    ChangeMetadata {
        owner: "acme".into(),
        repo: "widgets".into(),
        number: 42,
        title: "Add CSV export".into(),
        body: Some("Adds a CSV export endpoint and configuration.".into()),
        state: "open".into(),
        base_branch: "main".into(),
        head_branch: "feature/export".into(),
        author: "dev".into(),
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 2, 12, 0, 0).unwrap(),
        commits_count: 3,
        comments_count: 1,
    }
}

pub fn file_change(path: &str) -> FileChange {
    FileChange {
        path: path.into(),
        status: ChangeStatus::Modified,
        additions: 10,
        deletions: 2,
        patch: Some("@@ -1 +1 @@\n-old\n+new".into()),
        previous_path: None,
    }
}

pub fn doc_file(path: &str, content: &str) -> DocFile {
    DocFile {
        path: path.into(),
        doc_type: if path.to_lowercase().contains("readme") {
            DocType::Readme
        } else {
            DocType::Guide
        },
        content: Some(content.into()),
        size: content.len() as u64,
    }
}

pub fn finding(title: &str, severity: Severity) -> Finding {
    Finding::new(
        FindingType::MissingDoc,
        severity,
        title,
        "A description comfortably within the length bounds.",
    )
}

/// Host stub serving fixed metadata and recording publishes.
pub struct StubHost {
    pub fail_metadata: bool,
    pub published: Mutex<Vec<(ChangeRef, String, String)>>,
}

impl StubHost {
    pub fn new() -> Arc<Self> {
        Arc::new(StubHost {
            fail_metadata: false,
            published: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(StubHost {
            fail_metadata: true,
            published: Mutex::new(Vec::new()),
        })
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl ChangeHost for StubHost {
    async fn fetch_metadata(&self, _change: &ChangeRef) -> Result<ChangeMetadata, ProviderError> {
        if self.fail_metadata {
            return Err(ProviderError::host("change not found"));
        }
        Ok(metadata())
    }

    async fn fetch_change_list(
        &self,
        _change: &ChangeRef,
    ) -> Result<Vec<FileChange>, ProviderError> {
        if self.fail_metadata {
            return Err(ProviderError::host("change not found"));
        }
        Ok(vec![file_change("src/export.rs"), file_change("src/config.rs")])
    }

    async fn update_or_create_comment(
        &self,
        change: &ChangeRef,
        marker: &str,
        body: &str,
    ) -> Result<String, ProviderError> {
        self.published
            .lock()
            .unwrap()
            .push((change.clone(), marker.into(), body.into()));
        Ok(format!(
            "https://example.com/{}/{}/pull/{}#comment-1",
            change.owner, change.repo, change.number
        ))
    }
}

/// Inventory stub with a documented repository.
pub struct StubInventory {
    pub docs: Vec<DocFile>,
}

impl StubInventory {
    pub fn documented() -> Arc<Self> {
        Arc::new(StubInventory {
            docs: vec![
                doc_file("README.md", &"r".repeat(400)),
                doc_file("docs/guide.md", &"g".repeat(900)),
            ],
        })
    }

    pub fn undocumented() -> Arc<Self> {
        Arc::new(StubInventory { docs: Vec::new() })
    }
}

#[async_trait]
impl RepoInventory for StubInventory {
    async fn list_files(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<Vec<String>, ProviderError> {
        Ok(vec![
            "src/lib.rs".into(),
            "src/export.rs".into(),
            "README.md".into(),
        ])
    }

    async fn fetch_documentation(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<Vec<DocFile>, ProviderError> {
        Ok(self.docs.clone())
    }

    async fn fetch_sources(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<Vec<SourceFile>, ProviderError> {
        Ok(vec![SourceFile {
            path: "src/lib.rs".into(),
            content: "pub fn export() {}".into(),
            size: 18,
        }])
    }
}

/// Model stub with configurable audit output and review verdicts.
pub struct StubModel {
    pub audit_findings: Vec<Finding>,
    pub agents_needed: Vec<AgentName>,
    pub review_passes: bool,
    pub audit_calls: AtomicUsize,
    pub review_calls: AtomicUsize,
}

impl StubModel {
    pub fn passing(findings: Vec<Finding>, agents: Vec<AgentName>) -> Arc<Self> {
        Arc::new(StubModel {
            audit_findings: findings,
            agents_needed: agents,
            review_passes: true,
            audit_calls: AtomicUsize::new(0),
            review_calls: AtomicUsize::new(0),
        })
    }

    pub fn rejecting(findings: Vec<Finding>) -> Arc<Self> {
        Arc::new(StubModel {
            audit_findings: findings,
            agents_needed: Vec::new(),
            review_passes: false,
            audit_calls: AtomicUsize::new(0),
            review_calls: AtomicUsize::new(0),
        })
    }

    pub fn audits(&self) -> usize {
        self.audit_calls.load(Ordering::SeqCst)
    }

    pub fn reviews(&self) -> usize {
        self.review_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocModel for StubModel {
    async fn audit(&self, _request: AuditRequest) -> Result<AuditOutcome, ProviderError> {
        self.audit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AuditOutcome {
            summary: "audited".into(),
            findings: self.audit_findings.clone(),
            agents_needed: self.agents_needed.clone(),
        })
    }

    async fn write_documentation(
        &self,
        _request: WriterRequest,
    ) -> Result<WriterOutcome, ProviderError> {
        Ok(WriterOutcome {
            new_documentation: "## Quickstart\nRun the exporter.".into(),
            findings: Vec::new(),
            style_notes: Some("kept the existing heading style".into()),
        })
    }

    async fn draft_diagram(
        &self,
        _request: DiagramRequest,
    ) -> Result<DiagramOutcome, ProviderError> {
        Ok(DiagramOutcome {
            diagram_code: "flowchart TD\n  A[Export] --> B[CSV]".into(),
            description: "export pipeline".into(),
            finding: Finding::new(
                FindingType::DiagramNeeded,
                Severity::Medium,
                "Export pipeline diagram",
                "A flowchart of the export pipeline helps orientation.",
            ),
        })
    }

    async fn correct_documentation(
        &self,
        _request: CorrectionRequest,
    ) -> Result<CorrectionOutcome, ProviderError> {
        Ok(CorrectionOutcome {
            corrections: Vec::new(),
            suggested_updates: "update the configuration table".into(),
        })
    }

    async fn review(&self, _request: ReviewRequest) -> Result<ReviewOutcome, ProviderError> {
        self.review_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ReviewOutcome {
            passed: self.review_passes,
            feedback: if self.review_passes {
                "findings verified".into()
            } else {
                "severity levels look inflated, re-audit".into()
            },
            issues_found: Vec::new(),
        })
    }
}
