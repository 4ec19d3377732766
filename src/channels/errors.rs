use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::StepId;

/// A recoverable error recorded on the error-list channel.
///
/// Runs continue after appending one of these; only contract violations
/// abort the driver. Each event records when it happened, where, and a
/// human-readable message, plus optional structured details.
///
/// # Examples
///
/// ```
/// use docsmith::channels::errors::{ErrorScope, RunError};
/// use docsmith::types::StepId;
/// use serde_json::json;
///
/// let err = RunError::step(StepId::ChangeFetch, "host returned 404")
///     .with_details(json!({"status": 404}));
/// assert!(matches!(err.scope, ErrorScope::Step { .. }));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunError {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    pub scope: ErrorScope,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl RunError {
    /// Error raised while a specific step executed.
    pub fn step<M: Into<String>>(step: StepId, message: M) -> Self {
        RunError {
            when: Utc::now(),
            scope: ErrorScope::Step { step },
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    /// Error in the run input itself (for example an unparseable change
    /// reference).
    pub fn input<M: Into<String>>(message: M) -> Self {
        RunError {
            when: Utc::now(),
            scope: ErrorScope::Input,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    /// Attach structured details to the event.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            ErrorScope::Step { step } => write!(f, "[{step}] {}", self.message),
            ErrorScope::Input => write!(f, "[input] {}", self.message),
        }
    }
}

/// Where a recoverable error originated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Step { step: StepId },
    Input,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_scope() {
        let e = RunError::step(StepId::RepoScan, "tree fetch failed");
        assert_eq!(e.to_string(), "[repo_scan] tree fetch failed");
        let i = RunError::input("bad ref");
        assert_eq!(i.to_string(), "[input] bad ref");
    }

    #[test]
    fn serializes_with_tagged_scope() {
        let e = RunError::step(StepId::Analysis, "model unavailable");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["scope"]["scope"], "step");
        assert_eq!(v["scope"]["step"], "analysis");
    }
}
