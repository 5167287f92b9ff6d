//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::pipeline::{ResourceReference, ResourceType};
use crate::dto::run::PipelineSpec;

/// Text reported in place of a status when the waiter gives up
pub const TIMEOUT_SENTINEL: &str = "TimeoutError";

/// One execution of a pipeline version inside an experiment
///
/// `status` is owned by the service and changes asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_spec: Option<PipelineSpec>,
    #[serde(default)]
    pub resource_references: Vec<ResourceReference>,
}

impl Run {
    /// Parsed view of the raw status text
    pub fn run_status(&self) -> RunStatus {
        RunStatus::from_service(self.status.as_deref().unwrap_or_default())
    }

    /// Id of the experiment owning this run, if reported
    pub fn experiment_id(&self) -> Option<&str> {
        self.resource_references
            .iter()
            .find(|r| r.key.kind == ResourceType::Experiment)
            .map(|r| r.key.id.as_str())
    }
}

/// Body of the run lookup endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDetail {
    pub run: Run,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_runtime: Option<PipelineRuntime>,
}

/// Workflow manifest of a run as recorded by the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineRuntime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_manifest: Option<String>,
}

/// Run status in the service vocabulary
///
/// Pending -> Running -> {Succeeded | Failed | Error}. `Skipped` is also
/// terminal. Anything unrecognised is kept verbatim and treated as
/// non-terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Error,
    Skipped,
    Unknown(String),
}

impl RunStatus {
    /// Parse a status as reported by the service, ignoring case
    ///
    /// A run the service has not picked up yet reports an empty status.
    pub fn from_service(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "" | "pending" => RunStatus::Pending,
            "running" => RunStatus::Running,
            "succeeded" => RunStatus::Succeeded,
            "failed" => RunStatus::Failed,
            "error" => RunStatus::Error,
            "skipped" => RunStatus::Skipped,
            _ => RunStatus::Unknown(status.to_string()),
        }
    }

    /// Whether no further transition will occur
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Error | RunStatus::Skipped
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "Pending"),
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Succeeded => write!(f, "Succeeded"),
            RunStatus::Failed => write!(f, "Failed"),
            RunStatus::Error => write!(f, "Error"),
            RunStatus::Skipped => write!(f, "Skipped"),
            RunStatus::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// What the waiter observed
///
/// `TimedOut` is not a service status: it is only produced when the deadline
/// passes before a terminal status was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Terminal status text exactly as the service reported it
    Finished(String),
    /// No terminal status before the deadline
    TimedOut,
}

impl WaitOutcome {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitOutcome::Finished(status) => write!(f, "{}", status),
            WaitOutcome::TimedOut => write!(f, "{}", TIMEOUT_SENTINEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_ignores_case() {
        assert_eq!(RunStatus::from_service("Succeeded"), RunStatus::Succeeded);
        assert_eq!(RunStatus::from_service("FAILED"), RunStatus::Failed);
        assert_eq!(RunStatus::from_service("error"), RunStatus::Error);
        assert_eq!(RunStatus::from_service(""), RunStatus::Pending);
        assert_eq!(
            RunStatus::from_service("Terminating"),
            RunStatus::Unknown("Terminating".to_string())
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Error.is_terminal());
        assert!(RunStatus::Skipped.is_terminal());
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(!RunStatus::Unknown("Terminating".to_string()).is_terminal());
    }

    #[test]
    fn test_timeout_displays_sentinel() {
        assert_eq!(WaitOutcome::TimedOut.to_string(), "TimeoutError");
        assert_eq!(
            WaitOutcome::Finished("Succeeded".to_string()).to_string(),
            "Succeeded"
        );
        assert!(!WaitOutcome::Finished("TimeoutError".to_string()).is_timeout());
    }

    #[test]
    fn test_run_detail_parses_service_body() {
        let body = r#"{
            "run": {
                "id": "run-1",
                "name": "Run at 2024-04-01 12:00:00+09:00",
                "status": "Running",
                "created_at": "2024-04-01T03:00:00Z",
                "resource_references": [
                    {"key": {"type": "EXPERIMENT", "id": "exp-1"}, "relationship": "OWNER"},
                    {"key": {"type": "PIPELINE_VERSION", "id": "ver-1"}, "relationship": "CREATOR"}
                ]
            },
            "pipeline_runtime": {"workflow_manifest": "{}"}
        }"#;

        let detail: RunDetail = serde_json::from_str(body).unwrap();
        assert_eq!(detail.run.run_status(), RunStatus::Running);
        assert_eq!(detail.run.experiment_id(), Some("exp-1"));
        assert!(detail.pipeline_runtime.is_some());
    }
}
