//! Runner
//!
//! Starts a run of a deployed pipeline version inside a named experiment.

use chrono::{DateTime, FixedOffset, Utc};
use kfdeploy_client::{ClientError, PipelineApi};
use kfdeploy_core::domain::run::Run;
use kfdeploy_core::dto::run::CreateRun;
use kfdeploy_core::params::Parameters;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Experiment '{0}' does not exist in this namespace")]
    ExperimentNotFound(String),

    #[error("Failed to look up experiment '{name}': {source}")]
    ExperimentLookup {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to start run: {0}")]
    StartRun(#[source] ClientError),
}

/// Display name of a run started at `now`
///
/// The timestamp is rendered at `offset` as `YYYY-MM-DD HH:MM:SS[.ffffff]+HH:MM`;
/// the fraction is left out when it is zero.
pub fn job_label(now: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = now.with_timezone(&offset);
    let stamp = if local.timestamp_subsec_micros() == 0 {
        local.format("%Y-%m-%d %H:%M:%S%:z")
    } else {
        local.format("%Y-%m-%d %H:%M:%S%.6f%:z")
    };
    format!("Run at {}", stamp)
}

/// Start a run of `version_id` in experiment `experiment_name`
///
/// # Arguments
/// * `session` - Session scoped to the experiment's namespace
/// * `experiment_name` - Existing experiment; never created here
/// * `version_id` - Pipeline version to run
/// * `parameters` - Passed to the run unchanged
/// * `label_offset` - UTC offset used for the run's display name
pub async fn run<S: PipelineApi + ?Sized>(
    session: &S,
    experiment_name: &str,
    version_id: &str,
    parameters: &Parameters,
    label_offset: FixedOffset,
) -> Result<Run, RunError> {
    let experiment = session
        .find_experiment(experiment_name)
        .await
        .map_err(|e| {
            error!("Failed to look up experiment '{}': {}", experiment_name, e);
            RunError::ExperimentLookup {
                name: experiment_name.to_string(),
                source: e,
            }
        })?
        .ok_or_else(|| {
            error!("Experiment '{}' not found", experiment_name);
            RunError::ExperimentNotFound(experiment_name.to_string())
        })?;

    if experiment.is_archived() {
        warn!("Experiment '{}' is archived", experiment.name);
    }

    let label = job_label(Utc::now(), label_offset);
    let req = CreateRun::new(&label, &experiment.id, version_id, parameters);

    let detail = session.create_run(&req).await.map_err(|e| {
        error!("Failed to start run '{}': {}", label, e);
        RunError::StartRun(e)
    })?;

    info!(
        "Started run '{}' ({}) in experiment '{}' with {} parameter(s)",
        detail.run.name,
        detail.run.id,
        experiment.name,
        parameters.len()
    );

    Ok(detail.run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::FakeService;
    use chrono::{TimeDelta, TimeZone};
    use kfdeploy_core::domain::pipeline::ResourceType;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_job_label_at_offset() {
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 3, 0, 0).unwrap();
        assert_eq!(job_label(now, jst()), "Run at 2024-04-01 12:00:00+09:00");

        let now = now + TimeDelta::microseconds(123_456);
        assert_eq!(job_label(now, jst()), "Run at 2024-04-01 12:00:00.123456+09:00");
    }

    #[test]
    fn test_job_label_other_offset() {
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 3, 0, 0).unwrap();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(job_label(now, offset), "Run at 2024-03-31 22:00:00-05:00");
    }

    #[tokio::test]
    async fn test_run_in_existing_experiment() {
        let service = FakeService::new().with_experiment("exp-1", "demo");
        let params = Parameters::from_yaml("epochs: 5\nbatch_size: 16\n").unwrap();

        let started = run(&service, "demo", "version-1", &params, jst()).await.unwrap();

        assert_eq!(started.experiment_id(), Some("exp-1"));
        assert!(started.name.starts_with("Run at "));
        assert!(started.name.contains("+09:00"));

        let created = service.created_runs();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].pipeline_spec.parameters.len(), 2);
        assert!(
            created[0]
                .resource_references
                .iter()
                .any(|r| r.key.kind == ResourceType::PipelineVersion && r.key.id == "version-1")
        );
    }

    #[tokio::test]
    async fn test_missing_experiment_fails_without_starting_run() {
        let service = FakeService::new().with_experiment("exp-1", "production");

        let result = run(&service, "demo", "version-1", &Parameters::default(), jst()).await;

        assert!(matches!(result, Err(RunError::ExperimentNotFound(name)) if name == "demo"));
        assert!(!service.calls().contains(&"create_run".to_string()));
    }

    #[tokio::test]
    async fn test_start_failure_is_reported() {
        let service = FakeService::new()
            .with_experiment("exp-1", "demo")
            .failing_create_run(500);

        let result = run(&service, "demo", "version-1", &Parameters::default(), jst()).await;

        assert!(matches!(result, Err(RunError::StartRun(e)) if e.is_server_error()));
    }
}
