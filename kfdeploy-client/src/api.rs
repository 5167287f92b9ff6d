//! Session-handle contract
//!
//! Everything the deploy, run and wait steps need from the service, as one
//! trait. [`Session`](crate::Session) implements it over HTTP; tests swap in
//! an in-memory registry.

use async_trait::async_trait;
use kfdeploy_core::definition::PipelinePackage;
use kfdeploy_core::domain::experiment::Experiment;
use kfdeploy_core::domain::pipeline::{Pipeline, PipelineVersion};
use kfdeploy_core::domain::run::RunDetail;
use kfdeploy_core::dto::run::CreateRun;

use crate::error::Result;

/// Operations against the pipeline/version/experiment/run registry
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Id of the pipeline resource named `name`, if one exists
    async fn find_pipeline_id(&self, name: &str) -> Result<Option<String>>;

    /// Register `package` as a new pipeline resource
    async fn upload_pipeline(
        &self,
        package: &PipelinePackage,
        name: &str,
        description: Option<&str>,
    ) -> Result<Pipeline>;

    /// Upload `package` as a new version of pipeline `pipeline_id`
    async fn upload_pipeline_version(
        &self,
        package: &PipelinePackage,
        pipeline_id: &str,
        version_name: &str,
        description: Option<&str>,
    ) -> Result<PipelineVersion>;

    /// Experiment named `name` in the session's namespace, if any
    async fn find_experiment(&self, name: &str) -> Result<Option<Experiment>>;

    /// Start a new run
    async fn create_run(&self, req: &CreateRun) -> Result<RunDetail>;

    /// Current state of a run
    async fn get_run(&self, run_id: &str) -> Result<RunDetail>;
}
