//! In-memory pipeline service for service-layer tests

use async_trait::async_trait;
use kfdeploy_client::{ClientError, PipelineApi, Result};
use kfdeploy_core::definition::PipelinePackage;
use kfdeploy_core::domain::experiment::Experiment;
use kfdeploy_core::domain::pipeline::{Pipeline, PipelineVersion};
use kfdeploy_core::domain::run::{Run, RunDetail};
use kfdeploy_core::dto::run::CreateRun;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One scripted answer to a run lookup
#[derive(Debug, Clone)]
pub enum Poll {
    Status(&'static str),
    Fail(u16),
}

#[derive(Default)]
struct State {
    pipelines: Vec<Pipeline>,
    versions: Vec<(String, PipelineVersion)>,
    experiments: Vec<Experiment>,
    created_runs: Vec<CreateRun>,
    polls: HashMap<String, VecDeque<Poll>>,
    calls: Vec<String>,
    fail_lookup: Option<u16>,
    fail_create_pipeline: Option<u16>,
    fail_upload_version: Option<u16>,
    fail_create_run: Option<u16>,
}

#[derive(Default)]
pub struct FakeService {
    state: Mutex<State>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_experiment(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().experiments.push(Experiment {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            created_at: None,
            resource_references: Vec::new(),
            storage_state: None,
        });
        self
    }

    pub fn with_pipeline(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().pipelines.push(Pipeline {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            created_at: None,
            default_version: None,
        });
        self
    }

    /// Answers for successive `get_run` calls; the last one repeats
    pub fn with_polls(self, run_id: &str, polls: Vec<Poll>) -> Self {
        self.state
            .lock()
            .unwrap()
            .polls
            .insert(run_id.to_string(), polls.into());
        self
    }

    pub fn failing_lookup(self, status: u16) -> Self {
        self.state.lock().unwrap().fail_lookup = Some(status);
        self
    }

    pub fn failing_create_pipeline(self, status: u16) -> Self {
        self.state.lock().unwrap().fail_create_pipeline = Some(status);
        self
    }

    pub fn failing_upload_version(self, status: u16) -> Self {
        self.state.lock().unwrap().fail_upload_version = Some(status);
        self
    }

    pub fn failing_create_run(self, status: u16) -> Self {
        self.state.lock().unwrap().fail_create_run = Some(status);
        self
    }

    /// Names of the trait methods called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn pipeline_count(&self) -> usize {
        self.state.lock().unwrap().pipelines.len()
    }

    /// Version names uploaded for `pipeline_id`
    pub fn versions_of(&self, pipeline_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .versions
            .iter()
            .filter(|(owner, _)| owner == pipeline_id)
            .map(|(_, v)| v.name.clone())
            .collect()
    }

    pub fn created_runs(&self) -> Vec<CreateRun> {
        self.state.lock().unwrap().created_runs.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

fn rejected(status: u16) -> ClientError {
    ClientError::api_error(status, "rejected by fake service")
}

#[async_trait]
impl PipelineApi for FakeService {
    async fn find_pipeline_id(&self, name: &str) -> Result<Option<String>> {
        self.record("find_pipeline_id");
        let state = self.state.lock().unwrap();
        if let Some(status) = state.fail_lookup {
            return Err(rejected(status));
        }
        Ok(state
            .pipelines
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone()))
    }

    async fn upload_pipeline(
        &self,
        _package: &PipelinePackage,
        name: &str,
        description: Option<&str>,
    ) -> Result<Pipeline> {
        self.record("upload_pipeline");
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.fail_create_pipeline {
            return Err(rejected(status));
        }
        let pipeline = Pipeline {
            id: format!("pipeline-{}", state.pipelines.len() + 1),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: None,
            default_version: None,
        };
        state.pipelines.push(pipeline.clone());
        Ok(pipeline)
    }

    async fn upload_pipeline_version(
        &self,
        _package: &PipelinePackage,
        pipeline_id: &str,
        version_name: &str,
        description: Option<&str>,
    ) -> Result<PipelineVersion> {
        self.record("upload_pipeline_version");
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.fail_upload_version {
            return Err(rejected(status));
        }
        if !state.pipelines.iter().any(|p| p.id == pipeline_id) {
            return Err(ClientError::api_error(404, "pipeline not found"));
        }
        let version = PipelineVersion {
            id: format!("version-{}", state.versions.len() + 1),
            name: version_name.to_string(),
            description: description.map(str::to_string),
            created_at: None,
            resource_references: Vec::new(),
        };
        state
            .versions
            .push((pipeline_id.to_string(), version.clone()));
        Ok(version)
    }

    async fn find_experiment(&self, name: &str) -> Result<Option<Experiment>> {
        self.record("find_experiment");
        let state = self.state.lock().unwrap();
        Ok(state.experiments.iter().find(|e| e.name == name).cloned())
    }

    async fn create_run(&self, req: &CreateRun) -> Result<RunDetail> {
        self.record("create_run");
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.fail_create_run {
            return Err(rejected(status));
        }
        state.created_runs.push(req.clone());
        Ok(RunDetail {
            run: Run {
                id: format!("run-{}", state.created_runs.len()),
                name: req.name.clone(),
                description: None,
                status: None,
                created_at: None,
                scheduled_at: None,
                finished_at: None,
                error: None,
                pipeline_spec: Some(req.pipeline_spec.clone()),
                resource_references: req.resource_references.clone(),
            },
            pipeline_runtime: None,
        })
    }

    async fn get_run(&self, run_id: &str) -> Result<RunDetail> {
        self.record("get_run");
        let mut state = self.state.lock().unwrap();
        let polls = state
            .polls
            .get_mut(run_id)
            .ok_or_else(|| ClientError::api_error(404, "run not found"))?;

        let poll = if polls.len() > 1 {
            polls.pop_front()
        } else {
            polls.front().cloned()
        };

        match poll {
            Some(Poll::Status(status)) => Ok(RunDetail {
                run: Run {
                    id: run_id.to_string(),
                    name: "run".to_string(),
                    description: None,
                    status: Some(status.to_string()),
                    created_at: None,
                    scheduled_at: None,
                    finished_at: None,
                    error: None,
                    pipeline_spec: None,
                    resource_references: Vec::new(),
                },
                pipeline_runtime: None,
            }),
            Some(Poll::Fail(status)) => Err(rejected(status)),
            None => Err(ClientError::api_error(404, "run not found")),
        }
    }
}
