//! Run DTOs

use serde::{Deserialize, Serialize};

use crate::domain::pipeline::{Relationship, ResourceReference, ResourceType};
use crate::params::Parameters;

/// A single run parameter as the service expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiParameter {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Pipeline portion of a run: which parameters it was started with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_name: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ApiParameter>,
}

/// Request to start a new run of a pipeline version inside an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRun {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pipeline_spec: PipelineSpec,
    pub resource_references: Vec<ResourceReference>,
}

impl CreateRun {
    /// Build a run request owned by `experiment_id` and created from `version_id`
    pub fn new(
        name: impl Into<String>,
        experiment_id: &str,
        version_id: &str,
        parameters: &Parameters,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            pipeline_spec: PipelineSpec {
                pipeline_id: None,
                pipeline_name: None,
                parameters: parameters.to_api_parameters(),
            },
            resource_references: vec![
                ResourceReference::new(ResourceType::Experiment, experiment_id, Relationship::Owner),
                ResourceReference::new(
                    ResourceType::PipelineVersion,
                    version_id,
                    Relationship::Creator,
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_run_body_shape() {
        let params = Parameters::from_yaml("epochs: 5\nlearning_rate: 0.005\n").unwrap();
        let req = CreateRun::new("Run at now", "exp-1", "ver-1", &params);

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["name"], "Run at now");
        assert_eq!(body["pipeline_spec"]["parameters"][0]["name"], "epochs");
        assert_eq!(body["pipeline_spec"]["parameters"][0]["value"], "5");
        assert_eq!(body["pipeline_spec"]["parameters"][1]["value"], "0.005");
        assert_eq!(body["resource_references"][0]["key"]["type"], "EXPERIMENT");
        assert_eq!(body["resource_references"][0]["relationship"], "OWNER");
        assert_eq!(body["resource_references"][1]["key"]["type"], "PIPELINE_VERSION");
        assert_eq!(body["resource_references"][1]["key"]["id"], "ver-1");
        assert_eq!(body["resource_references"][1]["relationship"], "CREATOR");
        assert!(body.get("description").is_none());
    }
}
