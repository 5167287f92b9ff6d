//! Pipeline domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named pipeline resource registered with the service
///
/// Created at most once per distinct name; later deploys reuse its `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<PipelineVersion>,
}

/// One uploaded revision of a pipeline resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineVersion {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource_references: Vec<ResourceReference>,
}

impl PipelineVersion {
    /// Id of the pipeline resource this version belongs to, if reported
    pub fn pipeline_id(&self) -> Option<&str> {
        self.resource_references
            .iter()
            .find(|r| r.key.kind == ResourceType::Pipeline)
            .map(|r| r.key.id.as_str())
    }
}

/// Link from one service entity to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReference {
    pub key: ResourceKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub relationship: Relationship,
}

impl ResourceReference {
    pub fn new(kind: ResourceType, id: impl Into<String>, relationship: Relationship) -> Self {
        Self {
            key: ResourceKey {
                kind,
                id: id.into(),
            },
            name: None,
            relationship,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKey {
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    UnknownResourceType,
    Experiment,
    Job,
    Pipeline,
    PipelineVersion,
    Namespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relationship {
    UnknownRelationship,
    Owner,
    Creator,
}
