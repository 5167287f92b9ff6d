//! Experiment domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pipeline::ResourceReference;

/// A pre-existing grouping of runs, looked up by name and never created here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource_references: Vec<ResourceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_state: Option<String>,
}

impl Experiment {
    /// Archived experiments still resolve by name but reject new runs
    pub fn is_archived(&self) -> bool {
        self.storage_state.as_deref() == Some("STORAGESTATE_ARCHIVED")
    }
}
