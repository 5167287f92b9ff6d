//! Compiled pipeline definitions
//!
//! A pipeline package is the workflow document produced by the pipeline
//! compiler. Only two fields matter for deployment: `spec.entrypoint`, which
//! names the pipeline resource, and `metadata.annotations`, which becomes its
//! description. The rest of the document is the service's concern and is
//! uploaded untouched.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Failed to read pipeline package {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse pipeline package: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Pipeline package has no `spec.entrypoint`")]
    MissingEntrypoint,

    #[error("Pipeline annotations cannot be rendered as text: {0}")]
    InvalidAnnotations(String),

    #[error("Invalid pipeline DAG: {0}")]
    InvalidDag(String),
}

/// Raw bytes of a package plus the file name to upload them under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePackage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A parsed pipeline package
#[derive(Debug, Clone)]
pub struct PipelineDefinition {
    name: String,
    description: Option<String>,
    document: Value,
    package: PipelinePackage,
}

/// One step of the entry DAG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagTask {
    pub name: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Template {
    name: String,
    #[serde(default)]
    dag: Option<Dag>,
}

#[derive(Debug, Deserialize)]
struct Dag {
    #[serde(default)]
    tasks: Vec<DagTask>,
}

impl PipelineDefinition {
    /// Read a package from disk
    ///
    /// The file is read exactly once; the same bytes are kept for upload.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DefinitionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pipeline.yaml".to_string());

        Self::from_package(PipelinePackage { file_name, bytes })
    }

    /// Parse a package held in memory
    pub fn from_package(package: PipelinePackage) -> Result<Self, DefinitionError> {
        let document: Value = serde_yaml::from_slice(&package.bytes)?;

        let name = document
            .get("spec")
            .and_then(|spec| spec.get("entrypoint"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or(DefinitionError::MissingEntrypoint)?
            .to_string();

        let description = match document
            .get("metadata")
            .and_then(|meta| meta.get("annotations"))
        {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(
                serde_json::to_string(other)
                    .map_err(|e| DefinitionError::InvalidAnnotations(e.to_string()))?,
            ),
        };

        Ok(Self {
            name,
            description,
            document,
            package,
        })
    }

    /// Parse a package from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, DefinitionError> {
        Self::from_package(PipelinePackage {
            file_name: "pipeline.yaml".to_string(),
            bytes: text.as_bytes().to_vec(),
        })
    }

    /// Pipeline resource name, taken from the entry point
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn package(&self) -> &PipelinePackage {
        &self.package
    }

    /// Tasks of the entry template's DAG, each after all of its dependencies
    ///
    /// Ties keep document order. A package whose entry template is not a DAG
    /// has no steps.
    pub fn steps(&self) -> Result<Vec<DagTask>, DefinitionError> {
        let templates = match self.document.get("spec").and_then(|s| s.get("templates")) {
            Some(value) => serde_yaml::from_value::<Vec<Template>>(value.clone())
                .map_err(|e| DefinitionError::InvalidDag(e.to_string()))?,
            None => return Ok(Vec::new()),
        };

        let tasks = templates
            .into_iter()
            .find(|t| t.name == self.name)
            .and_then(|t| t.dag)
            .map(|d| d.tasks)
            .unwrap_or_default();

        order_tasks(tasks)
    }
}

/// Kahn's algorithm over task names
fn order_tasks(tasks: Vec<DagTask>) -> Result<Vec<DagTask>, DefinitionError> {
    let index: HashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();

    let mut pending = vec![0usize; tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];

    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.dependencies {
            let &d = index.get(dep.as_str()).ok_or_else(|| {
                DefinitionError::InvalidDag(format!(
                    "task `{}` depends on unknown task `{}`",
                    task.name, dep
                ))
            })?;
            pending[i] += 1;
            dependents[d].push(i);
        }
    }

    // Earliest ready task in document order goes next
    let mut ready: BTreeSet<usize> = (0..tasks.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(tasks.len());

    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &j in &dependents[i] {
            pending[j] -= 1;
            if pending[j] == 0 {
                ready.insert(j);
            }
        }
    }

    if order.len() != tasks.len() {
        return Err(DefinitionError::InvalidDag(
            "dependency cycle between tasks".to_string(),
        ));
    }

    let mut slots: Vec<Option<DagTask>> = tasks.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}
