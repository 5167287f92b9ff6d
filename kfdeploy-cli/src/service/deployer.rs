//! Deployer
//!
//! Uploads a compiled package as a new version of the pipeline resource named
//! by its entry point, creating that resource on first deploy.

use kfdeploy_client::{ClientError, PipelineApi};
use kfdeploy_core::definition::{DefinitionError, PipelineDefinition};
use kfdeploy_core::domain::pipeline::PipelineVersion;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Invalid pipeline package: {0}")]
    Definition(#[from] DefinitionError),

    #[error("Failed to look up pipeline '{name}': {source}")]
    Lookup {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to create pipeline '{name}': {source}")]
    CreatePipeline {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to upload version '{version}' of pipeline '{name}': {source}")]
    UploadVersion {
        name: String,
        version: String,
        #[source]
        source: ClientError,
    },
}

/// Outcome of a successful deploy
#[derive(Debug, Clone)]
pub struct Deployment {
    pub pipeline_name: String,
    pub pipeline_id: String,
    /// Whether this deploy registered the pipeline resource
    pub pipeline_created: bool,
    pub version: PipelineVersion,
}

/// Deploy the package at `pipeline_file_path` as version `version_name`
///
/// The file is read once. Nothing is uploaded if it cannot be parsed or has
/// no entry point.
pub async fn deploy<S: PipelineApi + ?Sized>(
    session: &S,
    pipeline_file_path: &Path,
    version_name: &str,
) -> Result<Deployment, DeployError> {
    let definition = PipelineDefinition::from_path(pipeline_file_path).map_err(|e| {
        error!("Cannot deploy {}: {}", pipeline_file_path.display(), e);
        DeployError::from(e)
    })?;

    deploy_definition(session, &definition, version_name).await
}

/// Deploy an already parsed package
pub async fn deploy_definition<S: PipelineApi + ?Sized>(
    session: &S,
    definition: &PipelineDefinition,
    version_name: &str,
) -> Result<Deployment, DeployError> {
    let name = definition.name();
    let description = definition.description();

    match definition.steps() {
        Ok(steps) if !steps.is_empty() => {
            let order: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
            info!("Pipeline '{}' steps: {}", name, order.join(" -> "));
        }
        Ok(_) => {}
        Err(e) => warn!("Could not read steps of pipeline '{}': {}", name, e),
    }

    let existing = session.find_pipeline_id(name).await.map_err(|e| {
        error!("Failed to look up pipeline '{}': {}", name, e);
        DeployError::Lookup {
            name: name.to_string(),
            source: e,
        }
    })?;

    let (pipeline_id, pipeline_created) = match existing {
        Some(id) => {
            info!("Pipeline '{}' already exists ({})", name, id);
            (id, false)
        }
        None => {
            let pipeline = session
                .upload_pipeline(definition.package(), name, description)
                .await
                .map_err(|e| {
                    error!("Failed to create pipeline '{}': {}", name, e);
                    DeployError::CreatePipeline {
                        name: name.to_string(),
                        source: e,
                    }
                })?;
            info!("Created pipeline '{}' ({})", pipeline.name, pipeline.id);
            (pipeline.id, true)
        }
    };

    let version = session
        .upload_pipeline_version(definition.package(), &pipeline_id, version_name, description)
        .await
        .map_err(|e| {
            error!(
                "Failed to upload version '{}' of pipeline '{}': {}",
                version_name, name, e
            );
            DeployError::UploadVersion {
                name: name.to_string(),
                version: version_name.to_string(),
                source: e,
            }
        })?;

    info!(
        "Uploaded version '{}' ({}) of pipeline '{}'",
        version.name, version.id, name
    );

    Ok(Deployment {
        pipeline_name: name.to_string(),
        pipeline_id,
        pipeline_created,
        version,
    })
}
