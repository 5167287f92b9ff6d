//! Pipeline and pipeline-version endpoints

use kfdeploy_core::definition::PipelinePackage;
use kfdeploy_core::domain::pipeline::{Pipeline, PipelineVersion};
use kfdeploy_core::dto::filter::Filter;
use kfdeploy_core::dto::list::ListPipelinesResponse;
use reqwest::multipart::{Form, Part};

use crate::KubeflowClient;
use crate::error::{ClientError, Result};

impl KubeflowClient {
    // =============================================================================
    // Pipeline Lookup
    // =============================================================================

    /// List pipelines whose name equals `name`
    pub async fn list_pipelines_by_name(&self, name: &str) -> Result<ListPipelinesResponse> {
        let url = self.endpoint("pipelines");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("filter", Filter::name_equals(name).to_query_value()),
                ("page_size", "10".to_string()),
            ])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Resolve a pipeline name to its id
    ///
    /// # Returns
    /// `None` when no pipeline has this name
    ///
    /// # Errors
    /// `ClientError::Ambiguous` if the service reports several pipelines with
    /// the same name
    pub async fn find_pipeline_id(&self, name: &str) -> Result<Option<String>> {
        let listing = self.list_pipelines_by_name(name).await?;

        match listing.pipelines.as_slice() {
            [] => Ok(None),
            [pipeline] => Ok(Some(pipeline.id.clone())),
            matches => {
                let ids: Vec<&str> = matches.iter().map(|p| p.id.as_str()).collect();
                Err(ClientError::Ambiguous(format!(
                    "{} pipelines named '{}': {}",
                    matches.len(),
                    name,
                    ids.join(", ")
                )))
            }
        }
    }

    // =============================================================================
    // Uploads
    // =============================================================================

    /// Register a package as a new pipeline resource
    ///
    /// # Arguments
    /// * `package` - Compiled pipeline package
    /// * `name` - Name of the new pipeline resource
    /// * `description` - Optional description
    pub async fn upload_pipeline(
        &self,
        package: &PipelinePackage,
        name: &str,
        description: Option<&str>,
    ) -> Result<Pipeline> {
        let url = self.endpoint("pipelines/upload");

        let mut query = vec![("name", name)];
        if let Some(desc) = description {
            query.push(("description", desc));
        }

        let response = self
            .client
            .post(&url)
            .query(&query)
            .multipart(upload_form(package)?)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Upload a package as a new version of an existing pipeline resource
    ///
    /// # Arguments
    /// * `package` - Compiled pipeline package
    /// * `pipeline_id` - Id of the owning pipeline resource
    /// * `version_name` - Name of the new version
    /// * `description` - Optional description
    pub async fn upload_pipeline_version(
        &self,
        package: &PipelinePackage,
        pipeline_id: &str,
        version_name: &str,
        description: Option<&str>,
    ) -> Result<PipelineVersion> {
        let url = self.endpoint("pipelines/upload_version");

        let mut query = vec![("name", version_name), ("pipelineid", pipeline_id)];
        if let Some(desc) = description {
            query.push(("description", desc));
        }

        let response = self
            .client
            .post(&url)
            .query(&query)
            .multipart(upload_form(package)?)
            .send()
            .await?;

        self.handle_response(response).await
    }
}

/// Multipart body carrying the package under the field the service expects
fn upload_form(package: &PipelinePackage) -> Result<Form> {
    let part = Part::bytes(package.bytes.clone())
        .file_name(package.file_name.clone())
        .mime_str("application/x-yaml")
        .map_err(|e| ClientError::InvalidRequest(format!("Invalid upload part: {}", e)))?;

    Ok(Form::new().part("uploadfile", part))
}
