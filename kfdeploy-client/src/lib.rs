//! kfdeploy HTTP Client
//!
//! A small, type-safe client for the Kubeflow Pipelines REST API (`v1beta1`)
//! plus the authenticated [`Session`] every deploy, run and wait goes through.
//!
//! # Example
//!
//! ```no_run
//! use kfdeploy_client::{ConnectParams, PipelineApi, Session};
//!
//! #[tokio::main]
//! async fn main() -> kfdeploy_client::Result<()> {
//!     let session = Session::connect(ConnectParams::new(
//!         "http://localhost:8080",
//!         "kubeflow-user-example-com",
//!     ))
//!     .await?;
//!
//!     let pipeline_id = session.find_pipeline_id("flower-pipeline").await?;
//!     println!("Existing pipeline: {:?}", pipeline_id);
//!     Ok(())
//! }
//! ```

mod api;
pub mod error;
mod experiments;
mod pipelines;
mod runs;
mod session;

pub use api::PipelineApi;
pub use error::{ClientError, Result};
pub use session::{ConnectParams, Credentials, Session};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Path prefix of every REST endpoint
const API_PREFIX: &str = "apis/v1beta1";

/// HTTP client for the pipeline service REST API
///
/// Endpoints are grouped by resource:
/// - Pipelines and pipeline versions (lookup, upload)
/// - Experiments (lookup by name within a namespace)
/// - Runs (create, get)
#[derive(Debug, Clone)]
pub struct KubeflowClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl KubeflowClient {
    /// Create a new client with a default HTTP client
    ///
    /// # Example
    /// ```
    /// use kfdeploy_client::KubeflowClient;
    ///
    /// let client = KubeflowClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// Sessions use this to share one cookie store between login and API calls.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an API endpoint
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    /// Check that the API server answers
    pub async fn healthz(&self) -> Result<()> {
        let url = self.endpoint("healthz");
        let response = self.client.get(&url).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is ignored
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
