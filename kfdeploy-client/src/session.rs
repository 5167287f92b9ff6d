//! Authenticated sessions
//!
//! A [`Session`] is the handle every deploy, run and wait step receives. It
//! owns one HTTP client (and so one cookie jar), is scoped to a single
//! namespace, and lives for one command invocation.

use async_trait::async_trait;
use kfdeploy_core::definition::PipelinePackage;
use kfdeploy_core::domain::experiment::Experiment;
use kfdeploy_core::domain::pipeline::{Pipeline, PipelineVersion};
use kfdeploy_core::domain::run::RunDetail;
use kfdeploy_core::dto::run::CreateRun;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::KubeflowClient;
use crate::api::PipelineApi;
use crate::error::{ClientError, Result};

/// Default per-request timeout
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Username/password pair for the cluster's login form
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything needed to open a session
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Service endpoint (e.g., "http://ml-pipeline-ui.kubeflow")
    pub endpoint: String,
    /// Namespace experiments and runs are scoped to
    pub namespace: String,
    /// Name of the cluster context these settings came from
    pub context: String,
    /// Login credentials; `None` for clusters without an auth proxy
    pub credentials: Option<Credentials>,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
}

impl ConnectParams {
    pub fn new(endpoint: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: namespace.into(),
            context: "default".to_string(),
            credentials: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// An authenticated connection to the pipeline service
#[derive(Debug, Clone)]
pub struct Session {
    client: KubeflowClient,
    namespace: String,
    context: String,
}

impl Session {
    /// Open a session
    ///
    /// Logs in through the cluster's login form when credentials are given,
    /// then checks that the API answers. Nothing on the service is modified.
    ///
    /// # Errors
    /// - `ClientError::AuthenticationFailed` if the login is rejected
    /// - any transport or API error from the health probe
    pub async fn connect(params: ConnectParams) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(params.request_timeout)
            .build()?;

        let endpoint = params.endpoint.trim_end_matches('/').to_string();

        if let Some(credentials) = &params.credentials {
            login(&http, &endpoint, credentials).await?;
            debug!("Logged in as {}", credentials.username);
        }

        let client = KubeflowClient::with_client(endpoint, http);
        client.healthz().await?;

        info!(
            "Connected to {} (context: {}, namespace: {})",
            client.base_url(),
            params.context,
            params.namespace
        );

        Ok(Self {
            client,
            namespace: params.namespace,
            context: params.context,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

/// Submit the login form the endpoint redirects to
///
/// The identity proxy answers `GET /` with a redirect chain ending on its
/// login page. Posting the form there sets the session cookie and redirects
/// away; a rejected login re-renders the same page.
async fn login(http: &Client, endpoint: &str, credentials: &Credentials) -> Result<()> {
    let page = http.get(format!("{}/", endpoint)).send().await?;
    if !page.status().is_success() {
        return Err(ClientError::AuthenticationFailed(format!(
            "login page returned status {}",
            page.status()
        )));
    }
    let login_url = page.url().clone();
    debug!("Login form at {}", login_url);

    let response = http
        .post(login_url.clone())
        .form(&[
            ("login", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientError::AuthenticationFailed(format!(
            "login returned status {}",
            response.status()
        )));
    }

    if response.url() == &login_url {
        return Err(ClientError::AuthenticationFailed(format!(
            "credentials for '{}' were rejected",
            credentials.username
        )));
    }

    Ok(())
}

#[async_trait]
impl PipelineApi for Session {
    async fn find_pipeline_id(&self, name: &str) -> Result<Option<String>> {
        self.client.find_pipeline_id(name).await
    }

    async fn upload_pipeline(
        &self,
        package: &PipelinePackage,
        name: &str,
        description: Option<&str>,
    ) -> Result<Pipeline> {
        self.client.upload_pipeline(package, name, description).await
    }

    async fn upload_pipeline_version(
        &self,
        package: &PipelinePackage,
        pipeline_id: &str,
        version_name: &str,
        description: Option<&str>,
    ) -> Result<PipelineVersion> {
        self.client
            .upload_pipeline_version(package, pipeline_id, version_name, description)
            .await
    }

    async fn find_experiment(&self, name: &str) -> Result<Option<Experiment>> {
        self.client
            .find_experiment(name, Some(&self.namespace))
            .await
    }

    async fn create_run(&self, req: &CreateRun) -> Result<RunDetail> {
        self.client.create_run(req).await
    }

    async fn get_run(&self, run_id: &str) -> Result<RunDetail> {
        self.client.get_run(run_id).await
    }
}
