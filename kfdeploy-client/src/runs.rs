//! Run endpoints

use kfdeploy_core::domain::run::RunDetail;
use kfdeploy_core::dto::run::CreateRun;

use crate::KubeflowClient;
use crate::error::Result;

impl KubeflowClient {
    /// Start a new run
    ///
    /// # Arguments
    /// * `req` - Run name, parameters and the experiment/version references
    ///
    /// # Returns
    /// The created run as recorded by the service
    pub async fn create_run(&self, req: &CreateRun) -> Result<RunDetail> {
        let url = self.endpoint("runs");
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get a run by id, including its current status
    pub async fn get_run(&self, run_id: &str) -> Result<RunDetail> {
        let url = self.endpoint(&format!("runs/{}", run_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfdeploy_core::domain::run::RunStatus;
    use kfdeploy_core::params::Parameters;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_create_run_posts_references() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/apis/v1beta1/runs")
            .match_body(Matcher::PartialJsonString(
                r#"{
                    "name": "Run at 2024-04-01 12:00:00+09:00",
                    "pipeline_spec": {"parameters": [{"name": "epochs", "value": "5"}]}
                }"#
                .to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"run": {"id": "run-1", "name": "Run at 2024-04-01 12:00:00+09:00"}}"#)
            .create_async()
            .await;

        let params = Parameters::from_yaml("epochs: 5\n").unwrap();
        let req = CreateRun::new("Run at 2024-04-01 12:00:00+09:00", "exp-1", "ver-1", &params);

        let client = KubeflowClient::new(server.url());
        let detail = client.create_run(&req).await.unwrap();

        assert_eq!(detail.run.id, "run-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_run_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/apis/v1beta1/runs/run-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"run": {"id": "run-1", "name": "r", "status": "Succeeded"}}"#)
            .create_async()
            .await;

        let client = KubeflowClient::new(server.url());
        let detail = client.get_run("run-1").await.unwrap();
        assert_eq!(detail.run.run_status(), RunStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_get_run_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/apis/v1beta1/runs/missing")
            .with_status(404)
            .with_body(r#"{"error": "run not found"}"#)
            .create_async()
            .await;

        let client = KubeflowClient::new(server.url());
        let err = client.get_run("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
