//! Experiment endpoints

use kfdeploy_core::domain::experiment::Experiment;
use kfdeploy_core::dto::filter::Filter;
use kfdeploy_core::dto::list::ListExperimentsResponse;

use crate::KubeflowClient;
use crate::error::{ClientError, Result};

impl KubeflowClient {
    /// List experiments whose name equals `name`
    ///
    /// # Arguments
    /// * `name` - Experiment name
    /// * `namespace` - Restrict the listing to this namespace (multi-user clusters)
    pub async fn list_experiments_by_name(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<ListExperimentsResponse> {
        let url = self.endpoint("experiments");

        let mut query = vec![
            ("filter", Filter::name_equals(name).to_query_value()),
            ("page_size", "10".to_string()),
        ];
        if let Some(ns) = namespace {
            query.push(("resource_reference_key.type", "NAMESPACE".to_string()));
            query.push(("resource_reference_key.id", ns.to_string()));
        }

        let response = self.client.get(&url).query(&query).send().await?;

        self.handle_response(response).await
    }

    /// Resolve an experiment by name
    ///
    /// # Returns
    /// `None` when no experiment has this name in the namespace
    pub async fn find_experiment(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<Experiment>> {
        let listing = self.list_experiments_by_name(name, namespace).await?;

        let mut matches = listing.experiments.into_iter();
        match (matches.next(), matches.next()) {
            (None, _) => Ok(None),
            (Some(experiment), None) => Ok(Some(experiment)),
            (Some(_), Some(_)) => Err(ClientError::Ambiguous(format!(
                "several experiments named '{}'",
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_find_experiment_scoped_to_namespace() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/apis/v1beta1/experiments")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "filter".into(),
                    r#"{"predicates":[{"key":"name","op":1,"string_value":"demo"}]}"#.into(),
                ),
                Matcher::UrlEncoded("resource_reference_key.type".into(), "NAMESPACE".into()),
                Matcher::UrlEncoded("resource_reference_key.id".into(), "team-a".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"experiments": [{"id": "exp-1", "name": "demo"}], "total_size": 1}"#)
            .create_async()
            .await;

        let client = KubeflowClient::new(server.url());
        let experiment = client
            .find_experiment("demo", Some("team-a"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(experiment.id, "exp-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_find_experiment_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/apis/v1beta1/experiments")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let client = KubeflowClient::new(server.url());
        assert!(client.find_experiment("demo", None).await.unwrap().is_none());
    }
}
