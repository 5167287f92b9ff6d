//! List endpoint responses
//!
//! Paging fields are kept so callers can tell a truncated listing apart from
//! a complete one.

use serde::{Deserialize, Serialize};

use crate::domain::experiment::Experiment;
use crate::domain::pipeline::Pipeline;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPipelinesResponse {
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
    #[serde(default)]
    pub total_size: i32,
    #[serde(default)]
    pub next_page_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListExperimentsResponse {
    #[serde(default)]
    pub experiments: Vec<Experiment>,
    #[serde(default)]
    pub total_size: i32,
    #[serde(default)]
    pub next_page_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_listing_omits_collection() {
        let resp: ListPipelinesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.pipelines.is_empty());
        assert_eq!(resp.total_size, 0);

        let resp: ListExperimentsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.experiments.is_empty());
    }
}
