use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, LOCATION};
use reqwest::StatusCode;
use serde_json::json;
use tracing::info;

use scan_test_core::{
    PipelineProvider, PollOutcome, Result, TestDefinition, TestResult, TestStatus,
};

use super::config::BitbucketConfig;
use super::models::{Pipeline, PipelineCreated};
use crate::http::{self, ApiClient, CallKind};

pub const PROVIDER_KEY: &str = "bitbucket";

/// What a Bitbucket dispatch leaves behind for polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitbucketDispatchState {
    pub pipeline_uuid: String,
    /// From the `Location` header of the create call; the API body carries no
    /// browsable link.
    pub run_url: String,
}

/// Map a terminal pipeline's result name to a canonical status.
pub fn result_to_status(result: Option<&str>) -> TestStatus {
    match result {
        Some("SUCCESSFUL") => TestStatus::Success,
        Some("FAILED") => TestStatus::Failure,
        _ => TestStatus::Error,
    }
}

/// Runs a scanner's matrix through a custom Bitbucket pipeline.
#[derive(Debug)]
pub struct BitbucketProvider {
    config: BitbucketConfig,
    http: ApiClient,
}

impl BitbucketProvider {
    pub fn from_config(config: BitbucketConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            http::header_value(&format!("Bearer {}", config.token.expose()), "token")?,
        );

        let http = ApiClient::new(&config.api_base_url, headers)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BitbucketConfig {
        &self.config
    }

    fn pipelines_path(&self) -> String {
        format!(
            "repositories/{}/{}/pipelines/",
            self.config.workspace, self.config.repo_slug
        )
    }

    pub async fn get_pipeline(&self, pipeline_uuid: &str) -> Result<Pipeline> {
        let path = format!("{}{}", self.pipelines_path(), pipeline_uuid);
        let response = http::send(self.http.get(&path), "get pipeline").await?;
        let response =
            http::expect_status(response, &[StatusCode::OK], CallKind::Poll, "get pipeline")
                .await?;
        http::json_body(response, "pipeline").await
    }
}

#[async_trait]
impl PipelineProvider for BitbucketProvider {
    type DispatchState = BitbucketDispatchState;

    fn key(&self) -> &'static str {
        PROVIDER_KEY
    }

    async fn dispatch_scanner_tests(
        &self,
        scanner_id: &str,
        test_definition: &TestDefinition,
        registry_ref: &str,
        registry_repo: &str,
    ) -> Result<BitbucketDispatchState> {
        let payload = json!({
            "target": {
                "type": "pipeline_ref_target",
                "selector": {
                    "type": "custom",
                    "pattern": self.config.pipeline_pattern,
                },
                "ref_name": self.config.branch,
                "ref_type": "branch",
            },
            "variables": [
                {"key": "SCANNER_ID", "value": scanner_id},
                {"key": "REGISTRY_REF", "value": registry_ref},
                {"key": "REGISTRY_REPO", "value": registry_repo},
                {"key": "MATRIX_TESTS", "value": test_definition.matrix_entries_json()?},
            ],
        });

        let response = http::send(
            self.http.post(&self.pipelines_path()).json(&payload),
            "trigger pipeline",
        )
        .await?;
        let response = http::expect_status(
            response,
            &[StatusCode::CREATED],
            CallKind::Dispatch,
            "trigger pipeline",
        )
        .await?;

        let run_url = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let created: PipelineCreated = http::json_body(response, "trigger response").await?;

        info!(scanner_id, pipeline_uuid = %created.uuid, "created pipeline");
        Ok(BitbucketDispatchState {
            pipeline_uuid: created.uuid,
            run_url,
        })
    }

    async fn poll_status(&self, dispatch_state: &BitbucketDispatchState) -> Result<PollOutcome> {
        let pipeline = self.get_pipeline(&dispatch_state.pipeline_uuid).await?;

        if !pipeline.is_completed() {
            info!(
                pipeline_uuid = %dispatch_state.pipeline_uuid,
                state = %pipeline.state.name,
                "pipeline still running"
            );
            return Ok(PollOutcome::Pending);
        }

        let status = result_to_status(pipeline.result_name());
        let duration = http::elapsed_secs(pipeline.created_on, pipeline.completed_on);

        Ok(PollOutcome::Complete(vec![TestResult::completed(
            status,
            duration,
            dispatch_state.run_url.clone(),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_mapping() {
        assert_eq!(result_to_status(Some("SUCCESSFUL")), TestStatus::Success);
        assert_eq!(result_to_status(Some("FAILED")), TestStatus::Failure);
        assert_eq!(result_to_status(Some("ERROR")), TestStatus::Error);
        assert_eq!(result_to_status(Some("STOPPED")), TestStatus::Error);
        assert_eq!(result_to_status(Some("EXPIRED")), TestStatus::Error);
        assert_eq!(result_to_status(None), TestStatus::Error);
    }
}
