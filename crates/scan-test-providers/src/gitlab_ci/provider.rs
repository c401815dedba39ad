use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::json;
use tracing::info;

use scan_test_core::{
    PipelineProvider, PollOutcome, Result, TestDefinition, TestResult, TestStatus,
};

use super::config::GitLabCiConfig;
use super::models::{Pipeline, TriggeredPipeline};
use crate::http::{self, ApiClient, CallKind};

pub const PROVIDER_KEY: &str = "gitlab-ci";

/// Map a terminal pipeline status to a canonical status.
pub fn pipeline_status_to_status(status: &str) -> TestStatus {
    match status {
        "success" => TestStatus::Success,
        "failed" => TestStatus::Failure,
        _ => TestStatus::Error,
    }
}

/// Percent-encode `value` as a single URL path segment (`/` becomes `%2F`).
///
/// Form encoding writes a space as `+`, which a path reads as a literal plus;
/// a literal `+` is already `%2B` at that point.
fn encode_path_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Runs a scanner's matrix through a GitLab pipeline trigger.
///
/// The trigger token travels in the request body; the API token is attached
/// to status reads only, so neither credential is a client default header.
#[derive(Debug)]
pub struct GitLabCiProvider {
    config: GitLabCiConfig,
    http: ApiClient,
    encoded_project_id: String,
}

impl GitLabCiProvider {
    pub fn from_config(config: GitLabCiConfig) -> Result<Self> {
        // Validate eagerly so a bad token fails construction, not the first poll.
        http::header_value(&format!("Bearer {}", config.api_token.expose()), "api_token")?;

        let http = ApiClient::new(&config.api_base_url, HeaderMap::new())?;
        let encoded_project_id = encode_path_segment(&config.project_id);

        Ok(Self {
            config,
            http,
            encoded_project_id,
        })
    }

    pub fn config(&self) -> &GitLabCiConfig {
        &self.config
    }

    pub async fn get_pipeline(&self, pipeline_id: u64) -> Result<Pipeline> {
        let path = format!(
            "projects/{}/pipelines/{}",
            self.encoded_project_id, pipeline_id
        );
        let bearer = http::header_value(
            &format!("Bearer {}", self.config.api_token.expose()),
            "api_token",
        )?;

        let request = self.http.get(&path).header(AUTHORIZATION, bearer);
        let response = http::send(request, "get pipeline").await?;
        let response =
            http::expect_status(response, &[StatusCode::OK], CallKind::Poll, "get pipeline")
                .await?;
        http::json_body(response, "pipeline").await
    }
}

#[async_trait]
impl PipelineProvider for GitLabCiProvider {
    type DispatchState = u64;

    fn key(&self) -> &'static str {
        PROVIDER_KEY
    }

    async fn dispatch_scanner_tests(
        &self,
        scanner_id: &str,
        test_definition: &TestDefinition,
        registry_ref: &str,
        registry_repo: &str,
    ) -> Result<u64> {
        let path = format!("projects/{}/trigger/pipeline", self.encoded_project_id);
        let payload = json!({
            "token": self.config.trigger_token.expose(),
            "ref": self.config.git_ref,
            "variables": {
                "SCANNER_ID": scanner_id,
                "REGISTRY_REF": registry_ref,
                "REGISTRY_REPO": registry_repo,
                "MATRIX_TESTS": test_definition.matrix_tests_json()?,
            },
        });

        let response =
            http::send(self.http.post(&path).json(&payload), "trigger pipeline").await?;
        let response = http::expect_status(
            response,
            &[StatusCode::CREATED],
            CallKind::Dispatch,
            "trigger pipeline",
        )
        .await?;
        let pipeline: TriggeredPipeline = http::json_body(response, "trigger response").await?;

        info!(
            scanner_id,
            pipeline_id = pipeline.id,
            project_id = %self.config.project_id,
            "created pipeline"
        );
        Ok(pipeline.id)
    }

    async fn poll_status(&self, pipeline_id: &u64) -> Result<PollOutcome> {
        let pipeline = self.get_pipeline(*pipeline_id).await?;

        if !pipeline.is_completed() {
            info!(pipeline_id, status = %pipeline.status, "pipeline still running");
            return Ok(PollOutcome::Pending);
        }

        let status = pipeline_status_to_status(&pipeline.status);
        let duration = http::elapsed_secs(pipeline.created_at, pipeline.ended_at());

        Ok(PollOutcome::Complete(vec![TestResult::completed(
            status,
            duration,
            pipeline.web_url,
        )]))
    }
}
