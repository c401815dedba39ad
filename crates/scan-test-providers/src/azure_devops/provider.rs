use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::json;
use tracing::info;

use scan_test_core::{
    PipelineProvider, PollOutcome, Result, TestDefinition, TestResult, TestStatus,
};

use super::config::AzureDevOpsConfig;
use super::models::{PipelineRun, RunCreated};
use crate::http::{self, ApiClient, CallKind};

pub const PROVIDER_KEY: &str = "azure-devops";

const API_VERSION: &str = "7.1";

/// Map a terminal run's `result` to a canonical status.
pub fn run_result_to_status(result: Option<&str>) -> TestStatus {
    match result {
        Some("succeeded") => TestStatus::Success,
        Some("failed") => TestStatus::Failure,
        _ => TestStatus::Error,
    }
}

/// `Basic` credential with an empty user name and the PAT as password.
pub fn basic_auth_value(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!(":{token}")))
}

/// Runs a scanner's matrix through an Azure Pipelines run.
#[derive(Debug)]
pub struct AzureDevOpsProvider {
    config: AzureDevOpsConfig,
    http: ApiClient,
}

impl AzureDevOpsProvider {
    pub fn from_config(config: AzureDevOpsConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            http::header_value(&basic_auth_value(config.token.expose()), "token")?,
        );

        let http = ApiClient::new(&config.api_base_url, headers)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AzureDevOpsConfig {
        &self.config
    }

    fn runs_path(&self) -> String {
        format!(
            "{}/{}/_apis/pipelines/{}/runs",
            self.config.organization, self.config.project, self.config.pipeline_id
        )
    }

    pub async fn get_run(&self, run_id: u64) -> Result<PipelineRun> {
        let path = format!("{}/{}", self.runs_path(), run_id);
        let request = self.http.get(&path).query(&[("api-version", API_VERSION)]);
        let response = http::send(request, "get pipeline run").await?;
        let response = http::expect_status(
            response,
            &[StatusCode::OK],
            CallKind::Poll,
            "get pipeline run",
        )
        .await?;
        http::json_body(response, "pipeline run").await
    }
}

#[async_trait]
impl PipelineProvider for AzureDevOpsProvider {
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
        let payload = json!({
            "templateParameters": {
                "SCANNER_ID": scanner_id,
                "REGISTRY_REF": registry_ref,
                "REGISTRY_REPO": registry_repo,
                "MATRIX_TESTS": test_definition.matrix_tests_json()?,
            },
        });

        let request = self
            .http
            .post(&self.runs_path())
            .query(&[("api-version", API_VERSION)])
            .json(&payload);
        let response = http::send(request, "run pipeline").await?;
        let response = http::expect_status(
            response,
            &[StatusCode::OK],
            CallKind::Dispatch,
            "run pipeline",
        )
        .await?;
        let run: RunCreated = http::json_body(response, "run response").await?;

        info!(
            scanner_id,
            run_id = run.id,
            pipeline_id = self.config.pipeline_id,
            "created pipeline run"
        );
        Ok(run.id)
    }

    async fn poll_status(&self, run_id: &u64) -> Result<PollOutcome> {
        let run = self.get_run(*run_id).await?;

        if !run.is_completed() {
            info!(run_id, state = %run.state, "pipeline run still running");
            return Ok(PollOutcome::Pending);
        }

        let status = run_result_to_status(run.result.as_deref());
        let duration = http::elapsed_secs(run.created_date, run.finished_date);

        Ok(PollOutcome::Complete(vec![TestResult::completed(
            status,
            duration,
            run.web_url(),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_mapping() {
        assert_eq!(run_result_to_status(Some("succeeded")), TestStatus::Success);
        assert_eq!(run_result_to_status(Some("failed")), TestStatus::Failure);
        assert_eq!(run_result_to_status(Some("canceled")), TestStatus::Error);
        assert_eq!(run_result_to_status(Some("unknown")), TestStatus::Error);
        assert_eq!(run_result_to_status(None), TestStatus::Error);
    }

    #[test]
    fn test_basic_auth_has_empty_user() {
        // ":pat" in base64
        assert_eq!(basic_auth_value("pat"), "Basic OnBhdA==");
    }
}
