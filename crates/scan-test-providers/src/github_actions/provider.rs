use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, info};

use scan_test_core::{
    PipelineProvider, PollOutcome, Result, TestDefinition, TestResult, TestStatus,
};

use super::config::GitHubActionsConfig;
use super::models::{WorkflowRun, WorkflowRunsResponse};
use crate::http::{self, ApiClient, CallKind};

pub const PROVIDER_KEY: &str = "github-actions";

/// Page size used when listing workflow runs.
pub const RUNS_PER_PAGE: usize = 100;

const API_VERSION: &str = "2022-11-28";

/// What a GitHub dispatch leaves behind for polling.
///
/// The dispatch endpoint returns no run id; the run is found again by its
/// correlation token among runs created at or after `dispatch_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubDispatchState {
    pub dispatch_id: String,
    pub dispatch_time: DateTime<Utc>,
}

/// Map a completed run's `conclusion` to a canonical status.
pub fn conclusion_to_status(conclusion: Option<&str>) -> TestStatus {
    match conclusion {
        Some("success") | Some("neutral") => TestStatus::Success,
        Some("failure") => TestStatus::Failure,
        Some("timed_out") => TestStatus::Timeout,
        _ => TestStatus::Error,
    }
}

/// Runs a scanner's matrix through a `workflow_dispatch` workflow.
#[derive(Debug)]
pub struct GitHubActionsProvider {
    config: GitHubActionsConfig,
    http: ApiClient,
}

impl GitHubActionsProvider {
    pub fn from_config(config: GitHubActionsConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            http::header_value(&format!("Bearer {}", config.token.expose()), "token")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let http = ApiClient::new(&config.api_base_url, headers)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GitHubActionsConfig {
        &self.config
    }

    /// Page through runs created since `dispatch_time` looking for the one
    /// whose title carries `dispatch_id`.
    pub async fn find_workflow_run(
        &self,
        dispatch_id: &str,
        dispatch_time: DateTime<Utc>,
    ) -> Result<Option<WorkflowRun>> {
        let path = format!(
            "repos/{}/{}/actions/runs",
            self.config.owner, self.config.repo
        );
        let created = format!(">={}", dispatch_time.format("%Y-%m-%dT%H:%M:%SZ"));
        let per_page = RUNS_PER_PAGE.to_string();
        let mut page: u32 = 1;

        loop {
            let page_param = page.to_string();
            let request = self.http.get(&path).query(&[
                ("per_page", per_page.as_str()),
                ("created", created.as_str()),
                ("page", page_param.as_str()),
            ]);

            let response = http::send(request, "list workflow runs").await?;
            let response = http::expect_status(
                response,
                &[StatusCode::OK],
                CallKind::Poll,
                "list workflow runs",
            )
            .await?;
            let runs: WorkflowRunsResponse = http::json_body(response, "workflow runs").await?;

            let page_len = runs.workflow_runs.len();
            if let Some(run) = runs
                .workflow_runs
                .into_iter()
                .find(|run| run.display_title.contains(dispatch_id))
            {
                return Ok(Some(run));
            }

            if page_len < RUNS_PER_PAGE {
                return Ok(None);
            }

            debug!(page, dispatch_id, "correlation token not on this page");
            page += 1;
        }
    }
}

#[async_trait]
impl PipelineProvider for GitHubActionsProvider {
    type DispatchState = GitHubDispatchState;

    fn key(&self) -> &'static str {
        PROVIDER_KEY
    }

    async fn dispatch_scanner_tests(
        &self,
        scanner_id: &str,
        test_definition: &TestDefinition,
        registry_ref: &str,
        registry_repo: &str,
    ) -> Result<GitHubDispatchState> {
        let dispatch_id = self.config.dispatch_id_mode.generate();
        let dispatch_time = Utc::now();

        let path = format!(
            "repos/{}/{}/actions/workflows/{}/dispatches",
            self.config.owner, self.config.repo, self.config.workflow_id
        );
        let payload = json!({
            "ref": self.config.git_ref,
            "inputs": {
                "dispatch_id": dispatch_id,
                "scanner_id": scanner_id,
                "registry_ref": registry_ref,
                "registry_repo": registry_repo,
                "matrix": test_definition.matrix_tests_json()?,
            },
        });

        info!(
            scanner_id,
            registry_ref,
            registry_repo,
            owner = %self.config.owner,
            repo = %self.config.repo,
            workflow_id = %self.config.workflow_id,
            dispatch_id = %dispatch_id,
            "dispatching workflow"
        );

        let response = http::send(self.http.post(&path).json(&payload), "dispatch workflow").await?;
        http::expect_status(
            response,
            &[StatusCode::NO_CONTENT, StatusCode::ACCEPTED],
            CallKind::Dispatch,
            "dispatch workflow",
        )
        .await?;

        Ok(GitHubDispatchState {
            dispatch_id,
            dispatch_time,
        })
    }

    async fn poll_status(&self, dispatch_state: &GitHubDispatchState) -> Result<PollOutcome> {
        let Some(run) = self
            .find_workflow_run(&dispatch_state.dispatch_id, dispatch_state.dispatch_time)
            .await?
        else {
            info!(dispatch_id = %dispatch_state.dispatch_id, "workflow run not found yet");
            return Ok(PollOutcome::Pending);
        };

        if !run.is_completed() {
            info!(run_id = run.id, status = %run.status, "workflow run still running");
            return Ok(PollOutcome::Pending);
        }

        let status = conclusion_to_status(run.conclusion.as_deref());
        let duration = http::elapsed_secs(run.created_at, Some(run.updated_at));

        Ok(PollOutcome::Complete(vec![TestResult::completed(
            status,
            duration,
            run.html_url,
        )]))
    }
}
