//! GitHub Actions REST API payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A workflow run from `GET /repos/{owner}/{repo}/actions/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    /// `queued`, `in_progress`, `completed`, `waiting`, `requested`, `pending`
    pub status: String,
    /// `success`, `failure`, `cancelled`, `timed_out`, `action_required`,
    /// `neutral`, `skipped`, `stale`, or null while running.
    pub conclusion: Option<String>,
    #[serde(default)]
    pub display_title: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunsResponse {
    #[serde(default)]
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}
