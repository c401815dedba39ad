//! Azure DevOps Pipelines REST API payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Terminal run states; `inProgress` and `unknown` are still running.
pub const COMPLETED_STATES: &[&str] = &["completed", "canceling"];

#[derive(Debug, Clone, Deserialize)]
pub struct WebLink {
    pub href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunLinks {
    #[serde(default)]
    pub web: Option<WebLink>,
}

/// A run from `GET {org}/{project}/_apis/pipelines/{id}/runs/{run_id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub state: String,
    /// `succeeded`, `failed`, `canceled`, `unknown`, or absent while running.
    #[serde(default)]
    pub result: Option<String>,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub finished_date: Option<DateTime<Utc>>,
    #[serde(rename = "_links", default)]
    pub links: Option<RunLinks>,
}

impl PipelineRun {
    pub fn is_completed(&self) -> bool {
        COMPLETED_STATES.contains(&self.state.as_str())
    }

    /// Browsable run URL, or empty when the response has none.
    pub fn web_url(&self) -> String {
        self.links
            .as_ref()
            .and_then(|links| links.web.as_ref())
            .map(|web| web.href.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunCreated {
    pub id: u64,
}
