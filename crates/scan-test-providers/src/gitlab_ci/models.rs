//! GitLab CI REST API payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Terminal pipeline statuses.
pub const COMPLETED_STATUSES: &[&str] = &["success", "failed", "canceled", "skipped", "manual"];

/// A pipeline from `GET projects/{id}/pipelines/{pipeline_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    /// `created`, `waiting_for_resource`, `preparing`, `pending`, `running`,
    /// `scheduled` while in flight.
    pub status: String,
    #[serde(default)]
    pub web_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    pub fn is_completed(&self) -> bool {
        COMPLETED_STATUSES.contains(&self.status.as_str())
    }

    /// When the pipeline reached its terminal state, if known.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at.or(self.updated_at)
    }
}

/// Body of a successful trigger call; only the id matters.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggeredPipeline {
    pub id: u64,
}
