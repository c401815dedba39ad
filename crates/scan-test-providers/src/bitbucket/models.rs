//! Bitbucket Pipelines REST API payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Terminal pipeline state names. Bitbucket documents its states poorly;
/// anything else (`PENDING`, `IN_PROGRESS`, `PAUSED`, `PARSING`) is in flight.
pub const COMPLETED_STATES: &[&str] = &["COMPLETED", "STOPPED", "ERROR", "FAILED"];

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineResult {
    /// `SUCCESSFUL`, `FAILED`, `ERROR`, `STOPPED`
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineState {
    pub name: String,
    #[serde(default)]
    pub result: Option<PipelineResult>,
}

/// A pipeline from `GET repositories/{workspace}/{slug}/pipelines/{uuid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub uuid: String,
    #[serde(default)]
    pub build_number: u64,
    pub state: PipelineState,
    pub created_on: DateTime<Utc>,
    #[serde(default)]
    pub completed_on: Option<DateTime<Utc>>,
}

impl Pipeline {
    pub fn is_completed(&self) -> bool {
        COMPLETED_STATES.contains(&self.state.name.as_str())
    }

    pub fn result_name(&self) -> Option<&str> {
        self.state.result.as_ref().map(|result| result.name.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineCreated {
    /// Braces included, e.g. `{a1b2c3d4-...}`.
    pub uuid: String,
}
