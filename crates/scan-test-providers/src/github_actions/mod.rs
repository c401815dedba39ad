//! GitHub Actions backend (`workflow_dispatch` plus run-title correlation).

pub mod config;
pub mod models;
pub mod provider;

pub use config::{DispatchIdMode, GitHubActionsConfig, STATIC_DISPATCH_ID};
pub use provider::{conclusion_to_status, GitHubActionsProvider, GitHubDispatchState};
