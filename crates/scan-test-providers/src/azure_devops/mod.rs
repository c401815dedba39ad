//! Azure DevOps backend (Pipelines runs API).

pub mod config;
pub mod models;
pub mod provider;

pub use config::AzureDevOpsConfig;
pub use provider::{run_result_to_status, AzureDevOpsProvider};
