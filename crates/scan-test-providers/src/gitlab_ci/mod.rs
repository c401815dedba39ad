//! GitLab CI backend (pipeline trigger API).

pub mod config;
pub mod models;
pub mod provider;

pub use config::GitLabCiConfig;
pub use provider::{pipeline_status_to_status, GitLabCiProvider};
