//! Bitbucket Pipelines backend (custom pipeline on a branch).

pub mod config;
pub mod models;
pub mod provider;

pub use config::BitbucketConfig;
pub use provider::{result_to_status, BitbucketDispatchState, BitbucketProvider};
