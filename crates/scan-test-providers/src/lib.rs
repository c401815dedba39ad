//! CI backends for scan-test.
//!
//! Each backend implements [`scan_test_core::PipelineProvider`] against one
//! REST API. Backends are looked up by key through [`registry`].

pub mod azure_devops;
pub mod bitbucket;
pub mod github_actions;
pub mod gitlab_ci;
mod http;
pub mod registry;
pub mod secret;

pub use azure_devops::{AzureDevOpsConfig, AzureDevOpsProvider};
pub use bitbucket::{BitbucketConfig, BitbucketDispatchState, BitbucketProvider};
pub use github_actions::{
    DispatchIdMode, GitHubActionsConfig, GitHubActionsProvider, GitHubDispatchState,
};
pub use gitlab_ci::{GitLabCiConfig, GitLabCiProvider};
pub use registry::{
    available_providers, load_provider_manifest, ConfigField, ConfiguredProvider,
    ProviderManifest, MANIFESTS,
};
pub use secret::Secret;
