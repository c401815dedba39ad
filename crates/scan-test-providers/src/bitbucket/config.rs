use serde::Deserialize;

use crate::secret::Secret;

pub const DEFAULT_API_BASE_URL: &str = "https://api.bitbucket.org/2.0/";

/// Custom pipeline selected in `bitbucket-pipelines.yml`.
pub const DEFAULT_PIPELINE_PATTERN: &str = "test-scanner";

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_pipeline_pattern() -> String {
    DEFAULT_PIPELINE_PATTERN.to_string()
}

/// Configuration for the Bitbucket Pipelines provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BitbucketConfig {
    /// OAuth or repository access token, sent as a bearer credential.
    pub token: Secret,
    pub workspace: String,
    pub repo_slug: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_pipeline_pattern")]
    pub pipeline_pattern: String,
}

impl BitbucketConfig {
    pub fn new(token: &str, workspace: &str, repo_slug: &str) -> Self {
        Self {
            token: Secret::new(token),
            workspace: workspace.to_string(),
            repo_slug: repo_slug.to_string(),
            branch: default_branch(),
            api_base_url: default_api_base_url(),
            pipeline_pattern: default_pipeline_pattern(),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
