use serde::Deserialize;

use crate::secret::Secret;

pub const DEFAULT_API_BASE_URL: &str = "https://dev.azure.com";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Configuration for the Azure DevOps provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AzureDevOpsConfig {
    /// Personal access token.
    pub token: Secret,
    pub organization: String,
    pub project: String,
    pub pipeline_id: u64,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl AzureDevOpsConfig {
    pub fn new(token: &str, organization: &str, project: &str, pipeline_id: u64) -> Self {
        Self {
            token: Secret::new(token),
            organization: organization.to_string(),
            project: project.to_string(),
            pipeline_id,
            api_base_url: default_api_base_url(),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
