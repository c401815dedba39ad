use serde::Deserialize;

use crate::secret::Secret;

pub const DEFAULT_API_BASE_URL: &str = "https://gitlab.com/api/v4/";

fn default_ref() -> String {
    "main".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Configuration for the GitLab CI provider.
///
/// Two credentials with separate scopes: `trigger_token` (pipeline trigger
/// token) only starts pipelines, `api_token` (read_api) only reads them.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitLabCiConfig {
    pub trigger_token: Secret,
    pub api_token: Secret,
    /// Numeric id or `group/project` path.
    pub project_id: String,
    #[serde(rename = "ref", default = "default_ref")]
    pub git_ref: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl GitLabCiConfig {
    pub fn new(trigger_token: &str, api_token: &str, project_id: &str) -> Self {
        Self {
            trigger_token: Secret::new(trigger_token),
            api_token: Secret::new(api_token),
            project_id: project_id.to_string(),
            git_ref: default_ref(),
            api_base_url: default_api_base_url(),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_project_id_accepted_as_string() {
        let config: GitLabCiConfig = serde_json::from_value(serde_json::json!({
            "trigger_token": "glptt-x",
            "api_token": "glpat-y",
            "project_id": "12345",
        }))
        .unwrap();
        assert_eq!(config.project_id, "12345");
        assert_eq!(config.git_ref, "main");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_json::from_value::<GitLabCiConfig>(serde_json::json!({
            "trigger_token": "glptt-x",
            "api_token": "glpat-y",
            "project_id": "12345",
            "token": "legacy",
        }));
        assert!(result.is_err());
    }
}
