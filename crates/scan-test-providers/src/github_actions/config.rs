//! Configuration for the GitHub Actions provider.

use serde::Deserialize;
use uuid::Uuid;

use crate::secret::Secret;

/// Correlation token used when `dispatch_id_mode` is `static`.
pub const STATIC_DISPATCH_ID: &str = "static-dispatch-id";

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

fn default_ref() -> String {
    "main".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// How the dispatch correlation token is produced.
///
/// `workflow_dispatch` returns no run id, so the provider passes its own
/// token as a workflow input and later searches run titles for it.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchIdMode {
    /// A fresh UUID per dispatch.
    #[default]
    Random,
    /// Always [`STATIC_DISPATCH_ID`], for reproducible test setups.
    Static,
}

impl DispatchIdMode {
    pub fn generate(&self) -> String {
        match self {
            DispatchIdMode::Random => Uuid::new_v4().to_string(),
            DispatchIdMode::Static => STATIC_DISPATCH_ID.to_string(),
        }
    }
}

/// Configuration for the GitHub Actions provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubActionsConfig {
    pub token: Secret,
    pub owner: String,
    pub repo: String,
    /// Workflow file name or numeric id.
    pub workflow_id: String,
    /// Branch the workflow is dispatched on.
    #[serde(rename = "ref", default = "default_ref")]
    pub git_ref: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub dispatch_id_mode: DispatchIdMode,
}

impl GitHubActionsConfig {
    pub fn new(token: &str, owner: &str, repo: &str, workflow_id: &str) -> Self {
        Self {
            token: Secret::new(token),
            owner: owner.to_string(),
            repo: repo.to_string(),
            workflow_id: workflow_id.to_string(),
            git_ref: default_ref(),
            api_base_url: default_api_base_url(),
            dispatch_id_mode: DispatchIdMode::default(),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_dispatch_id_mode(mut self, mode: DispatchIdMode) -> Self {
        self.dispatch_id_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config: GitHubActionsConfig = serde_json::from_value(serde_json::json!({
            "token": "ghp_x",
            "owner": "org",
            "repo": "registry-tests",
            "workflow_id": "test.yml",
        }))
        .unwrap();

        assert_eq!(config.git_ref, "main");
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert_eq!(config.dispatch_id_mode, DispatchIdMode::Random);
    }

    #[test]
    fn test_static_mode_parsed() {
        let config: GitHubActionsConfig = serde_json::from_value(serde_json::json!({
            "token": "ghp_x",
            "owner": "org",
            "repo": "registry-tests",
            "workflow_id": "test.yml",
            "ref": "release",
            "dispatch_id_mode": "static",
        }))
        .unwrap();

        assert_eq!(config.git_ref, "release");
        assert_eq!(config.dispatch_id_mode, DispatchIdMode::Static);
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let result = serde_json::from_value::<GitHubActionsConfig>(serde_json::json!({
            "token": "ghp_x",
            "owner": "org",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_dispatch_id_modes() {
        assert_eq!(DispatchIdMode::Static.generate(), STATIC_DISPATCH_ID);
        assert_eq!(DispatchIdMode::Static.generate(), DispatchIdMode::Static.generate());
        assert_ne!(DispatchIdMode::Random.generate(), DispatchIdMode::Random.generate());
    }
}
