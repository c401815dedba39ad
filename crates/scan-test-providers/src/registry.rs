//! Static provider registry.
//!
//! Every backend is compiled in; a manifest maps its key to a factory that
//! turns a JSON configuration object into a ready provider.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::info;

use scan_test_core::{
    PipelineProvider, PollSettings, Result, ScanTestError, ScannerResult, TestDefinition,
    TestOrchestrator,
};

use crate::azure_devops::{AzureDevOpsConfig, AzureDevOpsProvider};
use crate::bitbucket::{BitbucketConfig, BitbucketProvider};
use crate::github_actions::{GitHubActionsConfig, GitHubActionsProvider};
use crate::gitlab_ci::{GitLabCiConfig, GitLabCiProvider};
use crate::{azure_devops, bitbucket, github_actions, gitlab_ci};

/// One configuration key accepted by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigField {
    pub name: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
}

const fn required(name: &'static str) -> ConfigField {
    ConfigField {
        name,
        required: true,
        default: None,
    }
}

const fn optional(name: &'static str, default: &'static str) -> ConfigField {
    ConfigField {
        name,
        required: false,
        default: Some(default),
    }
}

/// Describes a provider and how to build it.
#[derive(Debug, Clone, Copy)]
pub struct ProviderManifest {
    pub key: &'static str,
    pub description: &'static str,
    pub config_fields: &'static [ConfigField],
    factory: fn(serde_json::Value) -> Result<ConfiguredProvider>,
}

impl ProviderManifest {
    /// Validate `config` and construct the provider with its HTTP client.
    pub fn build(&self, config: serde_json::Value) -> Result<ConfiguredProvider> {
        let provider = (self.factory)(config)?;
        info!(provider = self.key, "provider configured");
        Ok(provider)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> {
        self.config_fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
    }
}

pub const MANIFESTS: &[ProviderManifest] = &[
    ProviderManifest {
        key: github_actions::provider::PROVIDER_KEY,
        description: "GitHub Actions workflow_dispatch",
        config_fields: &[
            required("token"),
            required("owner"),
            required("repo"),
            required("workflow_id"),
            optional("ref", "main"),
            optional("dispatch_id_mode", "random"),
            optional("api_base_url", github_actions::config::DEFAULT_API_BASE_URL),
        ],
        factory: build_github_actions,
    },
    ProviderManifest {
        key: gitlab_ci::provider::PROVIDER_KEY,
        description: "GitLab CI pipeline trigger",
        config_fields: &[
            required("trigger_token"),
            required("api_token"),
            required("project_id"),
            optional("ref", "main"),
            optional("api_base_url", gitlab_ci::config::DEFAULT_API_BASE_URL),
        ],
        factory: build_gitlab_ci,
    },
    ProviderManifest {
        key: bitbucket::provider::PROVIDER_KEY,
        description: "Bitbucket Pipelines custom pipeline",
        config_fields: &[
            required("token"),
            required("workspace"),
            required("repo_slug"),
            optional("branch", "main"),
            optional("pipeline_pattern", bitbucket::config::DEFAULT_PIPELINE_PATTERN),
            optional("api_base_url", bitbucket::config::DEFAULT_API_BASE_URL),
        ],
        factory: build_bitbucket,
    },
    ProviderManifest {
        key: azure_devops::provider::PROVIDER_KEY,
        description: "Azure DevOps pipeline run",
        config_fields: &[
            required("token"),
            required("organization"),
            required("project"),
            required("pipeline_id"),
            optional("api_base_url", azure_devops::config::DEFAULT_API_BASE_URL),
        ],
        factory: build_azure_devops,
    },
];

/// Keys of every registered provider.
pub fn available_providers() -> Vec<&'static str> {
    MANIFESTS.iter().map(|manifest| manifest.key).collect()
}

/// Look up a provider by key.
pub fn load_provider_manifest(key: &str) -> Result<&'static ProviderManifest> {
    MANIFESTS
        .iter()
        .find(|manifest| manifest.key == key)
        .ok_or_else(|| ScanTestError::ProviderNotFound {
            key: key.to_string(),
            available: available_providers().into_iter().map(String::from).collect(),
        })
}

fn parse_config<T: DeserializeOwned>(key: &str, config: serde_json::Value) -> Result<T> {
    serde_json::from_value(config).map_err(|e| ScanTestError::Config(format!("{key}: {e}")))
}

fn build_github_actions(config: serde_json::Value) -> Result<ConfiguredProvider> {
    let config: GitHubActionsConfig = parse_config(github_actions::provider::PROVIDER_KEY, config)?;
    Ok(ConfiguredProvider::GitHubActions(
        GitHubActionsProvider::from_config(config)?,
    ))
}

fn build_gitlab_ci(config: serde_json::Value) -> Result<ConfiguredProvider> {
    let config: GitLabCiConfig = parse_config(gitlab_ci::provider::PROVIDER_KEY, config)?;
    Ok(ConfiguredProvider::GitLabCi(GitLabCiProvider::from_config(
        config,
    )?))
}

fn build_bitbucket(config: serde_json::Value) -> Result<ConfiguredProvider> {
    let config: BitbucketConfig = parse_config(bitbucket::provider::PROVIDER_KEY, config)?;
    Ok(ConfiguredProvider::Bitbucket(BitbucketProvider::from_config(
        config,
    )?))
}

fn build_azure_devops(config: serde_json::Value) -> Result<ConfiguredProvider> {
    let config: AzureDevOpsConfig = parse_config(azure_devops::provider::PROVIDER_KEY, config)?;
    Ok(ConfiguredProvider::AzureDevOps(
        AzureDevOpsProvider::from_config(config)?,
    ))
}

/// A constructed provider of whichever backend was selected.
///
/// Owns the provider's HTTP client; dropping it closes the connection pool.
#[derive(Debug)]
pub enum ConfiguredProvider {
    GitHubActions(GitHubActionsProvider),
    GitLabCi(GitLabCiProvider),
    Bitbucket(BitbucketProvider),
    AzureDevOps(AzureDevOpsProvider),
}

impl ConfiguredProvider {
    pub fn key(&self) -> &'static str {
        match self {
            Self::GitHubActions(provider) => provider.key(),
            Self::GitLabCi(provider) => provider.key(),
            Self::Bitbucket(provider) => provider.key(),
            Self::AzureDevOps(provider) => provider.key(),
        }
    }

    /// Run every scanner's tests on this provider.
    pub async fn run_tests(
        &self,
        test_definitions: &BTreeMap<String, TestDefinition>,
        registry_repo: &str,
        registry_ref: &str,
        settings: PollSettings,
    ) -> Vec<ScannerResult> {
        match self {
            Self::GitHubActions(provider) => {
                run_on(provider, test_definitions, registry_repo, registry_ref, settings).await
            }
            Self::GitLabCi(provider) => {
                run_on(provider, test_definitions, registry_repo, registry_ref, settings).await
            }
            Self::Bitbucket(provider) => {
                run_on(provider, test_definitions, registry_repo, registry_ref, settings).await
            }
            Self::AzureDevOps(provider) => {
                run_on(provider, test_definitions, registry_repo, registry_ref, settings).await
            }
        }
    }
}

async fn run_on<P: PipelineProvider>(
    provider: &P,
    test_definitions: &BTreeMap<String, TestDefinition>,
    registry_repo: &str,
    registry_ref: &str,
    settings: PollSettings,
) -> Vec<ScannerResult> {
    TestOrchestrator::new(provider)
        .with_settings(settings)
        .run_tests(test_definitions, registry_repo, registry_ref)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_backend_registered() {
        assert_eq!(
            available_providers(),
            vec!["github-actions", "gitlab-ci", "bitbucket", "azure-devops"]
        );
    }

    #[test]
    fn test_unknown_key_lists_available() {
        let err = load_provider_manifest("jenkins").unwrap_err();
        match &err {
            ScanTestError::ProviderNotFound { key, available } => {
                assert_eq!(key, "jenkins");
                assert_eq!(available.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("github-actions, gitlab-ci"));
    }

    #[test]
    fn test_build_each_provider() {
        let configs = [
            (
                "github-actions",
                json!({"token": "t", "owner": "o", "repo": "r", "workflow_id": "w.yml"}),
            ),
            (
                "gitlab-ci",
                json!({"trigger_token": "t", "api_token": "a", "project_id": "1"}),
            ),
            (
                "bitbucket",
                json!({"token": "t", "workspace": "w", "repo_slug": "r"}),
            ),
            (
                "azure-devops",
                json!({"token": "t", "organization": "o", "project": "p", "pipeline_id": 7}),
            ),
        ];

        for (key, config) in configs {
            let provider = load_provider_manifest(key).unwrap().build(config).unwrap();
            assert_eq!(provider.key(), key);
        }
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let manifest = load_provider_manifest("gitlab-ci").unwrap();
        let err = manifest.build(json!({"project_id": "1"})).unwrap_err();
        assert!(matches!(err, ScanTestError::Config(_)));
        assert!(err.to_string().contains("gitlab-ci"));
    }

    #[test]
    fn test_required_fields() {
        let manifest = load_provider_manifest("azure-devops").unwrap();
        let fields: Vec<_> = manifest.required_fields().collect();
        assert_eq!(fields, vec!["token", "organization", "project", "pipeline_id"]);
    }
}
