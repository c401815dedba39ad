//! Error taxonomy for scanner test orchestration.

use thiserror::Error;

/// Errors produced while dispatching, polling or preparing scanner tests.
#[derive(Error, Debug)]
pub enum ScanTestError {
    /// The backend rejected the call that triggers a pipeline.
    #[error("failed to {action}: {status} {body}")]
    Dispatch {
        action: String,
        status: u16,
        body: String,
    },

    /// The backend rejected a status poll.
    #[error("failed to {action}: {status} {body}")]
    Api {
        action: String,
        status: u16,
        body: String,
    },

    /// Polling deadline exceeded.
    #[error("tests did not complete within {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Provider key is not present in the registry.
    #[error("provider '{key}' not found. Available providers: {}", available.join(", "))]
    ProviderNotFound { key: String, available: Vec<String> },

    /// Malformed or invalid test definition.
    #[error("invalid test definition: {0}")]
    Schema(String),

    /// Scanner has no tests.yaml in the registry checkout.
    #[error("test file not found: {0}")]
    DefinitionNotFound(String),

    /// Provider configuration rejected.
    #[error("invalid provider configuration: {0}")]
    Config(String),

    /// Transport-level HTTP failure (connect, TLS, body read).
    #[error("http error: {0}")]
    Http(String),

    /// Backend answered with a body we could not use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanTestError {
    /// Whether this error came from the backend rejecting a request.
    pub fn is_backend_rejection(&self) -> bool {
        matches!(self, Self::Dispatch { .. } | Self::Api { .. })
    }

    /// HTTP status carried by a backend rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Dispatch { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for scanner test operations.
pub type Result<T> = std::result::Result<T, ScanTestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_embeds_status_and_body() {
        let err = ScanTestError::Dispatch {
            action: "dispatch workflow".to_string(),
            status: 422,
            body: "Unexpected inputs provided".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to dispatch workflow: 422 Unexpected inputs provided"
        );
        assert_eq!(err.status(), Some(422));
        assert!(err.is_backend_rejection());
    }

    #[test]
    fn test_provider_not_found_lists_available() {
        let err = ScanTestError::ProviderNotFound {
            key: "jenkins".to_string(),
            available: vec!["github-actions".to_string(), "gitlab-ci".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("'jenkins'"));
        assert!(text.contains("github-actions, gitlab-ci"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_timeout_display() {
        let err = ScanTestError::Timeout { timeout_secs: 1800 };
        assert_eq!(err.to_string(), "tests did not complete within 1800 seconds");
        assert!(!err.is_backend_rejection());
    }
}
