//! Provider contract shared by every CI backend.
//!
//! A provider runs a two-phase protocol per scanner:
//! 1. `dispatch_scanner_tests` triggers exactly one pipeline for the scanner's
//!    whole matrix and returns provider-owned dispatch state.
//! 2. `poll_status` checks that pipeline once; `wait_for_completion` repeats
//!    the check until a terminal state or the deadline.
//!
//! The dispatch state is an associated type: the orchestrator threads it from
//! dispatch to poll without looking inside.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{TestDefinition, TestResult};
use crate::error::{Result, ScanTestError};

/// Default polling deadline (30 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;
/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Outcome of a single non-blocking status check.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The pipeline has not reached a terminal state yet.
    Pending,
    /// The pipeline finished; one result per pipeline run.
    Complete(Vec<TestResult>),
}

impl PollOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, PollOutcome::Pending)
    }
}

/// Deadline and cadence of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl PollSettings {
    pub fn from_secs(timeout_secs: u64, poll_interval_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            poll_interval: Duration::from_secs(poll_interval_secs),
        }
    }
}

/// A CI backend able to run a scanner's test matrix as one pipeline.
#[async_trait]
pub trait PipelineProvider: Send + Sync {
    /// Whatever the provider needs to find its pipeline again when polling.
    type DispatchState: Send + Sync;

    /// Registry key of this provider (e.g. `github-actions`).
    fn key(&self) -> &'static str;

    /// Trigger one pipeline for all of a scanner's tests.
    ///
    /// Fails with [`ScanTestError::Dispatch`] when the backend does not accept
    /// the trigger call.
    async fn dispatch_scanner_tests(
        &self,
        scanner_id: &str,
        test_definition: &TestDefinition,
        registry_ref: &str,
        registry_repo: &str,
    ) -> Result<Self::DispatchState>;

    /// Check the dispatched pipeline once.
    ///
    /// Returns [`PollOutcome::Pending`] for every non-terminal backend state and
    /// fails with [`ScanTestError::Api`] on an unexpected HTTP status.
    async fn poll_status(&self, dispatch_state: &Self::DispatchState) -> Result<PollOutcome>;

    /// Poll until the pipeline is terminal or `settings.timeout` has elapsed.
    ///
    /// Polls for one dispatch are strictly sequential. The first poll happens
    /// immediately; a result returns without sleeping.
    async fn wait_for_completion(
        &self,
        dispatch_state: &Self::DispatchState,
        settings: &PollSettings,
    ) -> Result<Vec<TestResult>> {
        // None: the timeout reaches past what the clock can represent.
        let deadline = Instant::now().checked_add(settings.timeout);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if let PollOutcome::Complete(results) = self.poll_status(dispatch_state).await? {
                debug!(provider = self.key(), attempt, "pipeline reached terminal state");
                return Ok(results);
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(ScanTestError::Timeout {
                    timeout_secs: settings.timeout.as_secs(),
                });
            }

            debug!(
                provider = self.key(),
                attempt,
                interval_secs = settings.poll_interval.as_secs(),
                "pipeline still running"
            );
            tokio::time::sleep(settings.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TestStatus;
    use crate::fakes::{PollScript, ScriptedProvider};

    #[test]
    fn test_poll_settings_default() {
        let settings = PollSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(1800));
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_immediately_on_first_result() {
        let provider = ScriptedProvider::new().with_scanner(
            "org/scanner",
            PollScript::pending_then(0, TestStatus::Success),
        );
        let state = provider
            .dispatch_scanner_tests("org/scanner", &Default::default(), "sha", "org/registry")
            .await
            .unwrap();

        let start = Instant::now();
        let results = provider
            .wait_for_completion(&state, &PollSettings::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, TestStatus::Success);
        assert_eq!(start.elapsed(), Duration::ZERO, "must not sleep");
        assert_eq!(provider.poll_count("org/scanner"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_polls_until_terminal() {
        let provider = ScriptedProvider::new().with_scanner(
            "org/scanner",
            PollScript::pending_then(3, TestStatus::Failure),
        );
        let state = provider
            .dispatch_scanner_tests("org/scanner", &Default::default(), "sha", "org/registry")
            .await
            .unwrap();

        let start = Instant::now();
        let results = provider
            .wait_for_completion(&state, &PollSettings::from_secs(600, 10))
            .await
            .unwrap();

        assert_eq!(results[0].status, TestStatus::Failure);
        assert_eq!(provider.poll_count("org/scanner"), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_when_always_pending() {
        let provider =
            ScriptedProvider::new().with_scanner("org/scanner", PollScript::never_finishes());
        let state = provider
            .dispatch_scanner_tests("org/scanner", &Default::default(), "sha", "org/registry")
            .await
            .unwrap();

        let err = provider
            .wait_for_completion(&state, &PollSettings::from_secs(60, 30))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanTestError::Timeout { timeout_secs: 60 }));
        // t=0, t=30, t=60 (deadline reached)
        assert_eq!(provider.poll_count("org/scanner"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_with_unrepresentable_timeout_keeps_polling() {
        let provider = ScriptedProvider::new().with_scanner(
            "org/scanner",
            PollScript::pending_then(1, TestStatus::Success),
        );
        let state = provider
            .dispatch_scanner_tests("org/scanner", &Default::default(), "sha", "org/registry")
            .await
            .unwrap();

        let results = provider
            .wait_for_completion(&state, &PollSettings::from_secs(u64::MAX, 1))
            .await
            .unwrap();

        assert_eq!(results[0].status, TestStatus::Success);
        assert_eq!(provider.poll_count("org/scanner"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_propagates_poll_error_without_retry() {
        let provider =
            ScriptedProvider::new().with_scanner("org/scanner", PollScript::poll_fails(503));
        let state = provider
            .dispatch_scanner_tests("org/scanner", &Default::default(), "sha", "org/registry")
            .await
            .unwrap();

        let err = provider
            .wait_for_completion(&state, &PollSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScanTestError::Api { status: 503, .. }));
        assert_eq!(provider.poll_count("org/scanner"), 1);
    }
}
