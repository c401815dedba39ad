//! Fan-out of scanner test pipelines on a single provider.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info};

use crate::domain::{ScannerResult, TestDefinition, TestResult};
use crate::error::ScanTestError;
use crate::provider::{PipelineProvider, PollSettings};

/// Step of a scanner's run that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerStage {
    Dispatch,
    Wait,
}

impl fmt::Display for ScannerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerStage::Dispatch => f.write_str("dispatch"),
            ScannerStage::Wait => f.write_str("wait"),
        }
    }
}

#[derive(Debug)]
struct ScannerFailure {
    stage: ScannerStage,
    error: ScanTestError,
}

/// Runs every scanner's tests concurrently on one provider.
///
/// A failing scanner never aborts its siblings: its error is turned into a
/// single `error` result carrying the error text.
pub struct TestOrchestrator<'a, P: PipelineProvider> {
    provider: &'a P,
    settings: PollSettings,
}

impl<'a, P: PipelineProvider> TestOrchestrator<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            settings: PollSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Dispatch and wait for all scanners; one `ScannerResult` per input scanner,
    /// in input order.
    pub async fn run_tests(
        &self,
        test_definitions: &BTreeMap<String, TestDefinition>,
        registry_repo: &str,
        registry_ref: &str,
    ) -> Vec<ScannerResult> {
        if test_definitions.is_empty() {
            info!("No test definitions provided");
            return Vec::new();
        }

        info!(
            provider = self.provider.key(),
            scanners = test_definitions.len(),
            "Dispatching tests"
        );

        let runs = test_definitions.iter().map(|(scanner_id, definition)| async move {
            let outcome = self
                .run_scanner_tests(scanner_id, definition, registry_ref, registry_repo)
                .await;
            (scanner_id, outcome)
        });
        let outcomes = join_all(runs).await;

        info!("Test execution completed");

        outcomes
            .into_iter()
            .map(|(scanner_id, outcome)| match outcome {
                Ok(results) => {
                    for result in &results {
                        info!(
                            scanner_id = %scanner_id,
                            status = %result.status,
                            duration_secs = result.duration,
                            "Test completed"
                        );
                    }
                    ScannerResult::new(scanner_id.clone(), results)
                }
                Err(failure) => {
                    error!(
                        scanner_id = %scanner_id,
                        stage = %failure.stage,
                        error = %failure.error,
                        "Scanner test execution failed"
                    );
                    ScannerResult::new(
                        scanner_id.clone(),
                        vec![TestResult::error(failure.error.to_string())],
                    )
                }
            })
            .collect()
    }

    async fn run_scanner_tests(
        &self,
        scanner_id: &str,
        test_definition: &TestDefinition,
        registry_ref: &str,
        registry_repo: &str,
    ) -> Result<Vec<TestResult>, ScannerFailure> {
        info!(
            scanner_id = %scanner_id,
            tests = test_definition.tests.len(),
            "Dispatching tests for scanner"
        );

        let dispatch_state = self
            .provider
            .dispatch_scanner_tests(scanner_id, test_definition, registry_ref, registry_repo)
            .await
            .map_err(|error| ScannerFailure {
                stage: ScannerStage::Dispatch,
                error,
            })?;

        info!(scanner_id = %scanner_id, "Tests dispatched, waiting for completion");

        self.provider
            .wait_for_completion(&dispatch_state, &self.settings)
            .await
            .map_err(|error| ScannerFailure {
                stage: ScannerStage::Wait,
                error,
            })
    }
}
