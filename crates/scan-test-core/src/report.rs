//! Aggregated JSON report and exit code for an invocation.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{ScannerResult, TestStatus};

/// One flattened report row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportEntry {
    pub scanner: String,
    pub status: TestStatus,
    pub duration: f64,
    pub message: Option<String>,
    pub run_url: Option<String>,
}

/// Process-level report printed on stdout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TestReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub timeouts: usize,
    pub results: Vec<ReportEntry>,
}

impl TestReport {
    /// Flatten scanner results into a report, one row per test result.
    pub fn from_results(scanner_results: &[ScannerResult]) -> Self {
        let results: Vec<ReportEntry> = scanner_results
            .iter()
            .flat_map(|scanner| {
                scanner.results.iter().map(move |result| ReportEntry {
                    scanner: scanner.scanner_id.clone(),
                    status: result.status,
                    duration: result.duration,
                    message: result.message.clone(),
                    run_url: result.run_url.clone(),
                })
            })
            .collect();

        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();

        Self {
            total: results.len(),
            passed: count(TestStatus::Success),
            failed: count(TestStatus::Failure),
            errors: count(TestStatus::Error),
            timeouts: count(TestStatus::Timeout),
            results,
        }
    }

    /// Report for an invocation with nothing to test.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status.is_unsuccessful())
    }

    /// 0 when every result succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Log a human-readable summary with run URLs and messages.
pub fn log_results_summary(scanner_results: &[ScannerResult]) {
    let rule = "=".repeat(80);
    info!("{rule}");
    info!("Test Results Summary:");
    info!("{rule}");

    for scanner in scanner_results {
        for result in &scanner.results {
            info!("{}", summary_line(&scanner.scanner_id, result.status, result.duration));
            if let Some(run_url) = result.run_url.as_deref().filter(|u| !u.is_empty()) {
                info!("  Run URL: {run_url}");
            }
            if let Some(message) = &result.message {
                info!("  Message: {message}");
            }
        }
    }
}

fn summary_line(scanner_id: &str, status: TestStatus, duration: f64) -> String {
    format!("{} {}: {} ({:.2}s)", status.symbol(), scanner_id, status, duration)
}
