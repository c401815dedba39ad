//! Outcomes of pipeline runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical status every backend vocabulary is mapped onto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Success,
    Failure,
    Timeout,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Success => "success",
            TestStatus::Failure => "failure",
            TestStatus::Timeout => "timeout",
            TestStatus::Error => "error",
        }
    }

    /// Whether this status fails the invocation.
    pub fn is_unsuccessful(&self) -> bool {
        !matches!(self, TestStatus::Success)
    }

    /// Symbol used in the human-readable summary.
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Success => "✓",
            TestStatus::Failure => "✗",
            TestStatus::Error => "!",
            TestStatus::Timeout => "⏱",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one pipeline run.
///
/// Carries only the execution outcome; the scanner it belongs to is known by
/// the enclosing [`ScannerResult`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub status: TestStatus,

    /// Wall-clock seconds between pipeline creation and its terminal state.
    pub duration: f64,

    pub message: Option<String>,

    pub run_url: Option<String>,
}

impl TestResult {
    /// Result for a pipeline that reached a terminal state.
    pub fn completed(status: TestStatus, duration: f64, run_url: impl Into<String>) -> Self {
        Self {
            status,
            duration: duration.max(0.0),
            message: None,
            run_url: Some(run_url.into()),
        }
    }

    /// Result synthesized when dispatching or waiting failed.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Error,
            duration: 0.0,
            message: Some(message.into()),
            run_url: None,
        }
    }
}

/// All results collected for one scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScannerResult {
    pub scanner_id: String,
    pub results: Vec<TestResult>,
}

impl ScannerResult {
    pub fn new(scanner_id: impl Into<String>, results: Vec<TestResult>) -> Self {
        Self {
            scanner_id: scanner_id.into(),
            results,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status.is_unsuccessful())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TestStatus::Timeout).unwrap(),
            "\"timeout\""
        );
        assert_eq!(TestStatus::Failure.to_string(), "failure");
    }

    #[test]
    fn test_only_success_is_successful() {
        assert!(!TestStatus::Success.is_unsuccessful());
        assert!(TestStatus::Failure.is_unsuccessful());
        assert!(TestStatus::Timeout.is_unsuccessful());
        assert!(TestStatus::Error.is_unsuccessful());
    }

    #[test]
    fn test_error_result_has_zero_duration() {
        let result = TestResult::error("boom");
        assert_eq!(result.status, TestStatus::Error);
        assert_eq!(result.duration, 0.0);
        assert_eq!(result.message.as_deref(), Some("boom"));
        assert!(result.run_url.is_none());
    }

    #[test]
    fn test_completed_clamps_negative_duration() {
        let result = TestResult::completed(TestStatus::Success, -3.0, "https://ci/run/1");
        assert_eq!(result.duration, 0.0);
    }

    #[test]
    fn test_scanner_result_has_failures() {
        let ok = ScannerResult::new(
            "org/a",
            vec![TestResult::completed(TestStatus::Success, 1.0, "u")],
        );
        let bad = ScannerResult::new("org/b", vec![TestResult::error("x")]);
        assert!(!ok.has_failures());
        assert!(bad.has_failures());
    }
}
