//! scan-test core library
//!
//! Dispatches a scanner registry's test pipelines to a CI backend and
//! collects the outcomes:
//! - `domain`: test definitions, matrix entries, results
//! - `provider`: the dispatch/poll contract every backend implements
//! - `orchestrator`: concurrent fan-out across scanners
//! - `report`: JSON report and exit code

pub mod domain;
pub mod error;
pub mod fakes;
pub mod orchestrator;
pub mod provider;
pub mod report;
pub mod telemetry;

pub use domain::{
    MatrixEntry, MatrixTest, ScannerResult, Test, TestDefinition, TestResult, TestSource,
    TestStatus, TestType,
};
pub use error::{Result, ScanTestError};
pub use orchestrator::{ScannerStage, TestOrchestrator};
pub use provider::{PipelineProvider, PollOutcome, PollSettings};
pub use report::{log_results_summary, ReportEntry, TestReport};
pub use telemetry::init_tracing;
