//! Domain model for scanner tests.
//!
//! - `TestDefinition` / `Test` / `TestSource`: what a scanner wants tested
//! - `MatrixEntry`: one (test, scan path) combination handed to a pipeline
//! - `TestResult` / `ScannerResult`: what came back

pub mod definition;
pub mod result;

pub use definition::{
    MatrixEntry, MatrixTest, Test, TestDefinition, TestSource, TestType, DEFAULT_TEST_TIMEOUT,
};
pub use result::{ScannerResult, TestResult, TestStatus};
