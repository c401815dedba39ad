//! Test definitions loaded from a scanner's `tests.yaml`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanTestError};

/// Default per-test timeout forwarded to the pipeline.
pub const DEFAULT_TEST_TIMEOUT: &str = "5m";

fn default_timeout() -> String {
    DEFAULT_TEST_TIMEOUT.to_string()
}

/// Kind of target a test scans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TestType {
    SourceCode,
    ContainerImage,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::SourceCode => "source-code",
            TestType::ContainerImage => "container-image",
        }
    }
}

/// Source repository a test scans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TestSource {
    /// Git repository URL (HTTPS only).
    pub url: String,

    /// Branch, tag or commit SHA.
    #[serde(rename = "ref")]
    pub git_ref: String,
}

/// A single test of a scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Test {
    pub name: String,

    #[serde(rename = "type")]
    pub test_type: TestType,

    pub source: TestSource,

    /// Paths to scan; empty means the whole repository.
    #[serde(default)]
    pub scan_paths: Vec<String>,

    /// Duration string such as `300s` or `5m`.
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Test {
    /// Scan paths as matrix slots: `[None]` for a whole-repository scan.
    fn scan_slots(&self) -> Vec<Option<&str>> {
        if self.scan_paths.is_empty() {
            vec![None]
        } else {
            self.scan_paths.iter().map(|p| Some(p.as_str())).collect()
        }
    }
}

/// One concrete (test, scan_path) combination, flattened for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatrixEntry {
    pub test_name: String,
    pub test_type: TestType,
    pub source_url: String,
    pub source_ref: String,
    /// `None` scans the entire repository.
    pub scan_path: Option<String>,
    pub timeout: String,
}

/// Compact matrix row: only what the pipeline needs to look the test up again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatrixTest {
    pub test_name: String,
    pub scan_path: Option<String>,
}

/// Root object of a scanner's `tests.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TestDefinition {
    pub version: String,

    #[serde(default)]
    pub tests: Vec<Test>,
}

impl TestDefinition {
    /// Expand every test into one entry per scan path.
    pub fn to_matrix_entries(&self) -> Vec<MatrixEntry> {
        self.tests
            .iter()
            .flat_map(|test| {
                test.scan_slots().into_iter().map(move |scan_path| MatrixEntry {
                    test_name: test.name.clone(),
                    test_type: test.test_type,
                    source_url: test.source.url.clone(),
                    source_ref: test.source.git_ref.clone(),
                    scan_path: scan_path.map(str::to_string),
                    timeout: test.timeout.clone(),
                })
            })
            .collect()
    }

    /// Same expansion as [`to_matrix_entries`](Self::to_matrix_entries), keeping only
    /// the test name and scan path.
    pub fn to_matrix_tests(&self) -> Vec<MatrixTest> {
        self.tests
            .iter()
            .flat_map(|test| {
                test.scan_slots().into_iter().map(move |scan_path| MatrixTest {
                    test_name: test.name.clone(),
                    scan_path: scan_path.map(str::to_string),
                })
            })
            .collect()
    }

    /// Serialize the full matrix to the JSON string passed as a pipeline variable.
    pub fn matrix_entries_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_matrix_entries())?)
    }

    /// Serialize the compact matrix to the JSON string passed as a pipeline variable.
    pub fn matrix_tests_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_matrix_tests())?)
    }

    /// Check the constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(ScanTestError::Schema("version cannot be empty".to_string()));
        }

        for (index, test) in self.tests.iter().enumerate() {
            if test.name.trim().is_empty() {
                return Err(ScanTestError::Schema(format!(
                    "tests[{index}].name cannot be empty"
                )));
            }
            if !test.source.url.starts_with("https://") {
                return Err(ScanTestError::Schema(format!(
                    "tests[{index}].source.url must be an HTTPS URL, got '{}'",
                    test.source.url
                )));
            }
            if test.source.git_ref.trim().is_empty() {
                return Err(ScanTestError::Schema(format!(
                    "tests[{index}].source.ref cannot be empty"
                )));
            }
            if !is_valid_timeout(&test.timeout) {
                return Err(ScanTestError::Schema(format!(
                    "tests[{index}].timeout must look like '300s', '5m' or '1h', got '{}'",
                    test.timeout
                )));
            }
            if test.scan_paths.iter().any(|p| p.trim().is_empty()) {
                return Err(ScanTestError::Schema(format!(
                    "tests[{index}].scan_paths cannot contain empty paths"
                )));
            }
        }

        Ok(())
    }
}

/// `<positive integer><s|m|h>`
fn is_valid_timeout(value: &str) -> bool {
    let Some(unit) = value.chars().last() else {
        return false;
    };
    if !matches!(unit, 's' | 'm' | 'h') {
        return false;
    }
    let digits = &value[..value.len() - 1];
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && digits.parse::<u64>().map(|n| n > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> TestSource {
        TestSource {
            url: "https://github.com/org/repo.git".to_string(),
            git_ref: "main".to_string(),
        }
    }

    fn test_with_paths(name: &str, paths: &[&str]) -> Test {
        Test {
            name: name.to_string(),
            test_type: TestType::SourceCode,
            source: source(),
            scan_paths: paths.iter().map(|p| p.to_string()).collect(),
            timeout: DEFAULT_TEST_TIMEOUT.to_string(),
        }
    }

    #[test]
    fn test_empty_scan_paths_yield_single_whole_repo_entry() {
        let def = TestDefinition {
            version: "1.0".to_string(),
            tests: vec![test_with_paths("smoke", &[])],
        };

        let entries = def.to_matrix_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].scan_path, None);
        assert_eq!(entries[0].test_name, "smoke");
    }

    #[test]
    fn test_matrix_size_matches_scan_path_count() {
        let def = TestDefinition {
            version: "1.0".to_string(),
            tests: vec![
                test_with_paths("a", &["src", "lib", "docs"]),
                test_with_paths("b", &[]),
                test_with_paths("c", &["."]),
            ],
        };

        let expected: usize = def.tests.iter().map(|t| t.scan_paths.len().max(1)).sum();
        assert_eq!(def.to_matrix_entries().len(), expected);
        assert_eq!(def.to_matrix_tests().len(), expected);
        assert_eq!(expected, 5);
    }

    #[test]
    fn test_matrix_entries_preserve_test_metadata() {
        let def = TestDefinition {
            version: "1.0".to_string(),
            tests: vec![Test {
                name: "image".to_string(),
                test_type: TestType::ContainerImage,
                source: TestSource {
                    url: "https://github.com/org/images.git".to_string(),
                    git_ref: "v1.2.3".to_string(),
                },
                scan_paths: vec!["alpine".to_string(), "debian".to_string()],
                timeout: "10m".to_string(),
            }],
        };

        let entries = def.to_matrix_entries();
        assert_eq!(entries.len(), 2);
        for (entry, path) in entries.iter().zip(["alpine", "debian"]) {
            assert_eq!(entry.test_name, "image");
            assert_eq!(entry.test_type, TestType::ContainerImage);
            assert_eq!(entry.source_url, "https://github.com/org/images.git");
            assert_eq!(entry.source_ref, "v1.2.3");
            assert_eq!(entry.timeout, "10m");
            assert_eq!(entry.scan_path.as_deref(), Some(path));
        }
    }

    #[test]
    fn test_matrix_tests_json_uses_null_for_whole_repo() {
        let def = TestDefinition {
            version: "1.0".to_string(),
            tests: vec![test_with_paths("smoke", &[])],
        };

        let json = def.matrix_tests_json().unwrap();
        assert_eq!(json, r#"[{"test_name":"smoke","scan_path":null}]"#);
    }

    #[test]
    fn test_matrix_entries_json_uses_kebab_case_type() {
        let def = TestDefinition {
            version: "1.0".to_string(),
            tests: vec![test_with_paths("smoke", &["src"])],
        };

        let value: serde_json::Value =
            serde_json::from_str(&def.matrix_entries_json().unwrap()).unwrap();
        assert_eq!(value[0]["test_type"], "source-code");
        assert_eq!(value[0]["source_ref"], "main");
        assert_eq!(value[0]["scan_path"], "src");
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let json = r#"{
            "version": "1.0",
            "tests": [{
                "name": "smoke",
                "type": "source-code",
                "source": {"url": "https://github.com/org/repo.git", "ref": "main"}
            }]
        }"#;

        let def: TestDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.tests[0].timeout, "5m");
        assert!(def.tests[0].scan_paths.is_empty());
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_https_url() {
        let mut test = test_with_paths("smoke", &[]);
        test.source.url = "git@github.com:org/repo.git".to_string();
        let def = TestDefinition {
            version: "1.0".to_string(),
            tests: vec![test],
        };

        let err = def.validate().unwrap_err();
        assert!(matches!(err, ScanTestError::Schema(_)));
        assert!(err.to_string().contains("HTTPS"));
    }

    #[test]
    fn test_validate_rejects_bad_timeout() {
        for timeout in ["", "5", "m", "0s", "5d", "-1m", "1.5m"] {
            let mut test = test_with_paths("smoke", &[]);
            test.timeout = timeout.to_string();
            let def = TestDefinition {
                version: "1.0".to_string(),
                tests: vec![test],
            };
            assert!(def.validate().is_err(), "timeout {timeout:?} should be rejected");
        }
    }

    #[test]
    fn test_validate_accepts_known_units() {
        for timeout in ["300s", "5m", "1h"] {
            assert!(is_valid_timeout(timeout), "{timeout} should be accepted");
        }
    }

    #[test]
    fn test_validate_rejects_empty_version() {
        let def = TestDefinition {
            version: " ".to_string(),
            tests: vec![],
        };
        assert!(def.validate().is_err());
    }
}
