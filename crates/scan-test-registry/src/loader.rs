//! Loading `tests.yaml` definitions from a registry checkout.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use scan_test_core::{Result, ScanTestError, TestDefinition};

pub const TEST_FILE_NAME: &str = "tests.yaml";

/// `scanners/<scanner_id>/tests.yaml` under the registry root.
pub fn test_file_path(registry_path: &Path, scanner_id: &str) -> PathBuf {
    registry_path
        .join("scanners")
        .join(scanner_id)
        .join(TEST_FILE_NAME)
}

pub async fn has_test_definition(registry_path: &Path, scanner_id: &str) -> bool {
    tokio::fs::try_exists(test_file_path(registry_path, scanner_id))
        .await
        .unwrap_or(false)
}

/// Read, parse and validate one scanner's test definition.
pub async fn load_test_definition(registry_path: &Path, scanner_id: &str) -> Result<TestDefinition> {
    let path = test_file_path(registry_path, scanner_id);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ScanTestError::DefinitionNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    parse_test_definition(&content).map_err(|e| match e {
        ScanTestError::Schema(message) => {
            ScanTestError::Schema(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Parse and validate the YAML text of a `tests.yaml`.
pub fn parse_test_definition(content: &str) -> Result<TestDefinition> {
    if content.trim().is_empty() {
        return Err(ScanTestError::Schema("file is empty".to_string()));
    }

    let definition: TestDefinition =
        serde_yaml::from_str(content).map_err(|e| ScanTestError::Schema(e.to_string()))?;
    definition.validate()?;
    Ok(definition)
}

/// Load definitions for every scanner that has one.
///
/// Scanners without a `tests.yaml` are skipped; any other failure aborts.
pub async fn load_test_definitions(
    registry_path: &Path,
    scanner_ids: &[String],
) -> Result<BTreeMap<String, TestDefinition>> {
    let mut definitions = BTreeMap::new();

    for scanner_id in scanner_ids {
        match load_test_definition(registry_path, scanner_id).await {
            Ok(definition) => {
                debug!(scanner_id = %scanner_id, tests = definition.tests.len(), "loaded test definition");
                definitions.insert(scanner_id.clone(), definition);
            }
            Err(ScanTestError::DefinitionNotFound(path)) => {
                warn!(scanner_id = %scanner_id, path = %path, "no test definition, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_test_core::TestType;

    const VALID: &str = r#"
version: "1.0"
tests:
  - name: smoke
    type: source-code
    source:
      url: https://github.com/org/app.git
      ref: v1.2.0
    scan_paths:
      - src
      - lib
  - name: image
    type: container-image
    source:
      url: https://github.com/org/image.git
      ref: main
    timeout: 15m
"#;

    fn write_definition(root: &Path, scanner_id: &str, content: &str) {
        let path = test_file_path(root, scanner_id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_load_valid_definition() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "org/scanner", VALID);

        let definition = load_test_definition(dir.path(), "org/scanner").await.unwrap();

        assert_eq!(definition.version, "1.0");
        assert_eq!(definition.tests.len(), 2);
        assert_eq!(definition.tests[0].scan_paths, vec!["src", "lib"]);
        assert_eq!(definition.tests[0].timeout, "5m");
        assert_eq!(definition.tests[1].test_type, TestType::ContainerImage);
        assert_eq!(definition.to_matrix_entries().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_test_definition(dir.path(), "org/missing").await.unwrap_err();
        assert!(matches!(err, ScanTestError::DefinitionNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_file_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "org/scanner", "  \n");

        let err = load_test_definition(dir.path(), "org/scanner").await.unwrap_err();
        assert!(matches!(err, ScanTestError::Schema(_)));
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "org/scanner", "version: [unclosed");

        let err = load_test_definition(dir.path(), "org/scanner").await.unwrap_err();
        assert!(matches!(err, ScanTestError::Schema(_)));
    }

    #[test]
    fn test_rejects_http_source() {
        let content = VALID.replace("https://github.com/org/app.git", "http://github.com/org/app.git");
        assert!(parse_test_definition(&content).is_err());
    }

    #[test]
    fn test_rejects_unknown_test_type() {
        let content = VALID.replace("container-image", "binary");
        assert!(parse_test_definition(&content).is_err());
    }

    #[tokio::test]
    async fn test_load_many_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "org/b", VALID);
        write_definition(dir.path(), "org/a", VALID);

        let ids = vec!["org/b".to_string(), "org/none".to_string(), "org/a".to_string()];
        let definitions = load_test_definitions(dir.path(), &ids).await.unwrap();

        let keys: Vec<_> = definitions.keys().cloned().collect();
        assert_eq!(keys, vec!["org/a", "org/b"]);
    }

    #[tokio::test]
    async fn test_load_many_propagates_schema_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "org/a", VALID);
        write_definition(dir.path(), "org/bad", "version: \"\"\ntests: []\n");

        let ids = vec!["org/a".to_string(), "org/bad".to_string()];
        let err = load_test_definitions(dir.path(), &ids).await.unwrap_err();
        assert!(matches!(err, ScanTestError::Schema(_)));
    }

    #[tokio::test]
    async fn test_has_test_definition() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "org/a", VALID);
        assert!(has_test_definition(dir.path(), "org/a").await);
        assert!(!has_test_definition(dir.path(), "org/b").await);
    }
}
