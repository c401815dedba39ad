//! Detect which scanners changed between two git refs.
//!
//! A scanner lives under `scanners/<org>/<name>/`; its id is `<org>/<name>`.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use scan_test_core::{Result, ScanTestError};

use crate::loader::has_test_definition;

const SCANNERS_DIR: &str = "scanners/";
const WORKFLOWS_DIR: &str = ".github/workflows/";

/// Scanners that need testing for the changes between `base_ref` and `head_ref`.
///
/// Changed scanners with a `tests.yaml` win. When there are none and a CI
/// workflow changed, the fallback scanners that have tests are returned,
/// sorted.
pub async fn get_scanners_to_test(
    registry_path: &Path,
    base_ref: &str,
    head_ref: &str,
    fallback_scanners: &[String],
) -> Result<Vec<String>> {
    let changed_files = get_changed_files(registry_path, base_ref, head_ref).await?;
    debug!(files = changed_files.len(), "changed files");

    let mut scanners = Vec::new();
    for scanner_id in extract_scanner_ids(&changed_files) {
        if has_test_definition(registry_path, &scanner_id).await {
            scanners.push(scanner_id);
        } else {
            debug!(scanner_id = %scanner_id, "changed scanner has no tests");
        }
    }
    if !scanners.is_empty() {
        return Ok(scanners);
    }

    if has_workflow_changes(&changed_files) && !fallback_scanners.is_empty() {
        info!("workflow files changed, using fallback scanners");
        let mut fallback = Vec::new();
        for scanner_id in fallback_scanners {
            if has_test_definition(registry_path, scanner_id).await {
                fallback.push(scanner_id.clone());
            }
        }
        fallback.sort();
        fallback.dedup();
        return Ok(fallback);
    }

    Ok(Vec::new())
}

/// Files changed between two refs (`git diff --name-only`).
pub async fn get_changed_files(
    registry_path: &Path,
    base_ref: &str,
    head_ref: &str,
) -> Result<Vec<String>> {
    let base = resolve_ref(registry_path, base_ref).await?;
    let head = resolve_ref(registry_path, head_ref).await?;

    let output = Command::new("git")
        .args(["diff", "--name-only", base.as_str(), head.as_str()])
        .current_dir(registry_path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ScanTestError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScanTestError::Git(format!(
            "git diff failed: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Resolve `git_ref`, falling back to `origin/<git_ref>`.
///
/// CI checkouts often only carry the remote-tracking branch.
pub async fn resolve_ref(registry_path: &Path, git_ref: &str) -> Result<String> {
    if ref_exists(registry_path, git_ref).await {
        return Ok(git_ref.to_string());
    }

    if !git_ref.starts_with("origin/") && !git_ref.starts_with("refs/") {
        let origin_ref = format!("origin/{git_ref}");
        if ref_exists(registry_path, &origin_ref).await {
            debug!(git_ref, resolved = %origin_ref, "resolved ref via origin");
            return Ok(origin_ref);
        }
    }

    Err(ScanTestError::Git(format!("cannot resolve git ref '{git_ref}'")))
}

/// Whether `git rev-parse --verify` accepts `git_ref`.
pub async fn ref_exists(registry_path: &Path, git_ref: &str) -> bool {
    Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", git_ref])
        .current_dir(registry_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Unique scanner ids touched by `changed_files`, sorted.
pub fn extract_scanner_ids(changed_files: &[String]) -> Vec<String> {
    let mut ids = BTreeSet::new();

    for file in changed_files {
        let Some(rest) = file.strip_prefix(SCANNERS_DIR) else {
            continue;
        };
        let parts: Vec<&str> = rest.split('/').collect();
        // org / name / file...
        if parts.len() >= 3 && parts[..3].iter().all(|part| !part.is_empty()) {
            ids.insert(format!("{}/{}", parts[0], parts[1]));
        }
    }

    ids.into_iter().collect()
}

pub fn has_workflow_changes(changed_files: &[String]) -> bool {
    changed_files
        .iter()
        .any(|file| file.starts_with(WORKFLOWS_DIR))
}
