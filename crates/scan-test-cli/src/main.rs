//! scan-test - run a scanner registry's test pipelines on a CI backend
//!
//! Detects the scanners changed between two refs of a registry checkout,
//! dispatches their test matrices to the configured provider, waits for the
//! pipelines and prints a JSON report on stdout.
//!
//! Exit codes: 0 all tests passed (or nothing to test), 1 at least one test
//! failed, errored or timed out, 2 the invocation itself failed.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};

use scan_test_core::provider::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS};
use scan_test_core::{init_tracing, log_results_summary, PollSettings, TestReport};
use scan_test_providers::load_provider_manifest;
use scan_test_registry::{get_scanners_to_test, load_test_definitions};

/// Exit code for failures of the invocation itself, as opposed to failed tests.
const EXIT_USAGE_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "scan-test")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run scanner tests on CI/CD providers", long_about = None)]
struct Cli {
    /// Provider key (github-actions, gitlab-ci, bitbucket, azure-devops)
    #[arg(long, env = "SCAN_TEST_PROVIDER")]
    provider: String,

    /// JSON configuration object for the provider
    #[arg(long, env = "SCAN_TEST_PROVIDER_CONFIG", hide_env_values = true)]
    provider_config: String,

    /// Path to the scanner registry checkout
    #[arg(long)]
    registry_path: PathBuf,

    /// Registry repository identifier (org/repo)
    #[arg(long)]
    registry_repo: String,

    /// Git ref of the registry under test (commit SHA)
    #[arg(long)]
    registry_ref: String,

    /// Base git ref to compare against
    #[arg(long)]
    base_ref: String,

    /// Head git ref to compare
    #[arg(long, default_value = "HEAD")]
    head_ref: String,

    /// Comma-separated scanner ids to test when only workflow files changed
    #[arg(long, default_value = "")]
    fallback_scanners: String,

    /// Per-scanner polling deadline in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Seconds between two status polls (at least 1)
    #[arg(
        long,
        default_value_t = DEFAULT_POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,
}

/// Split a comma-separated scanner list, dropping blanks.
fn parse_fallback_scanners(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

async fn run(cli: &Cli) -> Result<TestReport> {
    info!(provider = %cli.provider, "loading provider");
    let manifest = load_provider_manifest(&cli.provider)?;

    let config: serde_json::Value = serde_json::from_str(&cli.provider_config)
        .context("provider configuration is not valid JSON")?;
    let provider = manifest.build(config).with_context(|| {
        format!(
            "failed to configure provider '{}' (required fields: {})",
            manifest.key,
            manifest.required_fields().collect::<Vec<_>>().join(", ")
        )
    })?;

    info!(base_ref = %cli.base_ref, head_ref = %cli.head_ref, "detecting changed scanners");
    let fallback = parse_fallback_scanners(&cli.fallback_scanners);
    let scanners = get_scanners_to_test(&cli.registry_path, &cli.base_ref, &cli.head_ref, &fallback)
        .await
        .context("failed to detect changed scanners")?;

    if scanners.is_empty() {
        info!("no changed scanners detected");
        return Ok(TestReport::empty());
    }
    info!(scanners = %scanners.join(", "), "changed scanners");

    let definitions = load_test_definitions(&cli.registry_path, &scanners)
        .await
        .context("failed to load test definitions")?;

    if definitions.is_empty() {
        info!("no test definitions found for changed scanners");
        return Ok(TestReport::empty());
    }

    info!(scanners = definitions.len(), provider = provider.key(), "running tests");
    let settings = PollSettings::from_secs(cli.timeout, cli.poll_interval);
    let results = provider
        .run_tests(&definitions, &cli.registry_repo, &cli.registry_ref, settings)
        .await;
    drop(provider);

    log_results_summary(&results);
    Ok(TestReport::from_results(&results))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json_logs, level);

    let report = match run(&cli).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %format!("{e:#}"), "scan-test failed");
            eprintln!("Error: {e:#}");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match report.to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: failed to serialize report: {e}");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    info!(
        total = report.total,
        passed = report.passed,
        failed = report.failed,
        errors = report.errors,
        timeouts = report.timeouts,
        "done"
    );
    ExitCode::from(report.exit_code() as u8)
}
