//! In-memory provider for exercising the orchestrator (testing only)
//!
//! `ScriptedProvider` answers dispatch and poll calls from a per-scanner
//! script instead of a CI backend, and records every call it receives.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{TestDefinition, TestResult, TestStatus};
use crate::error::{Result, ScanTestError};
use crate::provider::{PipelineProvider, PollOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    Status(TestStatus),
    NeverFinishes,
    PollFails(u16),
    DispatchFails(u16),
}

/// How one scanner's pipeline behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollScript {
    pending_polls: usize,
    terminal: Terminal,
}

impl PollScript {
    /// Report `pending_polls` pending checks, then a terminal `status`.
    pub fn pending_then(pending_polls: usize, status: TestStatus) -> Self {
        Self {
            pending_polls,
            terminal: Terminal::Status(status),
        }
    }

    pub fn never_finishes() -> Self {
        Self {
            pending_polls: 0,
            terminal: Terminal::NeverFinishes,
        }
    }

    /// First poll fails with an API error carrying `status`.
    pub fn poll_fails(status: u16) -> Self {
        Self {
            pending_polls: 0,
            terminal: Terminal::PollFails(status),
        }
    }

    /// Dispatch is rejected with `status`.
    pub fn dispatch_fails(status: u16) -> Self {
        Self {
            pending_polls: 0,
            terminal: Terminal::DispatchFails(status),
        }
    }
}

/// Provider driven by [`PollScript`]s, keyed by scanner id.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, PollScript>,
    dispatched: Mutex<Vec<String>>,
    polls: Mutex<HashMap<String, usize>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scanner(mut self, scanner_id: &str, script: PollScript) -> Self {
        self.scripts.insert(scanner_id.to_string(), script);
        self
    }

    /// Scanner ids in the order they were dispatched.
    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn poll_count(&self, scanner_id: &str) -> usize {
        self.polls
            .lock()
            .unwrap()
            .get(scanner_id)
            .copied()
            .unwrap_or(0)
    }

    /// Total dispatch and poll calls received.
    pub fn call_count(&self) -> usize {
        self.dispatched.lock().unwrap().len() + self.polls.lock().unwrap().values().sum::<usize>()
    }
}

#[async_trait]
impl PipelineProvider for ScriptedProvider {
    type DispatchState = String;

    fn key(&self) -> &'static str {
        "scripted"
    }

    async fn dispatch_scanner_tests(
        &self,
        scanner_id: &str,
        _test_definition: &TestDefinition,
        _registry_ref: &str,
        _registry_repo: &str,
    ) -> Result<String> {
        self.dispatched.lock().unwrap().push(scanner_id.to_string());

        match self.scripts.get(scanner_id) {
            Some(PollScript {
                terminal: Terminal::DispatchFails(status),
                ..
            }) => Err(ScanTestError::Dispatch {
                action: "dispatch scripted pipeline".to_string(),
                status: *status,
                body: format!("rejected {scanner_id}"),
            }),
            Some(_) => Ok(scanner_id.to_string()),
            None => Err(ScanTestError::Dispatch {
                action: "dispatch scripted pipeline".to_string(),
                status: 404,
                body: format!("no script for {scanner_id}"),
            }),
        }
    }

    async fn poll_status(&self, dispatch_state: &String) -> Result<PollOutcome> {
        let seen = {
            let mut polls = self.polls.lock().unwrap();
            let count = polls.entry(dispatch_state.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let script = self
            .scripts
            .get(dispatch_state)
            .copied()
            .unwrap_or_else(PollScript::never_finishes);

        match script.terminal {
            Terminal::PollFails(status) => Err(ScanTestError::Api {
                action: "get scripted pipeline".to_string(),
                status,
                body: format!("poll rejected for {dispatch_state}"),
            }),
            Terminal::NeverFinishes | Terminal::DispatchFails(_) => Ok(PollOutcome::Pending),
            Terminal::Status(_) if seen <= script.pending_polls => Ok(PollOutcome::Pending),
            Terminal::Status(status) => Ok(PollOutcome::Complete(vec![TestResult::completed(
                status,
                seen as f64,
                format!("https://ci.example/{dispatch_state}"),
            )])),
        }
    }
}
