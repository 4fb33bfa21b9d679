//! Gateway doubles shared by the scenario tests

#![allow(dead_code)]

use async_trait::async_trait;
use piperun_core::domain::definition::{ParameterSet, RunDefinition};
use piperun_core::domain::run::{Approval, RunHandle, RunResult, RunState, RunStatus};
use piperun_engine::error::{PipelineError, Result};
use piperun_engine::gateway::{DryRunGateway, GatewayFactory, RunGateway};
use piperun_engine::EngineConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One call made to a gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Trigger,
    Status(String),
    Approval(String),
    Approve(String),
}

/// Dry-run gateway that records every call and can fail one trigger
pub struct RecordingGateway {
    inner: DryRunGateway,
    calls: Mutex<Vec<Call>>,
    triggers: AtomicUsize,
    fail_trigger_on: Option<usize>,
    approval_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingGateway {
    pub fn new(definition: &RunDefinition) -> Self {
        Self {
            inner: DryRunGateway::new(definition.clone()),
            calls: Mutex::new(Vec::new()),
            triggers: AtomicUsize::new(0),
            fail_trigger_on: None,
            approval_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Makes the `nth` trigger (1-based) fail with a server error
    pub fn failing_trigger(mut self, nth: usize) -> Self {
        self.fail_trigger_on = Some(nth);
        self
    }

    /// Makes every approval lookup take `delay`
    pub fn with_approval_delay(mut self, delay: Duration) -> Self {
        self.approval_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    pub fn max_concurrent_approval_lookups(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RunGateway for RecordingGateway {
    async fn trigger_pipeline(&self, parameters: &ParameterSet) -> Result<RunHandle> {
        self.record(Call::Trigger);
        let nth = self.triggers.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_trigger_on == Some(nth) {
            return Err(PipelineError::RemoteApi {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        self.inner.trigger_pipeline(parameters).await
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus> {
        self.record(Call::Status(run_id.to_string()));
        self.inner.get_run_status(run_id).await
    }

    async fn get_approval_status(&self, run_id: &str) -> Result<Option<Approval>> {
        self.record(Call::Approval(run_id.to_string()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.approval_delay.is_zero() {
            tokio::time::sleep(self.approval_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.inner.get_approval_status(run_id).await
    }

    async fn approve_run(&self, run_id: &str, approval_id: &str) -> Result<()> {
        self.record(Call::Approve(run_id.to_string()));
        self.inner.approve_run(run_id, approval_id).await
    }
}

/// Runs that stay in progress forever and never ask for approval
#[derive(Default)]
pub struct StalledGateway {
    next_id: AtomicUsize,
}

#[async_trait]
impl RunGateway for StalledGateway {
    async fn trigger_pipeline(&self, _parameters: &ParameterSet) -> Result<RunHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(RunHandle {
            id: format!("stalled-{}", id),
            status: RunStatus::in_progress(),
        })
    }

    async fn get_run_status(&self, _run_id: &str) -> Result<RunStatus> {
        Ok(RunStatus::in_progress())
    }

    async fn get_approval_status(&self, _run_id: &str) -> Result<Option<Approval>> {
        Ok(None)
    }

    async fn approve_run(&self, _run_id: &str, _approval_id: &str) -> Result<()> {
        Ok(())
    }
}

/// A remote API error with `status`
pub fn api_error(status: u16) -> PipelineError {
    PipelineError::RemoteApi {
        status,
        body: format!("status {}", status),
    }
}

pub fn completed(result: RunResult) -> RunStatus {
    RunStatus::new(RunState::Completed, result)
}

/// Gateway answering status queries from a per-run script
///
/// Runs are named `run-0`, `run-1`, ... in trigger order. Every run has a
/// pending approval. Once a run's script is used up, its status settles on
/// the fallback status.
pub struct ScriptedGateway {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    scripts: Mutex<HashMap<String, VecDeque<Result<RunStatus>>>>,
    settled: RunStatus,
    failing_lookup: Option<String>,
    approve_failure: Option<u16>,
}

impl ScriptedGateway {
    /// Runs complete with `settled` unless scripted otherwise
    pub fn new(settled: RunStatus) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
            scripts: Mutex::new(HashMap::new()),
            settled,
            failing_lookup: None,
            approve_failure: None,
        }
    }

    pub fn succeeding() -> Self {
        Self::new(completed(RunResult::Succeeded))
    }

    /// Answers for the next status queries of `run_id`, in order
    pub fn script(self, run_id: &str, answers: Vec<Result<RunStatus>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(run_id.to_string(), answers.into());
        self
    }

    /// Approval lookups of `run_id` fail with a server error
    pub fn failing_approval_lookup(mut self, run_id: &str) -> Self {
        self.failing_lookup = Some(run_id.to_string());
        self
    }

    /// Every approval is refused with `status`
    pub fn failing_approvals(mut self, status: u16) -> Self {
        self.approve_failure = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RunGateway for ScriptedGateway {
    async fn trigger_pipeline(&self, _parameters: &ParameterSet) -> Result<RunHandle> {
        self.record(Call::Trigger);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(RunHandle {
            id: format!("run-{}", id),
            status: RunStatus::in_progress(),
        })
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus> {
        self.record(Call::Status(run_id.to_string()));
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(run_id)
            .and_then(|answers| answers.pop_front());
        next.unwrap_or(Ok(self.settled))
    }

    async fn get_approval_status(&self, run_id: &str) -> Result<Option<Approval>> {
        self.record(Call::Approval(run_id.to_string()));
        if self.failing_lookup.as_deref() == Some(run_id) {
            return Err(api_error(500));
        }
        Ok(Some(Approval {
            id: format!("approval-{}", run_id),
            run_id: run_id.to_string(),
            status: "pending".to_string(),
        }))
    }

    async fn approve_run(&self, run_id: &str, _approval_id: &str) -> Result<()> {
        self.record(Call::Approve(run_id.to_string()));
        match self.approve_failure {
            Some(status) => Err(api_error(status)),
            None => Ok(()),
        }
    }
}

/// Hands out the same gateway for every definition and counts creations
pub struct SharedFactory {
    gateway: Arc<RecordingGateway>,
    created: AtomicUsize,
}

impl SharedFactory {
    pub fn new(gateway: Arc<RecordingGateway>) -> Self {
        Self {
            gateway,
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl GatewayFactory for SharedFactory {
    fn create(&self, _definition: &RunDefinition, _dry_run: bool) -> Result<Arc<dyn RunGateway>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.gateway.clone())
    }
}

/// Millisecond intervals so scenarios finish quickly
pub fn fast_config() -> EngineConfig {
    EngineConfig::new()
        .with_poll_interval(Duration::from_millis(1))
        .with_approval_window(Duration::from_millis(200), Duration::from_millis(50))
}

/// A definition with `runs` parameter sets
pub fn definition(name: &str, runs: usize) -> RunDefinition {
    let mut definition = RunDefinition::new(name, "platform", "42", "deploy").with_branch("release");
    for i in 0..runs {
        definition = definition.with_run(ParameterSet::from_pairs([
            ("index", serde_json::json!(i)),
            ("environment", serde_json::json!("qa")),
        ]));
    }
    definition
}
