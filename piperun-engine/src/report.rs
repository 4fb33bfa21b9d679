//! Batch reports
//!
//! Observational summaries of what happened to each run. They never change
//! whether the batch as a whole is considered started.

use chrono::{DateTime, Utc};
use piperun_core::domain::options::{ExecutionMode, ExecutionOptions};
use serde::Serialize;

use crate::execution::RunOutcome;

/// Result of one approval-handling pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalSummary {
    /// Executions whose approval state was checked
    pub probed: usize,
    /// Checks that failed and were treated as "no approval needed"
    pub probe_errors: usize,
    pub needing_approval: usize,
    pub approved: usize,
    pub approval_failures: usize,
    /// Left for a human because auto-approve is off
    pub manual: usize,
}

impl ApprovalSummary {
    pub fn merge(&mut self, other: &ApprovalSummary) {
        self.probed += other.probed;
        self.probe_errors += other.probe_errors;
        self.needing_approval += other.needing_approval;
        self.approved += other.approved;
        self.approval_failures += other.approval_failures;
        self.manual += other.manual;
    }
}

/// Result of one monitoring pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorReport {
    /// Distinct executions monitored
    pub total: usize,
    /// Size of the active set after each tick
    pub active_after_tick: Vec<usize>,
    pub succeeded: usize,
    /// Failed or abnormal outcomes, plus lost runs
    pub failed: usize,
    /// Runs given up on because their status could not be read
    pub lost: usize,
}

/// What happened to one run definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionReport {
    pub name: String,
    pub mode: ExecutionMode,
    /// Parameter sets in the definition
    pub requested: usize,
    pub triggered: usize,
    pub trigger_failures: usize,
    pub approvals: ApprovalSummary,
    pub succeeded: usize,
    /// Failed or abnormal terminal outcomes, plus runs whose wait errored
    pub failed: usize,
    /// Triggered but not waited for
    pub not_awaited: usize,
    pub run_ids: Vec<String>,
    pub monitor: Option<MonitorReport>,
}

impl DefinitionReport {
    pub fn new(name: impl Into<String>, mode: ExecutionMode, requested: usize) -> Self {
        Self {
            name: name.into(),
            mode,
            requested,
            triggered: 0,
            trigger_failures: 0,
            approvals: ApprovalSummary::default(),
            succeeded: 0,
            failed: 0,
            not_awaited: 0,
            run_ids: Vec::new(),
            monitor: None,
        }
    }

    pub fn record_outcome(&mut self, outcome: RunOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Every triggered run was awaited and succeeded, and none failed to trigger
    pub fn all_succeeded(&self) -> bool {
        self.trigger_failures == 0 && self.failed == 0 && self.succeeded == self.requested
    }
}

/// What happened to a whole batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub mode: ExecutionMode,
    pub options: ExecutionOptions,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub definitions: Vec<DefinitionReport>,
}

impl BatchReport {
    pub fn new(mode: ExecutionMode, options: ExecutionOptions) -> Self {
        Self {
            mode,
            options,
            started_at: Utc::now(),
            finished_at: None,
            definitions: Vec::new(),
        }
    }

    pub fn triggered(&self) -> usize {
        self.definitions.iter().map(|d| d.triggered).sum()
    }

    pub fn trigger_failures(&self) -> usize {
        self.definitions.iter().map(|d| d.trigger_failures).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.definitions.iter().map(|d| d.succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.definitions.iter().map(|d| d.failed).sum()
    }

    pub fn not_awaited(&self) -> usize {
        self.definitions.iter().map(|d| d.not_awaited).sum()
    }

    pub fn approvals(&self) -> ApprovalSummary {
        let mut total = ApprovalSummary::default();
        for definition in &self.definitions {
            total.merge(&definition.approvals);
        }
        total
    }
}
