//! Remote run domain types
//!
//! These mirror what the remote build service reports about a triggered run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Approval status reported by the remote service while a gate is open
pub const APPROVAL_PENDING: &str = "pending";

/// Lifecycle state of a remote run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    InProgress,
    Completed,
    Canceling,
    Unknown,
}

/// Final result of a remote run; `Unknown` until the run completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunResult {
    Succeeded,
    Failed,
    Canceled,
    Unknown,
}

impl RunState {
    /// Parses the service's state string, case-insensitively
    ///
    /// Missing or unrecognized values map to `Unknown` (e.g. a deleted run).
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("inprogress") => RunState::InProgress,
            Some("completed") => RunState::Completed,
            Some("canceling") => RunState::Canceling,
            _ => RunState::Unknown,
        }
    }
}

impl RunResult {
    /// Parses the service's result string, case-insensitively
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("succeeded") => RunResult::Succeeded,
            Some("failed") => RunResult::Failed,
            Some("canceled") => RunResult::Canceled,
            _ => RunResult::Unknown,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::InProgress => "inProgress",
            RunState::Completed => "completed",
            RunState::Canceling => "canceling",
            RunState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunResult::Succeeded => "succeeded",
            RunResult::Failed => "failed",
            RunResult::Canceled => "canceled",
            RunResult::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// State plus result of a remote run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    pub result: RunResult,
}

impl RunStatus {
    pub fn new(state: RunState, result: RunResult) -> Self {
        Self { state, result }
    }

    /// Status of a run that has just been queued
    pub fn in_progress() -> Self {
        Self::new(RunState::InProgress, RunResult::Unknown)
    }

    /// Status reported for a run the service no longer knows about
    pub fn unknown() -> Self {
        Self::new(RunState::Unknown, RunResult::Unknown)
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::InProgress
    }

    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn is_successful(&self) -> bool {
        self.result == RunResult::Succeeded
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state={}, result={}", self.state, self.result)
    }
}

/// Remote identifier of a triggered run and the status it was created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    pub id: String,
    pub status: RunStatus,
}

/// A manual gate imposed by the remote service on a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub id: String,
    pub run_id: String,
    /// Free-form status string from the service (e.g. "pending", "approved")
    pub status: String,
}

impl Approval {
    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case(APPROVAL_PENDING)
    }
}
