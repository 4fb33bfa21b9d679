//! Pipeline execution
//!
//! Local handle tracking the lifecycle of one triggered remote run:
//!
//! `NotStarted -> Running -> NeedsApprovalCheck -> Running -> Finished(outcome)`
//!
//! An execution owns exactly one gateway handle and may be started once.
//! Every other operation requires a started execution. Failed or abnormal
//! runs are logged and recorded as outcomes, never raised.

use piperun_core::domain::definition::{ParameterSet, RunDefinition};
use piperun_core::domain::run::{RunHandle, RunResult, RunState, RunStatus};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{PipelineError, Result};
use crate::gateway::RunGateway;

/// Terminal outcome of a remote run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    /// Completed with a result other than `Succeeded`
    Failed(RunResult),
    /// Stopped in a state other than `Completed` (e.g. stuck canceling, deleted)
    Abnormal(RunState),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

/// Lifecycle state of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    NotStarted,
    Running,
    NeedsApprovalCheck,
    Finished(RunOutcome),
}

/// Which exit the approval check took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalProbe {
    /// A pending approval was found
    Pending,
    /// The run completed, nothing to approve
    Completed,
    /// Still in progress past the grace period with no pending approval
    NotRequired,
    /// The whole window elapsed, assumed not required
    TimedOut,
}

/// One triggered (or yet to be triggered) run of a definition
pub struct PipelineExecution {
    definition_name: String,
    pipeline_name: String,
    parameters: ParameterSet,
    gateway: Arc<dyn RunGateway>,
    config: EngineConfig,
    handle: Option<RunHandle>,
    state: Mutex<ExecutionState>,
}

impl PipelineExecution {
    /// Creates an execution for one parameter set of a definition
    pub fn new(
        definition: &RunDefinition,
        parameters: ParameterSet,
        gateway: Arc<dyn RunGateway>,
        config: EngineConfig,
    ) -> Self {
        Self {
            definition_name: definition.name.clone(),
            pipeline_name: definition.pipeline_name.clone(),
            parameters,
            gateway,
            config,
            handle: None,
            state: Mutex::new(ExecutionState::NotStarted),
        }
    }

    /// Remote run id, once started
    pub fn run_id(&self) -> Option<&str> {
        self.handle.as_ref().map(|h| h.id.as_str())
    }

    pub fn handle(&self) -> Option<&RunHandle> {
        self.handle.as_ref()
    }

    pub fn definition_name(&self) -> &str {
        &self.definition_name
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn state(&self) -> ExecutionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Outcome of a finished execution
    pub fn outcome(&self) -> Option<RunOutcome> {
        match self.state() {
            ExecutionState::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    fn set_state(&self, next: ExecutionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    fn require_started(&self, action: &'static str) -> Result<&RunHandle> {
        self.handle
            .as_ref()
            .ok_or(PipelineError::NotStarted { action })
    }

    // =============================================================================
    // Lifecycle
    // =============================================================================

    /// Triggers the remote run
    ///
    /// Fails with `AlreadyRunning`, without calling the gateway, if the
    /// execution was already started.
    pub async fn start(&mut self) -> Result<&RunHandle> {
        if let Some(handle) = &self.handle {
            return Err(PipelineError::AlreadyRunning {
                run_id: handle.id.clone(),
            });
        }

        let handle = self.gateway.trigger_pipeline(&self.parameters).await?;
        info!(
            "Started run {} for pipeline \"{}\" ('{}')",
            handle.id, self.pipeline_name, self.definition_name
        );

        self.set_state(ExecutionState::Running);
        let handle: &RunHandle = self.handle.insert(handle);
        Ok(handle)
    }

    /// Single status query
    pub async fn current_status(&self) -> Result<RunStatus> {
        let handle = self.require_started("checking its status")?;
        self.gateway.get_run_status(&handle.id).await
    }

    /// Whether the run is waiting on a pending approval
    ///
    /// Uses the configured approval window; see [`Self::probe_approval`].
    pub async fn needs_approval(&self) -> Result<bool> {
        let probe = self.probe_approval(self.config.approval_timeout).await?;
        Ok(probe == ApprovalProbe::Pending)
    }

    /// Polls for a pending approval until one appears, the run completes, the
    /// grace period passes with the run in progress, or `timeout` elapses
    ///
    /// Approvals take a while to show up on the remote service after a run
    /// is queued, hence the bounded retry.
    pub async fn probe_approval(&self, timeout: Duration) -> Result<ApprovalProbe> {
        let run_id = self.require_started("checking for approvals")?.id.clone();

        self.set_state(ExecutionState::NeedsApprovalCheck);
        let probe = self.poll_approval(&run_id, timeout).await;
        if self.state() == ExecutionState::NeedsApprovalCheck {
            self.set_state(ExecutionState::Running);
        }

        probe
    }

    async fn poll_approval(&self, run_id: &str, timeout: Duration) -> Result<ApprovalProbe> {
        let started = Instant::now();

        while started.elapsed() < timeout {
            debug!("Checking for approval in run {}...", run_id);
            let approval = self.gateway.get_approval_status(run_id).await?;
            if approval.as_ref().is_some_and(|a| a.is_pending()) {
                info!("Run {} of '{}' needs approval", run_id, self.definition_name);
                return Ok(ApprovalProbe::Pending);
            }

            let status = self.gateway.get_run_status(run_id).await?;
            if status.is_completed() {
                info!("Run {} already completed, no approval needed", run_id);
                return Ok(ApprovalProbe::Completed);
            }

            if status.is_running() && started.elapsed() > self.config.approval_grace {
                info!("Run {} does not need approval", run_id);
                return Ok(ApprovalProbe::NotRequired);
            }

            sleep(self.config.approval_interval).await;
        }

        warn!(
            "Timeout checking approval for run {} of '{}', assuming no approval needed",
            run_id, self.definition_name
        );
        Ok(ApprovalProbe::TimedOut)
    }

    /// Approves the run's pending approval
    ///
    /// Succeeds trivially when there is nothing pending. Returns `false`
    /// instead of an error when the remote service refuses or fails.
    pub async fn approve(&self) -> Result<bool> {
        let run_id = self.require_started("approving it")?.id.clone();

        let approval = match self.gateway.get_approval_status(&run_id).await {
            Ok(approval) => approval,
            Err(e) if e.is_remote() => {
                error!("Could not read approval of run {}: {}", run_id, e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let Some(approval) = approval else {
            info!("There is no need to approve the run {}", run_id);
            return Ok(true);
        };

        if !approval.is_pending() {
            debug!(
                "Approval for run {} is not pending (status: {})",
                run_id, approval.status
            );
            return Ok(true);
        }

        match self.gateway.approve_run(&run_id, &approval.id).await {
            Ok(()) => {
                info!("Run {} of '{}' was successfully approved", run_id, self.definition_name);
                Ok(true)
            }
            Err(e) if e.is_remote() => {
                error!("Failed to approve run {} of '{}': {}", run_id, self.definition_name, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Blocks until the run leaves `InProgress`, polling at the status interval
    ///
    /// Transient status errors are retried up to `max_status_errors` in a
    /// row. Any other error, or one transient error too many, is returned
    /// while the run may still be going on the remote service.
    pub async fn wait_until_complete(&self) -> Result<RunOutcome> {
        let run_id = self.require_started("waiting for it to complete")?.id.clone();
        info!("Waiting for run {} to complete...", run_id);

        let max_errors = self.config.max_status_errors;
        let mut consecutive_errors = 0;
        loop {
            sleep(self.config.status_interval).await;

            let status = match self.gateway.get_run_status(&run_id).await {
                Ok(status) => status,
                Err(e) if e.is_transient() && consecutive_errors + 1 < max_errors => {
                    consecutive_errors += 1;
                    warn!(
                        "Failed to get status of run {} ({}/{}), retrying: {}",
                        run_id, consecutive_errors, max_errors, e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            consecutive_errors = 0;
            debug!("Current status of run {}: {}", run_id, status);

            if status.is_running() {
                continue;
            }

            return Ok(self.finish(&run_id, status));
        }
    }

    /// Non-blocking variant of [`Self::wait_until_complete`]
    pub async fn is_finished(&self) -> Result<bool> {
        let run_id = self.require_started("checking if it finished")?.id.clone();

        if self.outcome().is_some() {
            return Ok(true);
        }

        let status = self.gateway.get_run_status(&run_id).await?;
        if status.is_running() {
            return Ok(false);
        }

        self.finish(&run_id, status);
        Ok(true)
    }

    /// Records and logs the terminal outcome
    fn finish(&self, run_id: &str, status: RunStatus) -> RunOutcome {
        let outcome = if !status.is_completed() {
            error!(
                "Run {} on pipeline {} ('{}') ended abnormally with state = {}",
                run_id, self.pipeline_name, self.definition_name, status.state
            );
            RunOutcome::Abnormal(status.state)
        } else if !status.is_successful() {
            error!(
                "Run {} on pipeline {} ('{}') failed with result = {}",
                run_id, self.pipeline_name, self.definition_name, status.result
            );
            RunOutcome::Failed(status.result)
        } else {
            info!(
                "Run {} on pipeline {} ('{}') completed successfully!",
                run_id, self.pipeline_name, self.definition_name
            );
            RunOutcome::Succeeded
        };

        self.set_state(ExecutionState::Finished(outcome));
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::DryRunGateway;

    fn config() -> EngineConfig {
        EngineConfig::new()
            .with_poll_interval(Duration::from_millis(1))
            .with_approval_window(Duration::from_millis(50), Duration::from_millis(20))
    }

    fn execution() -> PipelineExecution {
        let definition = RunDefinition::new("nightly", "platform", "12", "build");
        let gateway = Arc::new(DryRunGateway::new(definition.clone()));
        PipelineExecution::new(&definition, ParameterSet::default(), gateway, config())
    }

    #[tokio::test]
    async fn test_lifecycle_with_dry_run() {
        let mut execution = execution();
        assert_eq!(execution.state(), ExecutionState::NotStarted);

        execution.start().await.unwrap();
        assert_eq!(execution.state(), ExecutionState::Running);
        assert_eq!(execution.run_id(), Some("10000"));

        assert!(execution.needs_approval().await.unwrap());
        assert_eq!(execution.state(), ExecutionState::Running);
        assert!(execution.approve().await.unwrap());

        let outcome = execution.wait_until_complete().await.unwrap();
        assert_eq!(outcome, RunOutcome::Succeeded);
        assert_eq!(
            execution.state(),
            ExecutionState::Finished(RunOutcome::Succeeded)
        );
    }

    #[tokio::test]
    async fn test_operations_before_start_fail() {
        let execution = execution();

        assert!(matches!(
            execution.wait_until_complete().await,
            Err(PipelineError::NotStarted { .. })
        ));
        assert!(matches!(
            execution.is_finished().await,
            Err(PipelineError::NotStarted { .. })
        ));
        assert!(matches!(
            execution.needs_approval().await,
            Err(PipelineError::NotStarted { .. })
        ));
        assert!(matches!(
            execution.approve().await,
            Err(PipelineError::NotStarted { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut execution = execution();
        execution.start().await.unwrap();

        let err = execution.start().await.unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyRunning { run_id } if run_id == "10000"));
    }

    #[tokio::test]
    async fn test_is_finished_records_outcome() {
        let mut execution = execution();
        execution.start().await.unwrap();

        assert!(execution.is_finished().await.unwrap());
        assert_eq!(execution.outcome(), Some(RunOutcome::Succeeded));
        assert!(execution.is_finished().await.unwrap());
    }
}
