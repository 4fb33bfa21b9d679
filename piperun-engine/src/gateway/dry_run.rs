//! Dry-run gateway
//!
//! Simulates the remote service locally so batch semantics can be exercised
//! without network access. Every triggered run:
//! - starts `InProgress` with a sequential synthetic id
//! - reports `Completed/Succeeded` on every status query
//! - has one pending approval, which approving does nothing to

use async_trait::async_trait;
use piperun_core::domain::definition::{ParameterSet, RunDefinition};
use piperun_core::domain::run::{
    APPROVAL_PENDING, Approval, RunHandle, RunResult, RunState, RunStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

use super::RunGateway;
use crate::error::Result;

/// First synthetic run id handed out
pub const FIRST_DRY_RUN_ID: u64 = 10_000;

/// Deterministic stand-in for the remote service
pub struct DryRunGateway {
    definition: RunDefinition,
    next_id: AtomicU64,
}

impl DryRunGateway {
    pub fn new(definition: RunDefinition) -> Self {
        Self {
            definition,
            next_id: AtomicU64::new(FIRST_DRY_RUN_ID),
        }
    }

    /// Synthetic approval id derived from the run id
    fn approval_id(run_id: &str) -> String {
        Uuid::from_u128(run_id.parse::<u128>().unwrap_or_default()).to_string()
    }
}

#[async_trait]
impl RunGateway for DryRunGateway {
    async fn trigger_pipeline(&self, parameters: &ParameterSet) -> Result<RunHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();

        info!(
            "[DRY RUN] Would trigger pipeline '{}' on branch '{}' with params {:?} -> run_id={}",
            self.definition.pipeline_name, self.definition.branch, parameters.parameters, id
        );

        Ok(RunHandle {
            id,
            status: RunStatus::in_progress(),
        })
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus> {
        debug!("[DRY RUN] Simulating completion of run {}", run_id);
        Ok(RunStatus::new(RunState::Completed, RunResult::Succeeded))
    }

    async fn get_approval_status(&self, run_id: &str) -> Result<Option<Approval>> {
        debug!("[DRY RUN] Simulating a pending approval for run {}", run_id);
        Ok(Some(Approval {
            id: Self::approval_id(run_id),
            run_id: run_id.to_string(),
            status: APPROVAL_PENDING.to_string(),
        }))
    }

    async fn approve_run(&self, run_id: &str, approval_id: &str) -> Result<()> {
        info!(
            "[DRY RUN] Would approve {} for run {} of '{}'",
            approval_id, run_id, self.definition.name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> DryRunGateway {
        DryRunGateway::new(RunDefinition::new("nightly", "platform", "12", "build"))
    }

    #[tokio::test]
    async fn test_trigger_then_status() {
        let gateway = gateway();
        let handle = gateway
            .trigger_pipeline(&ParameterSet::default())
            .await
            .unwrap();

        assert_eq!(handle.id, "10000");
        assert_eq!(handle.status.state, RunState::InProgress);

        let status = gateway.get_run_status(&handle.id).await.unwrap();
        assert_eq!(status.state, RunState::Completed);
        assert_eq!(status.result, RunResult::Succeeded);
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let gateway = gateway();
        let first = gateway.trigger_pipeline(&ParameterSet::default()).await.unwrap();
        let second = gateway.trigger_pipeline(&ParameterSet::default()).await.unwrap();
        assert_eq!(first.id, "10000");
        assert_eq!(second.id, "10001");
    }

    #[tokio::test]
    async fn test_always_pending_approval() {
        let gateway = gateway();
        let approval = gateway.get_approval_status("10000").await.unwrap().unwrap();
        assert!(approval.is_pending());
        assert_eq!(approval.run_id, "10000");
        assert_eq!(approval.id, Uuid::from_u128(10000).to_string());
        assert!(gateway.approve_run("10000", &approval.id).await.is_ok());
    }
}
