//! Live gateway backed by the Azure DevOps pipelines API

use async_trait::async_trait;
use piperun_client::{ApprovalUpdate, DevOpsClient, PipelineApproval, RunPipelineRequest};
use piperun_core::domain::definition::{ParameterSet, RunDefinition};
use piperun_core::domain::run::{Approval, RunHandle, RunResult, RunState, RunStatus};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::RunGateway;
use crate::error::{PipelineError, Result};

const APPROVAL_COMMENT: &str = "Approved automatically by piperun";

/// Gateway that talks to the remote service for one run definition
pub struct DevOpsGateway {
    client: DevOpsClient,
    definition: RunDefinition,
}

impl DevOpsGateway {
    pub fn new(client: DevOpsClient, definition: RunDefinition) -> Self {
        Self { client, definition }
    }
}

#[async_trait]
impl RunGateway for DevOpsGateway {
    async fn trigger_pipeline(&self, parameters: &ParameterSet) -> Result<RunHandle> {
        info!(
            "Triggering pipeline {} with parameters:\n{}",
            self.definition.pipeline_name,
            serde_json::to_string_pretty(&parameters.parameters).unwrap_or_default()
        );

        let request = RunPipelineRequest::new(&self.definition.branch, parameters.parameters.clone());
        let run = self
            .client
            .run_pipeline(&self.definition.project, &self.definition.definition_id, &request)
            .await?;

        debug!("Run {} created with state {:?}", run.id, run.state);

        Ok(RunHandle {
            id: run.id,
            status: RunStatus::new(RunState::parse(run.state.as_deref()), RunResult::Unknown),
        })
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus> {
        let run = match self
            .client
            .get_run(&self.definition.project, &self.definition.definition_id, run_id)
            .await
        {
            Ok(run) => run,
            Err(e) if e.is_not_found() => {
                warn!(
                    "Run {} of '{}' was not found on the remote service",
                    run_id, self.definition.name
                );
                return Ok(RunStatus::unknown());
            }
            Err(e) => return Err(e.into()),
        };

        let status = RunStatus::new(
            RunState::parse(run.state.as_deref()),
            RunResult::parse(run.result.as_deref()),
        );
        debug!("Run {} status: {}", run_id, status);

        Ok(status)
    }

    async fn get_approval_status(&self, run_id: &str) -> Result<Option<Approval>> {
        let approvals = self.client.list_approvals(&self.definition.project).await?;

        let selected = select_approval(approvals, &self.definition.definition_id, run_id);

        Ok(selected.map(|approval| Approval {
            id: approval.id.to_string(),
            run_id: run_id.to_string(),
            status: approval.status,
        }))
    }

    async fn approve_run(&self, run_id: &str, approval_id: &str) -> Result<()> {
        let approval_id = Uuid::parse_str(approval_id).map_err(|e| {
            PipelineError::InvalidRequest(format!("invalid approval id '{}': {}", approval_id, e))
        })?;

        let update = ApprovalUpdate::approve(approval_id, APPROVAL_COMMENT);
        match self
            .client
            .update_approvals(&self.definition.project, &[update])
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(
                    "Approval {} for run {} no longer exists, treating as resolved",
                    approval_id, run_id
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Picks the pending approval of a run, else its most recent one
fn select_approval(
    approvals: Vec<PipelineApproval>,
    definition_id: &str,
    run_id: &str,
) -> Option<PipelineApproval> {
    let scoped: Vec<PipelineApproval> = approvals
        .into_iter()
        .filter(|approval| approval.belongs_to(definition_id, run_id))
        .collect();

    if let Some(pending) = scoped
        .iter()
        .find(|approval| approval.status.eq_ignore_ascii_case("pending"))
    {
        return Some(pending.clone());
    }

    scoped.into_iter().max_by_key(|approval| approval.created_on)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approval(id: u128, run_id: &str, status: &str, created_on: &str) -> PipelineApproval {
        serde_json::from_value(json!({
            "id": Uuid::from_u128(id).to_string(),
            "status": status,
            "createdOn": created_on,
            "pipeline": { "id": "42", "owner": { "id": run_id } }
        }))
        .unwrap()
    }

    #[test]
    fn test_select_prefers_pending() {
        let approvals = vec![
            approval(1, "100", "approved", "2026-01-01T10:00:00Z"),
            approval(2, "100", "pending", "2026-01-01T09:00:00Z"),
        ];
        let selected = select_approval(approvals, "42", "100").unwrap();
        assert_eq!(selected.id, Uuid::from_u128(2));
    }

    #[test]
    fn test_select_most_recent_when_none_pending() {
        let approvals = vec![
            approval(1, "100", "approved", "2026-01-01T08:00:00Z"),
            approval(2, "100", "rejected", "2026-01-01T09:00:00Z"),
            approval(3, "200", "pending", "2026-01-01T11:00:00Z"),
        ];
        let selected = select_approval(approvals, "42", "100").unwrap();
        assert_eq!(selected.id, Uuid::from_u128(2));
    }

    #[test]
    fn test_select_none_for_other_runs() {
        let approvals = vec![approval(1, "200", "pending", "2026-01-01T08:00:00Z")];
        assert!(select_approval(approvals, "42", "100").is_none());
        assert!(select_approval(Vec::new(), "42", "100").is_none());
    }
}
