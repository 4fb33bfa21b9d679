//! Approval endpoints

use crate::DevOpsClient;
use crate::error::Result;
use crate::models::{ApprovalList, ApprovalUpdate, PipelineApproval};

impl DevOpsClient {
    // =============================================================================
    // Approvals
    // =============================================================================

    /// List the approvals of a project, steps expanded
    pub async fn list_approvals(&self, project: &str) -> Result<Vec<PipelineApproval>> {
        let url = self.project_url(project, "pipelines/approvals");
        let response = self
            .authorize(self.client.get(&url))
            .query(&[("$expand", "steps")])
            .send()
            .await?;

        let list: ApprovalList = self.handle_response(response).await?;
        Ok(list.value)
    }

    /// Update one or more approvals in a single request
    pub async fn update_approvals(&self, project: &str, updates: &[ApprovalUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let url = self.project_url(project, "pipelines/approvals");
        let response = self
            .authorize(self.client.patch(&url))
            .json(updates)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
