//! Pipeline run endpoints

use crate::DevOpsClient;
use crate::error::Result;
use crate::models::{PipelineRun, RunPipelineRequest};

impl DevOpsClient {
    // =============================================================================
    // Runs
    // =============================================================================

    /// Queue a new run of a pipeline
    ///
    /// # Arguments
    /// * `project` - Project name or id
    /// * `definition_id` - Pipeline definition id
    /// * `request` - Branch and template parameters
    ///
    /// # Returns
    /// The created run
    pub async fn run_pipeline(
        &self,
        project: &str,
        definition_id: &str,
        request: &RunPipelineRequest,
    ) -> Result<PipelineRun> {
        let url = self.project_url(project, &format!("pipelines/{}/runs", definition_id));
        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a run by id
    ///
    /// A run that was deleted on the service side yields a 404 `ApiError`.
    pub async fn get_run(
        &self,
        project: &str,
        definition_id: &str,
        run_id: &str,
    ) -> Result<PipelineRun> {
        let url = self.project_url(
            project,
            &format!("pipelines/{}/runs/{}", definition_id, run_id),
        );
        let response = self.authorize(self.client.get(&url)).send().await?;

        self.handle_response(response).await
    }
}
