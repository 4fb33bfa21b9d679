//! Sequential strategy
//!
//! Starts one run, resolves its approval, optionally waits for it, and only
//! then moves to the next parameter set. A failed or abnormal run is logged
//! and the sequence continues. A trigger failure, or losing track of a run
//! while waiting for it, aborts the rest of the definition's sequence so
//! that two runs are never in flight at once.

use async_trait::async_trait;
use piperun_core::domain::options::ExecutionMode;
use tracing::{error, info, warn};

use super::{ExecutionStrategy, StrategyContext};
use crate::error::DefinitionAborted;
use crate::execution::PipelineExecution;
use crate::report::{ApprovalSummary, DefinitionReport};

pub struct SequentialStrategy {
    context: StrategyContext,
}

impl SequentialStrategy {
    pub fn new(context: StrategyContext) -> Self {
        Self { context }
    }

    /// Checks one execution for a pending approval and acts on it
    async fn resolve_approval(&self, execution: &PipelineExecution, summary: &mut ApprovalSummary) {
        let run_id = execution.run_id().unwrap_or("?");
        summary.probed += 1;

        let needs_approval = match execution.needs_approval().await {
            Ok(needs) => needs,
            Err(e) => {
                summary.probe_errors += 1;
                warn!("Failed to check approval for run {}: {}", run_id, e);
                false
            }
        };

        if !needs_approval {
            return;
        }
        summary.needing_approval += 1;

        if !self.context.options.auto_approve {
            summary.manual += 1;
            warn!(
                "Run {} of '{}' needs manual approval. Approve it on the remote service!",
                run_id, self.context.definition.name
            );
            return;
        }

        match execution.approve().await {
            Ok(true) => summary.approved += 1,
            Ok(false) => {
                summary.approval_failures += 1;
                warn!("Run {} was not approved. Check it manually!", run_id);
            }
            Err(e) => {
                summary.approval_failures += 1;
                error!("Could not approve run {}: {}", run_id, e);
            }
        }
    }
}

#[async_trait]
impl ExecutionStrategy for SequentialStrategy {
    async fn run(&self) -> Result<DefinitionReport, DefinitionAborted> {
        let definition = &self.context.definition;
        let total = definition.runs.len();
        let mut report = DefinitionReport::new(&definition.name, ExecutionMode::Sequential, total);

        info!(
            "Starting sequentially {} runs on pipeline \"{}/{}\" using branch \"{}\" (definition_id = {})",
            total,
            definition.project,
            definition.pipeline_name,
            definition.branch,
            definition.definition_id
        );

        for (idx, parameters) in definition.runs.iter().enumerate() {
            info!("Processing run {}/{}", idx + 1, total);

            let mut execution = PipelineExecution::new(
                definition,
                parameters.clone(),
                self.context.gateway.clone(),
                self.context.config,
            );

            if let Err(e) = execution.start().await {
                error!(
                    "Failed to trigger run {}/{} of '{}', skipping the remaining runs: {}",
                    idx + 1,
                    total,
                    definition.name,
                    e
                );
                report.trigger_failures += 1;
                return Err(DefinitionAborted::new(report, e));
            }
            report.triggered += 1;
            report
                .run_ids
                .extend(execution.run_id().map(str::to_string));

            self.resolve_approval(&execution, &mut report.approvals).await;

            if !self.context.options.wait {
                report.not_awaited += 1;
                continue;
            }

            match execution.wait_until_complete().await {
                Ok(outcome) => report.record_outcome(outcome),
                Err(e) => {
                    error!(
                        "Lost track of run {} of '{}', skipping the remaining runs: {}",
                        execution.run_id().unwrap_or("?"),
                        definition.name,
                        e
                    );
                    report.failed += 1;
                    return Err(DefinitionAborted::new(report, e));
                }
            }
        }

        info!(
            "All runs on pipeline \"{}\" (definition_id = {}) completed!",
            definition.pipeline_name, definition.definition_id
        );

        Ok(report)
    }
}
