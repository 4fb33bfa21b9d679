//! Parallel strategy
//!
//! Triggers every run of the definition first, so that all of them are
//! genuinely concurrent on the remote service, then (when waiting) gates the
//! whole set on approvals once and monitors it once. A trigger failure only
//! excludes that run.

use async_trait::async_trait;
use piperun_core::domain::options::ExecutionMode;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{ExecutionStrategy, StrategyContext};
use crate::error::DefinitionAborted;
use crate::execution::PipelineExecution;
use crate::report::DefinitionReport;
use crate::scheduler::{ApprovalHandler, ExecutionMonitor};

pub struct ParallelStrategy {
    context: StrategyContext,
}

impl ParallelStrategy {
    pub fn new(context: StrategyContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ExecutionStrategy for ParallelStrategy {
    async fn run(&self) -> Result<DefinitionReport, DefinitionAborted> {
        let definition = &self.context.definition;
        let options = self.context.options;
        let config = self.context.config;
        let total = definition.runs.len();
        let mut report = DefinitionReport::new(&definition.name, ExecutionMode::Parallel, total);

        info!(
            "Starting at once {} runs on pipeline \"{}/{}\" using branch \"{}\" (definition_id = {})",
            total,
            definition.project,
            definition.pipeline_name,
            definition.branch,
            definition.definition_id
        );

        let mut executions = Vec::with_capacity(total);
        for (idx, parameters) in definition.runs.iter().enumerate() {
            let mut execution = PipelineExecution::new(
                definition,
                parameters.clone(),
                self.context.gateway.clone(),
                config,
            );

            let started = execution.start().await.map(|handle| handle.id.clone());
            match started {
                Ok(run_id) => {
                    report.run_ids.push(run_id);
                    executions.push(Arc::new(execution));
                }
                Err(e) => {
                    report.trigger_failures += 1;
                    error!(
                        "Failed to trigger run {}/{} of '{}': {}",
                        idx + 1,
                        total,
                        definition.name,
                        e
                    );
                }
            }
        }
        report.triggered = executions.len();

        if !options.wait {
            report.not_awaited = executions.len();
            info!("All pipelines have been started (no waiting)! Check manually their status.");
            return Ok(report);
        }

        if executions.is_empty() {
            warn!("No run of '{}' could be started", definition.name);
            return Ok(report);
        }

        report.approvals = ApprovalHandler::new(config.max_approval_probes, options.auto_approve)
            .handle(&executions)
            .await;

        let monitor = ExecutionMonitor::new(config.monitor_interval, config.max_status_errors)
            .monitor(executions)
            .await;
        report.succeeded = monitor.succeeded;
        report.failed = monitor.failed;
        report.monitor = Some(monitor);

        info!(
            "All runs on pipeline \"{}\" (definition_id = {}) completed!",
            definition.pipeline_name, definition.definition_id
        );

        Ok(report)
    }
}
