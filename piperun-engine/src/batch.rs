//! Batch orchestration
//!
//! Runs a list of definitions one after another with the same mode and
//! options. Each definition gets exactly one gateway, shared by all of its
//! executions.

use piperun_core::domain::definition::RunDefinition;
use piperun_core::domain::options::{ExecutionMode, ExecutionOptions};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::error::{BatchAborted, PipelineError};
use crate::gateway::GatewayFactory;
use crate::report::BatchReport;
use crate::strategy::{self, StrategyContext};

/// Drives a batch of run definitions
pub struct BatchOrchestrator {
    mode: ExecutionMode,
    options: ExecutionOptions,
    config: EngineConfig,
    factory: Arc<dyn GatewayFactory>,
}

impl BatchOrchestrator {
    pub fn new(
        mode: ExecutionMode,
        options: ExecutionOptions,
        config: EngineConfig,
        factory: Arc<dyn GatewayFactory>,
    ) -> Self {
        Self {
            mode,
            options,
            config,
            factory,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn options(&self) -> ExecutionOptions {
        self.options
    }

    /// Executes every definition in order
    ///
    /// An error from a definition (gateway creation, or an abort in
    /// sequential mode) stops the remaining definitions. The error carries
    /// the report of everything handled up to that point.
    pub async fn run_all(&self, definitions: &[RunDefinition]) -> Result<BatchReport, BatchAborted> {
        let mut report = BatchReport::new(self.mode, self.options);
        let started = Instant::now();

        if self.options.dry_run {
            info!("[DRY RUN] No pipeline will be started on the remote service");
        }
        info!(
            "Executing {} definition(s) in {} mode",
            definitions.len(),
            self.mode
        );

        for (idx, definition) in definitions.iter().enumerate() {
            info!(
                "Definition {}/{}: '{}' ({} run(s))",
                idx + 1,
                definitions.len(),
                definition.name,
                definition.runs.len()
            );

            let gateway = match self.factory.create(definition, self.options.dry_run) {
                Ok(gateway) => gateway,
                Err(e) => return Err(abort(report, e)),
            };
            let context = StrategyContext {
                definition: definition.clone(),
                gateway,
                options: self.options,
                config: self.config,
            };

            match strategy::for_mode(self.mode, context).run().await {
                Ok(definition_report) => report.definitions.push(definition_report),
                Err(aborted) => {
                    error!("{}", aborted);
                    report.definitions.push(aborted.report);
                    return Err(abort(report, aborted.error));
                }
            }
        }

        report.finished_at = Some(chrono::Utc::now());
        info!(
            "Batch finished in {:.2}s: {} triggered, {} succeeded, {} failed",
            started.elapsed().as_secs_f64(),
            report.triggered(),
            report.succeeded(),
            report.failed()
        );

        Ok(report)
    }
}

fn abort(mut report: BatchReport, error: PipelineError) -> BatchAborted {
    report.finished_at = Some(chrono::Utc::now());
    error!(
        "Batch aborted after {} definition(s): {}",
        report.definitions.len(),
        error
    );
    BatchAborted { report, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::StandardGatewayFactory;
    use piperun_core::domain::definition::ParameterSet;
    use std::time::Duration;

    fn fast_config() -> EngineConfig {
        EngineConfig::new()
            .with_poll_interval(Duration::from_millis(1))
            .with_approval_window(Duration::from_millis(50), Duration::from_millis(20))
    }

    fn definition(name: &str, runs: usize) -> RunDefinition {
        let mut definition = RunDefinition::new(name, "platform", "12", "build");
        for i in 0..runs {
            definition =
                definition.with_run(ParameterSet::from_pairs([("index", serde_json::json!(i))]));
        }
        definition
    }

    #[tokio::test]
    async fn test_runs_every_definition_in_order() {
        let orchestrator = BatchOrchestrator::new(
            ExecutionMode::Parallel,
            ExecutionOptions::default().with_dry_run(true),
            fast_config(),
            Arc::new(StandardGatewayFactory::dry_run_only()),
        );

        let report = orchestrator
            .run_all(&[definition("first", 2), definition("second", 3)])
            .await
            .unwrap();

        let names: Vec<_> = report.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(report.triggered(), 5);
        assert_eq!(report.succeeded(), 5);
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_live_mode_without_credentials_fails() {
        let orchestrator = BatchOrchestrator::new(
            ExecutionMode::Sequential,
            ExecutionOptions::default(),
            fast_config(),
            Arc::new(StandardGatewayFactory::dry_run_only()),
        );

        let err = orchestrator
            .run_all(&[definition("first", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err.error, PipelineError::MissingCredentials(_)));
        assert!(err.report.definitions.is_empty());
        assert!(err.report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let orchestrator = BatchOrchestrator::new(
            ExecutionMode::Sequential,
            ExecutionOptions::default().with_dry_run(true),
            fast_config(),
            Arc::new(StandardGatewayFactory::dry_run_only()),
        );

        let report = orchestrator.run_all(&[]).await.unwrap();
        assert!(report.definitions.is_empty());
        assert_eq!(report.triggered(), 0);
    }
}
