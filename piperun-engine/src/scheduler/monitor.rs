//! Execution monitor
//!
//! Level-triggered poll over a set of started executions: every tick, each
//! still-active execution is asked whether it finished, and finished ones
//! leave the active set. The remote service has no push channel, so this
//! loops until the active set is empty.

use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

use crate::execution::PipelineExecution;
use crate::report::MonitorReport;

/// Polls executions until all of them reach a terminal state
pub struct ExecutionMonitor {
    interval: Duration,
    max_errors: u32,
}

impl ExecutionMonitor {
    /// Creates a new monitor polling at `interval`, giving up on a run after
    /// `max_errors` consecutive transient errors
    pub fn new(interval: Duration, max_errors: u32) -> Self {
        Self {
            interval,
            max_errors,
        }
    }

    /// Drains the executions to completion
    ///
    /// A transient status error keeps the execution active for the next
    /// tick. A permanent one, or too many transient ones in a row, drops it
    /// from the set and counts it as failed and lost.
    pub async fn monitor(&self, executions: Vec<Arc<PipelineExecution>>) -> MonitorReport {
        let total = executions.len();
        let mut report = MonitorReport {
            total,
            ..MonitorReport::default()
        };

        info!(
            "Monitoring {} pipeline execution(s) (interval: {:?})",
            total, self.interval
        );

        let mut active: Vec<(Arc<PipelineExecution>, u32)> =
            executions.into_iter().map(|e| (e, 0)).collect();
        while !active.is_empty() {
            time::sleep(self.interval).await;

            let mut still_active = Vec::with_capacity(active.len());
            for (execution, errors) in active {
                let run_id = execution.run_id().unwrap_or("?");
                match execution.is_finished().await {
                    Ok(true) => match execution.outcome() {
                        Some(outcome) if outcome.is_success() => report.succeeded += 1,
                        _ => report.failed += 1,
                    },
                    Ok(false) => still_active.push((execution, 0)),
                    Err(e) if e.is_transient() && errors + 1 < self.max_errors => {
                        warn!(
                            "Failed to poll run {} of '{}' ({}/{}): {}",
                            run_id,
                            execution.definition_name(),
                            errors + 1,
                            self.max_errors,
                            e
                        );
                        still_active.push((execution, errors + 1));
                    }
                    Err(e) => {
                        error!(
                            "Giving up on run {} of '{}', check it manually: {}",
                            run_id,
                            execution.definition_name(),
                            e
                        );
                        report.failed += 1;
                        report.lost += 1;
                    }
                }
            }
            active = still_active;

            report.active_after_tick.push(active.len());
            info!("Active runs: {}/{} completed", total - active.len(), total);
            debug!("{} run(s) still active", active.len());
        }

        report
    }
}
