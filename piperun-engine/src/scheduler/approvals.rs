//! Approval handler
//!
//! Probes a set of started executions for pending manual approvals with
//! bounded concurrency, then approves them (or asks for a human).
//! Each probe and approval runs in its own task; a semaphore keeps at most
//! `min(N, max_concurrency)` of them talking to the remote service at once.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::execution::PipelineExecution;
use crate::report::ApprovalSummary;

/// Gates a set of executions on their manual approvals
pub struct ApprovalHandler {
    max_concurrency: usize,
    auto_approve: bool,
}

impl ApprovalHandler {
    /// Creates a new approval handler
    ///
    /// # Arguments
    /// * `max_concurrency` - Upper bound of concurrent calls (at least 1)
    /// * `auto_approve` - Approve pending gates instead of only reporting them
    pub fn new(max_concurrency: usize, auto_approve: bool) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            auto_approve,
        }
    }

    /// Probes every execution, then approves the ones that need it
    ///
    /// A failed probe is logged and the execution is treated as not needing
    /// approval. Approval failures are counted, never raised.
    pub async fn handle(&self, executions: &[Arc<PipelineExecution>]) -> ApprovalSummary {
        let mut summary = ApprovalSummary::default();
        if executions.is_empty() {
            return summary;
        }

        info!("Checking {} run(s) for pending approvals...", executions.len());

        let probes = fan_out(executions, self.max_concurrency, |execution| async move {
            execution.needs_approval().await
        })
        .await;

        let mut needing = Vec::new();
        for (index, probe) in probes {
            summary.probed += 1;
            match probe {
                Ok(true) => needing.push(Arc::clone(&executions[index])),
                Ok(false) => {}
                Err(e) => {
                    summary.probe_errors += 1;
                    warn!(
                        "Failed to check approval for run {} of '{}': {}",
                        executions[index].run_id().unwrap_or("?"),
                        executions[index].definition_name(),
                        e
                    );
                }
            }
        }
        summary.needing_approval = needing.len();

        if needing.is_empty() {
            info!("Waiting {} run(s) to complete", executions.len());
            return summary;
        }

        if !self.auto_approve {
            summary.manual = needing.len();
            warn!(
                "{} run(s) need manual approval. Approve them on the remote service!",
                needing.len()
            );
            info!(
                "Waiting {} run(s) to complete, {} run(s) to be manually approved",
                executions.len(),
                summary.manual
            );
            return summary;
        }

        let approvals = fan_out(&needing, self.max_concurrency, |execution| async move {
            execution.approve().await
        })
        .await;

        for (index, approval) in approvals {
            match approval {
                Ok(true) => summary.approved += 1,
                Ok(false) => summary.approval_failures += 1,
                Err(e) => {
                    summary.approval_failures += 1;
                    error!(
                        "Could not approve run {}: {}",
                        needing[index].run_id().unwrap_or("?"),
                        e
                    );
                }
            }
        }

        if summary.approved > 0 {
            info!("{} run(s) automatically approved", summary.approved);
        }
        if summary.approval_failures > 0 {
            warn!(
                "{} run(s) not approved. Check them manually!",
                summary.approval_failures
            );
        }
        info!(
            "Waiting {} run(s) to complete, {} run(s) to be manually approved",
            executions.len(),
            summary.approval_failures
        );

        summary
    }
}

/// Runs `task` over every execution with at most `limit` in flight
///
/// Results come back in input order, paired with the execution index.
/// A panicked or unscheduled task is reported as missing from the output.
async fn fan_out<T, F, Fut>(
    executions: &[Arc<PipelineExecution>],
    limit: usize,
    task: F,
) -> Vec<(usize, Result<T>)>
where
    T: Send + 'static,
    F: Fn(Arc<PipelineExecution>) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.min(executions.len()).max(1)));
    let mut handles = Vec::with_capacity(executions.len());

    for (index, execution) in executions.iter().enumerate() {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!("Approval worker pool closed: {}", e);
                break;
            }
        };

        let future = task(Arc::clone(execution));
        let handle = tokio::spawn(async move {
            let result = future.await;
            // Permit is released when dropped
            drop(permit);
            result
        });
        handles.push((index, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles {
        match handle.await {
            Ok(result) => results.push((index, result)),
            Err(e) => warn!("Approval task panicked: {}", e),
        }
    }

    results
}
