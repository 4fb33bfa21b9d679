//! Gateway layer
//!
//! A gateway is the only channel between an execution and the remote build
//! service. Each gateway is bound to one run definition when it is created,
//! so the operations only take the per-run inputs.
//!
//! Two implementations exist: the live [`DevOpsGateway`] and the local,
//! deterministic [`DryRunGateway`]. Gateways are stateless after construction
//! and safe for concurrent read-only calls.

mod devops;
mod dry_run;

pub use devops::DevOpsGateway;
pub use dry_run::DryRunGateway;

use async_trait::async_trait;
use piperun_client::DevOpsClient;
use piperun_core::domain::definition::{ParameterSet, RunDefinition};
use piperun_core::domain::run::{Approval, RunHandle, RunStatus};
use std::sync::Arc;

use crate::error::{PipelineError, Result};

/// Operations the engine needs from the remote build service
#[async_trait]
pub trait RunGateway: Send + Sync {
    /// Starts one remote run of the bound definition
    ///
    /// Fails with `RemoteApi` on any non-success response.
    async fn trigger_pipeline(&self, parameters: &ParameterSet) -> Result<RunHandle>;

    /// Reads the status of a run
    ///
    /// A deleted or missing run reports `Unknown` rather than an error.
    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus>;

    /// Returns the pending (or most recent) approval gating a run, if any
    async fn get_approval_status(&self, run_id: &str) -> Result<Option<Approval>>;

    /// Approves a gate; an approval the service no longer knows counts as resolved
    async fn approve_run(&self, run_id: &str, approval_id: &str) -> Result<()>;
}

/// Creates the gateway for one run definition
pub trait GatewayFactory: Send + Sync {
    fn create(&self, definition: &RunDefinition, dry_run: bool) -> Result<Arc<dyn RunGateway>>;
}

/// Picks the dry-run gateway or the live one
///
/// Live gateways share the factory's client; without one, only dry runs work.
#[derive(Debug, Clone, Default)]
pub struct StandardGatewayFactory {
    client: Option<DevOpsClient>,
}

impl StandardGatewayFactory {
    pub fn new(client: Option<DevOpsClient>) -> Self {
        Self { client }
    }

    /// A factory that can only build dry-run gateways
    pub fn dry_run_only() -> Self {
        Self { client: None }
    }
}

impl GatewayFactory for StandardGatewayFactory {
    fn create(&self, definition: &RunDefinition, dry_run: bool) -> Result<Arc<dyn RunGateway>> {
        if dry_run {
            return Ok(Arc::new(DryRunGateway::new(definition.clone())));
        }

        let client = self.client.clone().ok_or_else(|| {
            PipelineError::MissingCredentials(format!(
                "an organization and personal access token are required to run '{}'",
                definition.name
            ))
        })?;

        Ok(Arc::new(DevOpsGateway::new(client, definition.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> RunDefinition {
        RunDefinition::new("nightly", "platform", "12", "build")
    }

    #[test]
    fn test_dry_run_needs_no_client() {
        let factory = StandardGatewayFactory::dry_run_only();
        assert!(factory.create(&definition(), true).is_ok());
    }

    #[test]
    fn test_live_without_client_fails() {
        let factory = StandardGatewayFactory::dry_run_only();
        let err = factory.create(&definition(), false).err().unwrap();
        assert!(matches!(err, PipelineError::MissingCredentials(_)));
    }

    #[test]
    fn test_live_with_client() {
        let factory = StandardGatewayFactory::new(Some(DevOpsClient::new("contoso", "token")));
        assert!(factory.create(&definition(), false).is_ok());
    }
}
