//! Execution strategies
//!
//! A strategy drives one run definition through its whole lifecycle:
//! trigger, approval, completion. Both strategies share the gateway the
//! orchestrator created for the definition.
//!
//! - Sequential: one run at a time, each resolved before the next starts
//! - Parallel: fire all runs, then gate and monitor them as a set

mod parallel;
mod sequential;

pub use parallel::ParallelStrategy;
pub use sequential::SequentialStrategy;

use async_trait::async_trait;
use piperun_core::domain::definition::RunDefinition;
use piperun_core::domain::options::{ExecutionMode, ExecutionOptions};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::DefinitionAborted;
use crate::gateway::RunGateway;
use crate::report::DefinitionReport;

/// Runs every parameter set of one definition
///
/// An abort carries the report of the runs handled before it.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn run(&self) -> Result<DefinitionReport, DefinitionAborted>;
}

/// Everything a strategy needs for one definition
#[derive(Clone)]
pub struct StrategyContext {
    pub definition: RunDefinition,
    pub gateway: Arc<dyn RunGateway>,
    pub options: ExecutionOptions,
    pub config: EngineConfig,
}

/// Builds the strategy for a mode
pub fn for_mode(mode: ExecutionMode, context: StrategyContext) -> Box<dyn ExecutionStrategy> {
    match mode {
        ExecutionMode::Sequential => Box::new(SequentialStrategy::new(context)),
        ExecutionMode::Parallel => Box::new(ParallelStrategy::new(context)),
    }
}
