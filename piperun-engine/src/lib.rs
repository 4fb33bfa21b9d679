//! Piperun Engine
//!
//! Triggers remote pipeline runs for a set of run definitions, clears their
//! manual approval gates and waits for them to finish.
//!
//! Architecture:
//! - Configuration: Polling intervals and approval window, from environment or defaults
//! - Gateways: The live remote service or a local dry-run simulation
//! - Execution: Lifecycle of one remote run (start, approval, completion)
//! - Scheduler: Bounded-concurrency approval handling and completion monitoring
//! - Strategies: Sequential or parallel scheduling of a definition's runs
//! - Batch: Runs definitions one after another and reports what happened

pub mod batch;
pub mod config;
pub mod error;
pub mod execution;
pub mod gateway;
pub mod report;
pub mod scheduler;
pub mod strategy;

pub use batch::BatchOrchestrator;
pub use config::EngineConfig;
pub use error::{BatchAborted, DefinitionAborted, PipelineError, Result};
pub use execution::{ApprovalProbe, ExecutionState, PipelineExecution, RunOutcome};
pub use gateway::{DevOpsGateway, DryRunGateway, GatewayFactory, RunGateway, StandardGatewayFactory};
pub use report::{ApprovalSummary, BatchReport, DefinitionReport, MonitorReport};
pub use scheduler::{ApprovalHandler, ExecutionMonitor};
pub use strategy::{ExecutionStrategy, ParallelStrategy, SequentialStrategy, StrategyContext};
