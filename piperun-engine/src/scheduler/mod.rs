//! Scheduler layer for the engine
//!
//! This layer coordinates groups of executions: gating them on manual
//! approvals with a bounded worker pool, and polling them until every run
//! reaches a terminal state.

pub mod approvals;
pub mod monitor;

pub use approvals::ApprovalHandler;
pub use monitor::ExecutionMonitor;
